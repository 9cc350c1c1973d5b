use std::collections::{HashMap, HashSet};

use listen_core::model::{Tier, text::fold_token};
use rand::rng;
use rand::seq::SliceRandom;

/// Supplies plausible wrong tokens for the answer board.
pub trait DistractorSource: Send + Sync {
    /// Up to `limit` tokens for `tier`, none of which fold to a token in
    /// `avoid`.
    fn distractors(&self, tier: Tier, avoid: &[String], limit: usize) -> Vec<String>;
}

const BEGINNER_WORDS: &[&str] = &[
    "ako", "ikaw", "siya", "kita", "kami", "kamo", "sila", "oo", "dili", "ayaw", "palihug", "pila",
    "asa", "kanus-a",
];

const INTERMEDIATE_WORDS: &[&str] = &[
    "kini", "kana", "kadto", "nganong", "ngano", "kinsa", "unsaon", "mahimo", "gusto",
    "kinahanglan", "pwede",
];

const ADVANCED_WORDS: &[&str] = &[
    "tungod", "apan", "bisan", "kung", "kay", "aron", "samtang", "hangtud", "sukad", "human",
    "usa",
];

/// Fixed per-tier word lists.
#[derive(Debug, Clone)]
pub struct VocabularyDistractors {
    words: HashMap<Tier, Vec<String>>,
}

impl VocabularyDistractors {
    #[must_use]
    pub fn new(words: HashMap<Tier, Vec<String>>) -> Self {
        Self { words }
    }

    /// Built-in Cebuano vocabulary: pronouns and particles for beginners,
    /// demonstratives and modals for intermediate, conjunctions for advanced.
    #[must_use]
    pub fn builtin() -> Self {
        let to_vec = |words: &[&str]| -> Vec<String> {
            words.iter().map(|w| (*w).to_string()).collect()
        };
        Self::new(HashMap::from([
            (Tier::Beginner, to_vec(BEGINNER_WORDS)),
            (Tier::Intermediate, to_vec(INTERMEDIATE_WORDS)),
            (Tier::Advanced, to_vec(ADVANCED_WORDS)),
        ]))
    }
}

impl Default for VocabularyDistractors {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DistractorSource for VocabularyDistractors {
    fn distractors(&self, tier: Tier, avoid: &[String], limit: usize) -> Vec<String> {
        let Some(words) = self.words.get(&tier) else {
            return Vec::new();
        };
        let avoid: HashSet<String> = avoid.iter().map(|t| fold_token(t)).collect();
        let mut seen = HashSet::new();
        let mut candidates: Vec<String> = words
            .iter()
            .map(|w| fold_token(w))
            .filter(|w| !w.is_empty() && !avoid.contains(w) && seen.insert(w.clone()))
            .collect();
        candidates.shuffle(&mut rng());
        candidates.truncate(limit);
        candidates
    }
}
