use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TierError {
    #[error("unknown tier: {0}")]
    Unknown(String),

    #[error("tier index out of range: {0}")]
    OutOfRange(i64),
}

/// Ordered difficulty class grouping content and distractor vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Beginner, Tier::Intermediate, Tier::Advanced];

    /// The tier unlocked by passing this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Beginner => Some(Tier::Intermediate),
            Tier::Intermediate => Some(Tier::Advanced),
            Tier::Advanced => None,
        }
    }

    /// Maps a 1-based content level onto a tier.
    ///
    /// Levels up to 10 are beginner material, up to 20 intermediate.
    #[must_use]
    pub fn from_level(level: u32) -> Tier {
        match level {
            0..=10 => Tier::Beginner,
            11..=20 => Tier::Intermediate,
            _ => Tier::Advanced,
        }
    }

    /// Stable numeric index used by persistence.
    #[must_use]
    pub fn index(self) -> i64 {
        match self {
            Tier::Beginner => 1,
            Tier::Intermediate => 2,
            Tier::Advanced => 3,
        }
    }

    /// # Errors
    ///
    /// Returns `TierError::OutOfRange` for indices other than 1, 2 or 3.
    pub fn from_index(index: i64) -> Result<Tier, TierError> {
        match index {
            1 => Ok(Tier::Beginner),
            2 => Ok(Tier::Intermediate),
            3 => Ok(Tier::Advanced),
            other => Err(TierError::OutOfRange(other)),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Beginner => "beginner",
            Tier::Intermediate => "intermediate",
            Tier::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" | "1" => Ok(Tier::Beginner),
            "intermediate" | "2" => Ok(Tier::Intermediate),
            "advanced" | "3" => Ok(Tier::Advanced),
            _ => Err(TierError::Unknown(s.to_string())),
        }
    }
}

/// Exercise modality of a question. Affects presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Listening,
    Translation,
    Ordering,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [
        QuestionKind::Listening,
        QuestionKind::Translation,
        QuestionKind::Ordering,
    ];

    /// Lenient parse used by content import: anything unrecognised is a
    /// listening question.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> QuestionKind {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TRANSLATION" => QuestionKind::Translation,
            "ORDERING" => QuestionKind::Ordering,
            _ => QuestionKind::Listening,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Listening => "LISTENING",
            QuestionKind::Translation => "TRANSLATION",
            QuestionKind::Ordering => "ORDERING",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_and_chain() {
        assert!(Tier::Beginner < Tier::Intermediate);
        assert_eq!(Tier::Beginner.next(), Some(Tier::Intermediate));
        assert_eq!(Tier::Advanced.next(), None);
    }

    #[test]
    fn level_maps_to_tier_bands() {
        assert_eq!(Tier::from_level(1), Tier::Beginner);
        assert_eq!(Tier::from_level(10), Tier::Beginner);
        assert_eq!(Tier::from_level(11), Tier::Intermediate);
        assert_eq!(Tier::from_level(20), Tier::Intermediate);
        assert_eq!(Tier::from_level(21), Tier::Advanced);
    }

    #[test]
    fn index_round_trips_and_rejects_unknown() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_index(tier.index()).unwrap(), tier);
        }
        assert_eq!(Tier::from_index(9), Err(TierError::OutOfRange(9)));
    }

    #[test]
    fn kind_parse_is_lenient() {
        assert_eq!(QuestionKind::parse_lenient("translation"), QuestionKind::Translation);
        assert_eq!(QuestionKind::parse_lenient(" ORDERING "), QuestionKind::Ordering);
        assert_eq!(QuestionKind::parse_lenient("quiz"), QuestionKind::Listening);
        assert_eq!(QuestionKind::parse_lenient(""), QuestionKind::Listening);
    }

    #[test]
    fn tier_from_str_accepts_names() {
        assert_eq!("Advanced".parse::<Tier>().unwrap(), Tier::Advanced);
        assert!("expert".parse::<Tier>().is_err());
    }
}
