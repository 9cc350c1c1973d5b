use std::collections::HashSet;

use listen_core::model::{QuestionKind, QuestionRecord, Tier, TypeMix};
use rand::seq::SliceRandom;
use rand::{Rng, rng};

use crate::pool::PoolManager;

/// Ordered questions for one session plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub tier: Tier,
    pub items: Vec<QuestionRecord>,
    pub target: usize,
    pub replicated: usize,
    pub borrowed: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the tier could not fill the requested mix.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.items.len() < self.target
    }
}

/// Clones from `source`, cycling, until `count` replicas exist.
fn replicate_cycling(source: &[QuestionRecord], count: usize) -> Vec<QuestionRecord> {
    if source.is_empty() {
        return Vec::new();
    }
    source
        .iter()
        .cycle()
        .take(count)
        .map(QuestionRecord::replicate)
        .collect()
}

/// Composes a session from the shared pool according to a type mix.
///
/// Each kind is filled from its own questions first, replicating them when
/// there are too few. Only a kind with no questions at all borrows from the
/// rest of the tier.
pub struct SessionBuilder<'a> {
    pool: &'a PoolManager,
    mix: &'a TypeMix,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(pool: &'a PoolManager, mix: &'a TypeMix) -> Self {
        Self { pool, mix }
    }

    /// Builds a shuffled plan for `tier`. An empty tier yields an empty plan.
    #[must_use]
    pub fn build(&self, tier: Tier) -> SessionPlan {
        self.build_with(tier, &mut rng())
    }

    pub fn build_with<R: Rng + ?Sized>(&self, tier: Tier, rng: &mut R) -> SessionPlan {
        let target = self.mix.total();
        let mut plan = SessionPlan {
            tier,
            items: Vec::with_capacity(target),
            target,
            replicated: 0,
            borrowed: 0,
        };

        let mut tier_items = self.pool.items(tier, None);
        if tier_items.is_empty() {
            tracing::warn!(%tier, "no content for tier");
            return plan;
        }

        let mut unfilled = 0;
        for (kind, wanted) in self.mix.entries() {
            let wanted = *wanted as usize;
            if wanted > 0 {
                unfilled += self.fill_kind(&mut plan, *kind, wanted, rng);
            }
        }
        if unfilled > 0 {
            self.borrow_across_kinds(&mut plan, &tier_items, unfilled, rng);
        }

        dedupe_by_content(&mut plan.items);

        if plan.items.len() < target {
            tier_items.shuffle(rng);
            let topped = replicate_cycling(&tier_items, target - plan.items.len());
            tracing::debug!(%tier, count = topped.len(), "topping up session by replication");
            plan.replicated += topped.len();
            plan.items.extend(topped);
        }

        plan.items.shuffle(rng);
        plan
    }

    /// Fills one kind from its own questions, replicating when short.
    /// Returns how many slots stay open because the kind has no questions.
    fn fill_kind<R: Rng + ?Sized>(
        &self,
        plan: &mut SessionPlan,
        kind: QuestionKind,
        wanted: usize,
        rng: &mut R,
    ) -> usize {
        let tier = plan.tier;
        let mut picked = self.pool.select_with(tier, Some(kind), wanted, rng);
        if picked.is_empty() {
            return wanted;
        }

        let shortfall = wanted - picked.len();
        if shortfall > 0 {
            let mut kind_items = self.pool.items(tier, Some(kind));
            kind_items.shuffle(rng);
            let copies = replicate_cycling(&kind_items, shortfall);
            tracing::debug!(%tier, %kind, count = copies.len(), "replicating within kind");
            plan.replicated += copies.len();
            picked.extend(copies);
        }

        plan.items.extend(picked);
        0
    }

    /// Last resort for kinds with no questions: real questions of other
    /// kinds, unseen ones first, then any not already in the plan. Seen ids
    /// are never reset here.
    fn borrow_across_kinds<R: Rng + ?Sized>(
        &self,
        plan: &mut SessionPlan,
        tier_items: &[QuestionRecord],
        count: usize,
        rng: &mut R,
    ) {
        let tier = plan.tier;
        let mut borrowed = self.pool.select_unseen(tier, count, rng);
        if borrowed.len() < count {
            let mut taken: HashSet<String> = plan
                .items
                .iter()
                .chain(&borrowed)
                .map(QuestionRecord::content_key)
                .collect();
            let mut rest: Vec<&QuestionRecord> = tier_items
                .iter()
                .filter(|q| taken.insert(q.content_key()))
                .collect();
            rest.shuffle(rng);
            let missing = count - borrowed.len();
            borrowed.extend(rest.into_iter().take(missing).cloned());
        }
        tracing::debug!(%tier, count = borrowed.len(), "borrowing across kinds");
        plan.borrowed += borrowed.len();
        plan.items.extend(borrowed);
    }
}

/// Drops later questions whose content key was already taken by an original.
/// Replicas are kept: they exist to repeat content.
fn dedupe_by_content(items: &mut Vec<QuestionRecord>) {
    let mut keys = HashSet::new();
    items.retain(|q| q.is_replica() || keys.insert(q.content_key()));
}
