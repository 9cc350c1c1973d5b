use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use listen_core::model::{QuestionId, QuestionKind, QuestionRecord, Tier};
use rand::seq::SliceRandom;
use rand::{Rng, rng};

/// Which seen-sets a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    Tier(Tier),
    All,
}

#[derive(Debug, Default)]
struct TierPool {
    items: Vec<QuestionRecord>,
    seen: HashSet<QuestionId>,
}

impl TierPool {
    fn from_items(items: Vec<QuestionRecord>) -> Self {
        let mut keys = HashSet::new();
        let items = items
            .into_iter()
            .filter(|q| keys.insert(q.content_key()))
            .collect();
        Self {
            items,
            seen: HashSet::new(),
        }
    }

    fn select<R: Rng + ?Sized>(
        &mut self,
        tier: Tier,
        kind: Option<QuestionKind>,
        count: usize,
        rng: &mut R,
    ) -> Vec<QuestionRecord> {
        if count == 0 {
            return Vec::new();
        }
        let candidates: Vec<&QuestionRecord> = self
            .items
            .iter()
            .filter(|q| kind.is_none_or(|k| q.kind() == k))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let (mut unseen, mut seen): (Vec<&QuestionRecord>, Vec<&QuestionRecord>) = candidates
            .iter()
            .copied()
            .partition(|q| !self.seen.contains(&q.id()));

        if unseen.is_empty() {
            tracing::debug!(%tier, ?kind, size = candidates.len(), "pool exhausted, resetting seen ids");
            for q in &candidates {
                self.seen.remove(&q.id());
            }
            unseen = candidates;
            seen = Vec::new();
        }

        unseen.shuffle(rng);
        let mut picked: Vec<QuestionRecord> = unseen.into_iter().take(count).cloned().collect();
        if picked.len() < count {
            seen.shuffle(rng);
            let missing = count - picked.len();
            picked.extend(seen.into_iter().take(missing).cloned());
        }

        self.seen.extend(picked.iter().map(QuestionRecord::id));
        picked
    }

    fn select_unseen<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<QuestionRecord> {
        let mut unseen: Vec<&QuestionRecord> = self
            .items
            .iter()
            .filter(|q| !self.seen.contains(&q.id()))
            .collect();
        unseen.shuffle(rng);
        let picked: Vec<QuestionRecord> = unseen.into_iter().take(count).cloned().collect();
        self.seen.extend(picked.iter().map(QuestionRecord::id));
        picked
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-tier candidate sets with anti-repetition bookkeeping.
///
/// Constructed once per process and shared by handle. Each tier has its own
/// lock, held for the whole read-reset-write of a selection.
#[derive(Debug, Default)]
pub struct PoolManager {
    tiers: Mutex<HashMap<Tier, Arc<Mutex<TierPool>>>>,
}

impl PoolManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tier(&self, tier: Tier) -> Option<Arc<Mutex<TierPool>>> {
        lock(&self.tiers).get(&tier).cloned()
    }

    /// Installs the candidate set for a tier unless a non-empty one is
    /// already loaded. Items are de-duplicated by content key. Returns the
    /// pool size.
    pub fn load(&self, tier: Tier, items: Vec<QuestionRecord>) -> usize {
        let mut tiers = lock(&self.tiers);
        let mut pool = lock(tiers.entry(tier).or_default());
        if pool.items.is_empty() {
            *pool = TierPool::from_items(items);
        }
        pool.items.len()
    }

    /// Replaces a tier's candidates, keeping seen ids that still exist.
    pub fn replace(&self, tier: Tier, items: Vec<QuestionRecord>) -> usize {
        let mut fresh = TierPool::from_items(items);
        let mut tiers = lock(&self.tiers);
        if let Some(existing) = tiers.get(&tier) {
            let old = lock(existing);
            let ids: HashSet<QuestionId> = fresh.items.iter().map(QuestionRecord::id).collect();
            fresh.seen = old.seen.intersection(&ids).copied().collect();
        }
        let size = fresh.items.len();
        tiers.insert(tier, Arc::new(Mutex::new(fresh)));
        size
    }

    /// Picks up to `count` questions, preferring ones not served yet.
    #[must_use]
    pub fn select_items(&self, tier: Tier, count: usize) -> Vec<QuestionRecord> {
        self.select_with(tier, None, count, &mut rng())
    }

    /// Picks up to `count` questions of `kind` (any kind when `None`).
    /// Exhausting a kind resets only that kind's seen ids.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        tier: Tier,
        kind: Option<QuestionKind>,
        count: usize,
        rng: &mut R,
    ) -> Vec<QuestionRecord> {
        let Some(pool) = self.tier(tier) else {
            return Vec::new();
        };
        let mut guard = lock(&pool);
        guard.select(tier, kind, count, rng)
    }

    /// Picks up to `count` questions not served yet. Never resets the
    /// seen ids, so an exhausted tier yields nothing.
    pub fn select_unseen<R: Rng + ?Sized>(
        &self,
        tier: Tier,
        count: usize,
        rng: &mut R,
    ) -> Vec<QuestionRecord> {
        let Some(pool) = self.tier(tier) else {
            return Vec::new();
        };
        let mut guard = lock(&pool);
        guard.select_unseen(count, rng)
    }

    /// Every candidate in a tier, optionally of one kind. Does not mark
    /// anything as seen.
    #[must_use]
    pub fn items(&self, tier: Tier, kind: Option<QuestionKind>) -> Vec<QuestionRecord> {
        let Some(pool) = self.tier(tier) else {
            return Vec::new();
        };
        let guard = lock(&pool);
        guard
            .items
            .iter()
            .filter(|q| kind.is_none_or(|k| q.kind() == k))
            .cloned()
            .collect()
    }

    /// Number of distinct candidates loaded for a tier.
    #[must_use]
    pub fn size(&self, tier: Tier) -> usize {
        self.tier(tier).map_or(0, |pool| lock(&pool).items.len())
    }

    #[must_use]
    pub fn seen_count(&self, tier: Tier) -> usize {
        self.tier(tier).map_or(0, |pool| lock(&pool).seen.len())
    }

    /// Clears anti-repetition history, for QA and tests.
    pub fn reset_seen(&self, scope: ResetScope) {
        let tiers = lock(&self.tiers);
        for (tier, pool) in tiers.iter() {
            if scope == ResetScope::All || scope == ResetScope::Tier(*tier) {
                lock(pool).seen.clear();
            }
        }
        tracing::info!(?scope, "seen ids reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listen_core::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Barrier;
    use std::thread;

    fn question(id: u64, text: &str, kind: QuestionKind) -> QuestionRecord {
        QuestionRecord::from_sentence(QuestionId::source(id), text, None, kind, Tier::Beginner)
            .unwrap()
    }

    fn beginner_pool(n: u64) -> PoolManager {
        let pool = PoolManager::new();
        let items = (1..=n)
            .map(|i| question(i, &format!("pangutana {i}"), QuestionKind::Listening))
            .collect();
        pool.load(Tier::Beginner, items);
        pool
    }

    #[test]
    fn single_selections_do_not_repeat_until_exhausted() {
        let pool = beginner_pool(6);
        let mut rng = StdRng::seed_from_u64(7);

        let mut served = HashSet::new();
        for _ in 0..6 {
            let picked = pool.select_with(Tier::Beginner, None, 1, &mut rng);
            assert_eq!(picked.len(), 1);
            assert!(served.insert(picked[0].id()), "repeated before exhaustion");
        }
        assert_eq!(pool.seen_count(Tier::Beginner), 6);

        let again = pool.select_with(Tier::Beginner, None, 1, &mut rng);
        assert_eq!(again.len(), 1);
        assert!(served.contains(&again[0].id()));
        assert_eq!(pool.seen_count(Tier::Beginner), 1);
    }

    #[test]
    fn partial_unseen_is_topped_up_from_seen() {
        let pool = beginner_pool(5);
        let mut rng = StdRng::seed_from_u64(1);

        let first = pool.select_with(Tier::Beginner, None, 3, &mut rng);
        let second = pool.select_with(Tier::Beginner, None, 3, &mut rng);

        let first_ids: HashSet<_> = first.iter().map(QuestionRecord::id).collect();
        let fresh = second.iter().filter(|q| !first_ids.contains(&q.id())).count();
        assert_eq!(second.len(), 3);
        assert_eq!(fresh, 2);
        assert_eq!(pool.seen_count(Tier::Beginner), 5);
    }

    #[test]
    fn small_pool_returns_everything_it_has() {
        let pool = beginner_pool(2);
        assert_eq!(pool.select_items(Tier::Beginner, 5).len(), 2);
    }

    #[test]
    fn unloaded_or_empty_tier_yields_nothing() {
        let pool = PoolManager::new();
        assert!(pool.select_items(Tier::Advanced, 3).is_empty());
        pool.load(Tier::Advanced, Vec::new());
        assert!(pool.select_items(Tier::Advanced, 3).is_empty());
    }

    #[test]
    fn load_drops_duplicate_content() {
        let pool = PoolManager::new();
        let size = pool.load(
            Tier::Beginner,
            vec![
                question(1, "Maayong buntag", QuestionKind::Listening),
                question(2, "maayong BUNTAG", QuestionKind::Ordering),
                question(3, "Salamat", QuestionKind::Listening),
            ],
        );
        assert_eq!(size, 2);
    }

    #[test]
    fn second_load_keeps_existing_pool() {
        let pool = beginner_pool(3);
        let _ = pool.select_items(Tier::Beginner, 2);
        assert_eq!(pool.load(Tier::Beginner, Vec::new()), 3);
        assert_eq!(pool.seen_count(Tier::Beginner), 2);
    }

    #[test]
    fn load_fills_a_tier_that_was_loaded_empty() {
        let pool = PoolManager::new();
        assert_eq!(pool.load(Tier::Beginner, Vec::new()), 0);
        let size = pool.load(
            Tier::Beginner,
            vec![question(1, "Salamat", QuestionKind::Listening)],
        );
        assert_eq!(size, 1);
        assert_eq!(pool.select_items(Tier::Beginner, 1).len(), 1);
    }

    #[test]
    fn concurrent_selections_never_share_an_item() {
        const THREADS: u64 = 8;
        let pool = Arc::new(beginner_pool(THREADS));
        let barrier = Arc::new(Barrier::new(THREADS as usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pool.select_items(Tier::Beginner, 1)
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let picked = handle.join().unwrap();
            assert_eq!(picked.len(), 1);
            assert!(ids.insert(picked[0].id()), "item served twice");
        }
        assert_eq!(ids.len(), THREADS as usize);
        assert_eq!(pool.seen_count(Tier::Beginner), THREADS as usize);
    }

    #[test]
    fn concurrent_first_loads_install_one_pool() {
        const THREADS: u64 = 6;
        let pool = Arc::new(PoolManager::new());
        let barrier = Arc::new(Barrier::new(THREADS as usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let items = (1..=THREADS)
                        .map(|i| question(i, &format!("pangutana {i}"), QuestionKind::Listening))
                        .collect();
                    barrier.wait();
                    pool.load(Tier::Beginner, items);
                    pool.select_items(Tier::Beginner, 1)
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let picked = handle.join().unwrap();
            assert!(ids.insert(picked[0].id()), "item served twice");
        }
        assert_eq!(pool.seen_count(Tier::Beginner), THREADS as usize);
    }

    #[test]
    fn unseen_selection_never_resets() {
        let pool = beginner_pool(3);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(pool.select_unseen(Tier::Beginner, 2, &mut rng).len(), 2);
        assert_eq!(pool.select_unseen(Tier::Beginner, 2, &mut rng).len(), 1);
        assert!(pool.select_unseen(Tier::Beginner, 2, &mut rng).is_empty());
        assert_eq!(pool.seen_count(Tier::Beginner), 3);
    }

    #[test]
    fn kind_exhaustion_resets_only_that_kind() {
        let pool = PoolManager::new();
        pool.load(
            Tier::Beginner,
            vec![
                question(1, "usa", QuestionKind::Listening),
                question(2, "duha", QuestionKind::Ordering),
                question(3, "tulo", QuestionKind::Ordering),
            ],
        );
        let mut rng = StdRng::seed_from_u64(3);

        let _ = pool.select_with(Tier::Beginner, Some(QuestionKind::Ordering), 2, &mut rng);
        let _ = pool.select_with(Tier::Beginner, Some(QuestionKind::Listening), 1, &mut rng);
        assert_eq!(pool.seen_count(Tier::Beginner), 3);

        let again = pool.select_with(Tier::Beginner, Some(QuestionKind::Listening), 1, &mut rng);
        assert_eq!(again[0].id(), QuestionId::source(1));
        assert_eq!(pool.seen_count(Tier::Beginner), 3);

        let listening = pool.items(Tier::Beginner, Some(QuestionKind::Listening));
        assert_eq!(listening.len(), 1);
    }

    #[test]
    fn reset_scope_targets_one_tier_or_all() {
        let pool = beginner_pool(3);
        pool.load(
            Tier::Advanced,
            vec![question(9, "bisan unsa", QuestionKind::Listening)],
        );
        let _ = pool.select_items(Tier::Beginner, 2);
        let _ = pool.select_items(Tier::Advanced, 1);

        pool.reset_seen(ResetScope::Tier(Tier::Beginner));
        assert_eq!(pool.seen_count(Tier::Beginner), 0);
        assert_eq!(pool.seen_count(Tier::Advanced), 1);

        pool.reset_seen(ResetScope::All);
        assert_eq!(pool.seen_count(Tier::Advanced), 0);
    }

    #[test]
    fn replace_keeps_seen_ids_that_survive() {
        let pool = beginner_pool(3);
        let mut rng = StdRng::seed_from_u64(11);
        let picked = pool.select_with(Tier::Beginner, None, 3, &mut rng);
        assert_eq!(picked.len(), 3);

        let size = pool.replace(
            Tier::Beginner,
            vec![
                question(1, "pangutana 1", QuestionKind::Listening),
                question(4, "pangutana 4", QuestionKind::Listening),
            ],
        );
        assert_eq!(size, 2);
        assert_eq!(pool.seen_count(Tier::Beginner), 1);
    }
}
