use serde::{Deserialize, Serialize};

use crate::model::scoring::StarRating;
use crate::model::tier::Tier;

/// Unlock state and best result for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub tier: Tier,
    pub unlocked: bool,
    pub best_stars: StarRating,
}

impl TierProgress {
    /// Fresh progress: only the first tier starts unlocked.
    #[must_use]
    pub fn initial(tier: Tier) -> Self {
        Self {
            tier,
            unlocked: tier == Tier::Beginner,
            best_stars: StarRating::default(),
        }
    }

    /// Whether `stars` would replace the recorded best.
    #[must_use]
    pub fn improves_on(&self, stars: StarRating) -> bool {
        stars > self.best_stars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_beginner_starts_unlocked() {
        assert!(TierProgress::initial(Tier::Beginner).unlocked);
        assert!(!TierProgress::initial(Tier::Intermediate).unlocked);
        assert!(!TierProgress::initial(Tier::Advanced).unlocked);
    }

    #[test]
    fn equal_stars_do_not_improve() {
        let mut p = TierProgress::initial(Tier::Beginner);
        p.best_stars = StarRating::new(2);
        assert!(!p.improves_on(StarRating::new(2)));
        assert!(p.improves_on(StarRating::new(3)));
    }
}
