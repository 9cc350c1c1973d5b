use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("percentages must be between 0 and 100")]
    InvalidPercent,

    #[error("two-star threshold must not be below one-star threshold")]
    InvalidStarThresholds,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountOverflow { correct: u32, total: u32 },
}

/// Star rating for a finished session, 0 to 3.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct StarRating(u8);

impl StarRating {
    pub const MAX: StarRating = StarRating(3);

    /// Clamps to the 0..=3 range.
    #[must_use]
    pub fn new(stars: u8) -> Self {
        Self(stars.min(3))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Pass and reward rules applied when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pass_pct: u32,
    two_star_pct: u32,
    one_star_pct: u32,
    xp_per_correct: u32,
    perfect_bonus: u32,
    standard_session_length: u32,
}

impl ScoringRules {
    /// # Errors
    ///
    /// Returns `ScoringError::InvalidPercent` for percentages above 100 and
    /// `ScoringError::InvalidStarThresholds` when the star bands are inverted.
    pub fn new(
        pass_pct: u32,
        two_star_pct: u32,
        one_star_pct: u32,
        xp_per_correct: u32,
        perfect_bonus: u32,
        standard_session_length: u32,
    ) -> Result<Self, ScoringError> {
        if pass_pct > 100 || two_star_pct > 100 || one_star_pct > 100 {
            return Err(ScoringError::InvalidPercent);
        }
        if two_star_pct < one_star_pct {
            return Err(ScoringError::InvalidStarThresholds);
        }
        Ok(Self {
            pass_pct,
            two_star_pct,
            one_star_pct,
            xp_per_correct,
            perfect_bonus,
            standard_session_length,
        })
    }

    #[must_use]
    pub fn standard_session_length(&self) -> u32 {
        self.standard_session_length
    }

    /// `ceil(total * pass ratio)`, never above `total`.
    #[must_use]
    pub fn pass_threshold(&self, total: u32) -> u32 {
        let scaled = u64::from(total) * u64::from(self.pass_pct);
        let ceil = scaled.div_ceil(100);
        u32::try_from(ceil).unwrap_or(u32::MAX).min(total)
    }

    /// Computes the result for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::CountOverflow` if `correct > total`.
    pub fn score(&self, correct: u32, total: u32) -> Result<SessionResult, ScoringError> {
        if correct > total {
            return Err(ScoringError::CountOverflow { correct, total });
        }
        if total == 0 {
            return Ok(SessionResult {
                correct_count: 0,
                total_questions: 0,
                passed: false,
                stars: StarRating::default(),
                xp_earned: 0,
            });
        }

        let perfect = correct == total;
        let stars = if perfect {
            StarRating::MAX
        } else if correct >= round_pct(total, self.two_star_pct) {
            StarRating::new(2)
        } else if correct >= round_pct(total, self.one_star_pct) {
            StarRating::new(1)
        } else {
            StarRating::default()
        };

        let bonus = if perfect && total == self.standard_session_length {
            self.perfect_bonus
        } else {
            0
        };

        Ok(SessionResult {
            correct_count: correct,
            total_questions: total,
            passed: correct >= self.pass_threshold(total),
            stars,
            xp_earned: correct.saturating_mul(self.xp_per_correct).saturating_add(bonus),
        })
    }
}

impl Default for ScoringRules {
    /// 80% to pass, stars at 70% and 40%, 10 XP per correct answer and a
    /// 50 XP bonus for a perfect ten-question session.
    fn default() -> Self {
        Self {
            pass_pct: 80,
            two_star_pct: 70,
            one_star_pct: 40,
            xp_per_correct: 10,
            perfect_bonus: 50,
            standard_session_length: 10,
        }
    }
}

/// `round(total * pct / 100)` with halves rounded up.
fn round_pct(total: u32, pct: u32) -> u32 {
    let scaled = u64::from(total) * u64::from(pct);
    u32::try_from((scaled + 50) / 100).unwrap_or(u32::MAX)
}

/// Outcome of one finished session. Computed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub correct_count: u32,
    pub total_questions: u32,
    pub passed: bool,
    pub stars: StarRating,
    pub xp_earned: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    #[test]
    fn eight_of_ten_passes_with_two_stars() {
        let r = rules().score(8, 10).unwrap();
        assert!(r.passed);
        assert_eq!(r.stars, StarRating::new(2));
        assert_eq!(r.xp_earned, 80);
    }

    #[test]
    fn perfect_standard_session_earns_bonus() {
        let r = rules().score(10, 10).unwrap();
        assert_eq!(r.stars, StarRating::MAX);
        assert_eq!(r.xp_earned, 150);
    }

    #[test]
    fn perfect_short_session_has_no_bonus() {
        let r = rules().score(4, 4).unwrap();
        assert!(r.passed);
        assert_eq!(r.stars, StarRating::MAX);
        assert_eq!(r.xp_earned, 40);
    }

    #[test]
    fn star_bands_follow_rounded_thresholds() {
        assert_eq!(rules().score(7, 10).unwrap().stars, StarRating::new(2));
        assert_eq!(rules().score(6, 10).unwrap().stars, StarRating::new(1));
        assert_eq!(rules().score(4, 10).unwrap().stars, StarRating::new(1));
        assert_eq!(rules().score(3, 10).unwrap().stars, StarRating::new(0));
        assert!(!rules().score(7, 10).unwrap().passed);
    }

    #[test]
    fn pass_threshold_rounds_up_and_clamps() {
        assert_eq!(rules().pass_threshold(10), 8);
        assert_eq!(rules().pass_threshold(3), 3);
        assert_eq!(rules().pass_threshold(1), 1);
        assert_eq!(rules().pass_threshold(0), 0);
    }

    #[test]
    fn empty_session_never_passes() {
        let r = rules().score(0, 0).unwrap();
        assert!(!r.passed);
        assert_eq!(r.xp_earned, 0);
        assert_eq!(r.stars, StarRating::default());
    }

    #[test]
    fn correct_above_total_is_rejected() {
        assert_eq!(
            rules().score(11, 10),
            Err(ScoringError::CountOverflow {
                correct: 11,
                total: 10
            })
        );
    }

    #[test]
    fn rules_reject_bad_percentages() {
        assert_eq!(
            ScoringRules::new(120, 70, 40, 10, 50, 10),
            Err(ScoringError::InvalidPercent)
        );
        assert_eq!(
            ScoringRules::new(80, 30, 40, 10, 50, 10),
            Err(ScoringError::InvalidStarThresholds)
        );
    }
}
