/// XP needed for ranks 2..=30, in order.
const RANK_THRESHOLDS: [u64; 29] = [
    20, 30, 40, 50, 60, 70, 80, 90, // 2..=9
    100, 120, 140, 160, 180, 200, 220, 240, 260, 280, // 10..=19
    300, 350, 400, 450, 500, 550, 600, 700, 800, 900, 1000, // 20..=30
];

/// Learner rank derived from total experience, 1 through 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LearnerRank(u8);

impl LearnerRank {
    pub const MAX: LearnerRank = LearnerRank(30);

    #[must_use]
    pub fn from_experience(total_xp: u64) -> Self {
        let passed = RANK_THRESHOLDS
            .iter()
            .take_while(|threshold| total_xp >= **threshold)
            .count();
        // At most 29 thresholds, so this always fits.
        Self(u8::try_from(passed).unwrap_or(29) + 1)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.0 {
            0..=9 => "Beginner",
            10..=19 => "Intermediate",
            _ => "Advanced",
        }
    }

    /// Starting playback rate for this rank, in hundredths.
    #[must_use]
    pub fn base_rate_pct(&self) -> u32 {
        match self.0 {
            0..=9 => 90,
            10..=19 => 100,
            _ => 110,
        }
    }
}
