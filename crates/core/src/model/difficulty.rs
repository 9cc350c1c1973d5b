use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DifficultyError {
    #[error("playback rate bounds must satisfy 0 < min <= max")]
    InvalidRateBounds,

    #[error("playback rate step must be > 0")]
    InvalidRateStep,

    #[error("streak step must be > 0")]
    InvalidStreakStep,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Bounds and step sizes for adaptive playback.
///
/// Rates are kept in hundredths (`100` is normal speed) so repeated steps
/// never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultySettings {
    min_rate_pct: u32,
    max_rate_pct: u32,
    rate_step_pct: u32,
    streak_step: u32,
    max_hints: u32,
}

impl DifficultySettings {
    /// # Errors
    ///
    /// Returns `DifficultyError` when the bounds are empty or inverted, or a
    /// step is zero.
    pub fn new(
        min_rate_pct: u32,
        max_rate_pct: u32,
        rate_step_pct: u32,
        streak_step: u32,
        max_hints: u32,
    ) -> Result<Self, DifficultyError> {
        if min_rate_pct == 0 || min_rate_pct > max_rate_pct {
            return Err(DifficultyError::InvalidRateBounds);
        }
        if rate_step_pct == 0 {
            return Err(DifficultyError::InvalidRateStep);
        }
        if streak_step == 0 {
            return Err(DifficultyError::InvalidStreakStep);
        }
        Ok(Self {
            min_rate_pct,
            max_rate_pct,
            rate_step_pct,
            streak_step,
            max_hints,
        })
    }

    #[must_use]
    pub fn min_rate_pct(&self) -> u32 {
        self.min_rate_pct
    }

    #[must_use]
    pub fn max_rate_pct(&self) -> u32 {
        self.max_rate_pct
    }

    #[must_use]
    pub fn rate_step_pct(&self) -> u32 {
        self.rate_step_pct
    }

    #[must_use]
    pub fn streak_step(&self) -> u32 {
        self.streak_step
    }

    #[must_use]
    pub fn max_hints(&self) -> u32 {
        self.max_hints
    }

    fn clamp(&self, rate_pct: u32) -> u32 {
        rate_pct.clamp(self.min_rate_pct, self.max_rate_pct)
    }
}

impl Default for DifficultySettings {
    /// 0.7x to 1.3x in 0.1 steps, speed up every 3 correct, 3 hints.
    fn default() -> Self {
        Self {
            min_rate_pct: 70,
            max_rate_pct: 130,
            rate_step_pct: 10,
            streak_step: 3,
            max_hints: 3,
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyState {
    pub rate_pct: u32,
    pub streak: u32,
    pub hints_remaining: u32,
}

impl DifficultyState {
    #[must_use]
    pub fn playback_rate(&self) -> f32 {
        // Rates stay well inside f32's exact integer range.
        #[allow(clippy::cast_precision_loss)]
        let pct = self.rate_pct as f32;
        pct / 100.0
    }
}

/// What a hint request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOutcome {
    /// Play the audio hint; `remaining` hints are left afterwards.
    Play { remaining: u32 },
    /// No hints left; offering recovery is up to the caller.
    Exhausted,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owns the playback rate, the correct-answer streak and the hint budget.
#[derive(Debug, Clone)]
pub struct DifficultyController {
    settings: DifficultySettings,
    initial_rate_pct: u32,
    state: DifficultyState,
}

impl DifficultyController {
    /// Starts at normal speed with a full hint budget.
    #[must_use]
    pub fn new(settings: DifficultySettings) -> Self {
        let initial_rate_pct = settings.clamp(100);
        Self {
            settings,
            initial_rate_pct,
            state: DifficultyState {
                rate_pct: initial_rate_pct,
                streak: 0,
                hints_remaining: settings.max_hints,
            },
        }
    }

    /// Resets rate, streak and hints for a new session starting at
    /// `base_rate_pct` (clamped into bounds).
    pub fn reset_for_session(&mut self, base_rate_pct: u32) {
        self.initial_rate_pct = self.settings.clamp(base_rate_pct);
        self.state = DifficultyState {
            rate_pct: self.initial_rate_pct,
            streak: 0,
            hints_remaining: self.settings.max_hints,
        };
    }

    pub fn record_correct(&mut self) {
        self.state.streak = self.state.streak.saturating_add(1);
        if self.state.streak % self.settings.streak_step == 0 {
            let raised = self.state.rate_pct.saturating_add(self.settings.rate_step_pct);
            self.state.rate_pct = self.settings.clamp(raised);
        }
    }

    pub fn record_incorrect(&mut self) {
        self.state.streak = 0;
        let lowered = self.state.rate_pct.saturating_sub(self.settings.rate_step_pct);
        self.state.rate_pct = self.settings.clamp(lowered);
    }

    pub fn request_hint(&mut self) -> HintOutcome {
        if self.state.hints_remaining == 0 {
            return HintOutcome::Exhausted;
        }
        self.state.hints_remaining -= 1;
        HintOutcome::Play {
            remaining: self.state.hints_remaining,
        }
    }

    /// Refills the hint budget after an external reward event.
    pub fn grant_hint_recovery(&mut self) {
        self.state.hints_remaining = self.settings.max_hints;
    }

    #[must_use]
    pub fn state(&self) -> DifficultyState {
        self.state
    }

    #[must_use]
    pub fn playback_rate(&self) -> f32 {
        self.state.playback_rate()
    }

    #[must_use]
    pub fn initial_rate_pct(&self) -> u32 {
        self.initial_rate_pct
    }

    #[must_use]
    pub fn settings(&self) -> &DifficultySettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DifficultyController {
        DifficultyController::new(DifficultySettings::default())
    }

    #[test]
    fn three_correct_in_a_row_speed_up_once() {
        let mut c = controller();
        c.record_correct();
        c.record_correct();
        assert_eq!(c.state().rate_pct, 100);
        c.record_correct();
        assert_eq!(c.state().rate_pct, 110);
        assert_eq!(c.state().streak, 3);
    }

    #[test]
    fn incorrect_slows_down_and_clears_streak() {
        let mut c = controller();
        c.record_correct();
        c.record_correct();
        c.record_incorrect();
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.state().rate_pct, 90);
        assert!((c.playback_rate() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn rate_stays_within_bounds_for_long_runs() {
        let mut c = controller();
        for _ in 0..60 {
            c.record_correct();
        }
        assert_eq!(c.state().rate_pct, 130);
        for _ in 0..60 {
            c.record_incorrect();
        }
        assert_eq!(c.state().rate_pct, 70);

        for i in 0..200_u32 {
            if i % 7 == 0 {
                c.record_incorrect();
            } else {
                c.record_correct();
            }
            let rate = c.state().rate_pct;
            assert!((70..=130).contains(&rate));
        }
    }

    #[test]
    fn hints_run_out_and_recover() {
        let mut c = controller();
        assert_eq!(c.request_hint(), HintOutcome::Play { remaining: 2 });
        assert_eq!(c.request_hint(), HintOutcome::Play { remaining: 1 });
        assert_eq!(c.request_hint(), HintOutcome::Play { remaining: 0 });
        assert_eq!(c.request_hint(), HintOutcome::Exhausted);
        assert_eq!(c.state().hints_remaining, 0);

        c.grant_hint_recovery();
        assert_eq!(c.state().hints_remaining, 3);
    }

    #[test]
    fn session_reset_restores_everything_and_clamps_base_rate() {
        let mut c = controller();
        c.record_incorrect();
        c.request_hint();

        c.reset_for_session(200);
        assert_eq!(c.state().rate_pct, 130);
        assert_eq!(c.state().streak, 0);
        assert_eq!(c.state().hints_remaining, 3);

        c.reset_for_session(90);
        assert_eq!(c.initial_rate_pct(), 90);
    }

    #[test]
    fn settings_reject_inverted_bounds_and_zero_steps() {
        assert_eq!(
            DifficultySettings::new(130, 70, 10, 3, 3),
            Err(DifficultyError::InvalidRateBounds)
        );
        assert_eq!(
            DifficultySettings::new(70, 130, 0, 3, 3),
            Err(DifficultyError::InvalidRateStep)
        );
        assert_eq!(
            DifficultySettings::new(70, 130, 10, 0, 3),
            Err(DifficultyError::InvalidStreakStep)
        );
    }
}
