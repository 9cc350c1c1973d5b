use std::sync::Arc;

use listen_core::Clock;
use listen_core::model::{
    DifficultyController, DifficultySettings, HintOutcome, LearnerRank, ScoringRules,
    SessionRecord, Tier, TierProgress, TypeMix,
};
use storage::repository::{ContentRepository, ProgressionRepository, SessionResultRepository};

use super::builder::SessionBuilder;
use super::runner::{FinalizeStage, RunnerState, SessionRunner};
use crate::distractors::{DistractorSource, VocabularyDistractors};
use crate::error::SessionError;
use crate::pool::{PoolManager, ResetScope};
use crate::speech::{SilentSpeech, SpeechOutput};

fn log_misuse(err: SessionError) -> SessionError {
    if let SessionError::InvalidTransition { action, state } = &err {
        tracing::error!(action, %state, "invalid session transition");
    }
    err
}

/// Orchestrates listening sessions: builds them from the shared pool, relays
/// hints to speech output and persists results once a session completes.
#[derive(Clone)]
pub struct ListeningSessionService {
    clock: Clock,
    pool: Arc<PoolManager>,
    content: Arc<dyn ContentRepository>,
    progression: Arc<dyn ProgressionRepository>,
    results: Arc<dyn SessionResultRepository>,
    distractors: Arc<dyn DistractorSource>,
    speech: Arc<dyn SpeechOutput>,
    mix: TypeMix,
    difficulty: DifficultySettings,
    rules: ScoringRules,
}

impl ListeningSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        pool: Arc<PoolManager>,
        content: Arc<dyn ContentRepository>,
        progression: Arc<dyn ProgressionRepository>,
        results: Arc<dyn SessionResultRepository>,
    ) -> Self {
        Self {
            clock,
            pool,
            content,
            progression,
            results,
            distractors: Arc::new(VocabularyDistractors::builtin()),
            speech: Arc::new(SilentSpeech),
            mix: TypeMix::standard(),
            difficulty: DifficultySettings::default(),
            rules: ScoringRules::default(),
        }
    }

    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = speech;
        self
    }

    #[must_use]
    pub fn with_distractors(mut self, distractors: Arc<dyn DistractorSource>) -> Self {
        self.distractors = distractors;
        self
    }

    #[must_use]
    pub fn with_mix(mut self, mix: TypeMix) -> Self {
        self.mix = mix;
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: DifficultySettings) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ScoringRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn pool(&self) -> Arc<PoolManager> {
        Arc::clone(&self.pool)
    }

    async fn ensure_loaded(&self, tier: Tier) -> Result<usize, SessionError> {
        let size = self.pool.size(tier);
        if size > 0 {
            return Ok(size);
        }
        let items = self.content.get_distinct_questions(tier).await?;
        let size = self.pool.load(tier, items);
        tracing::debug!(%tier, size, "pool loaded");
        Ok(size)
    }

    /// Start a new session for `tier`.
    ///
    /// The tier's pool is loaded from the content store on first use (and
    /// again while it is empty). Playback starts at the base rate for the
    /// learner's rank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyContentPool` if the tier has no questions;
    /// the host may retry later. Returns `SessionError::Storage` if content or
    /// experience cannot be read.
    pub async fn start_session(&self, tier: Tier) -> Result<SessionRunner, SessionError> {
        self.ensure_loaded(tier).await?;

        let plan = SessionBuilder::new(&self.pool, &self.mix).build(tier);
        if plan.is_empty() {
            return Err(SessionError::EmptyContentPool { tier });
        }

        let rank = LearnerRank::from_experience(self.progression.total_experience().await?);
        let mut difficulty = DifficultyController::new(self.difficulty);
        difficulty.reset_for_session(rank.base_rate_pct());

        tracing::info!(
            %tier,
            items = plan.total(),
            replicated = plan.replicated,
            borrowed = plan.borrowed,
            rank = rank.value(),
            rate_pct = difficulty.initial_rate_pct(),
            "session started"
        );

        SessionRunner::new(
            plan,
            difficulty,
            self.rules,
            Arc::clone(&self.distractors),
            self.clock.now(),
        )
    }

    /// Speak the current question at the session's playback rate.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session is completed.
    pub fn play_prompt(&self, runner: &SessionRunner) -> Result<(), SessionError> {
        let item = runner
            .current_item()
            .ok_or(SessionError::InvalidTransition {
                action: "play the prompt",
                state: runner.state(),
            })
            .map_err(log_misuse)?;
        self.speech.speak(item.display_text(), runner.playback_rate());
        Ok(())
    }

    /// Spend a hint; the prompt is replayed when one was available.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn request_hint(&self, runner: &mut SessionRunner) -> Result<HintOutcome, SessionError> {
        let outcome = runner.request_hint().map_err(log_misuse)?;
        match outcome {
            HintOutcome::Play { remaining } => {
                tracing::debug!(remaining, "hint granted");
                self.play_prompt(runner)?;
            }
            HintOutcome::Exhausted => tracing::debug!("hints exhausted"),
        }
        Ok(outcome)
    }

    /// Refill hints after an external reward (e.g. a watched ad).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session is completed.
    pub fn grant_hint_recovery(&self, runner: &mut SessionRunner) -> Result<(), SessionError> {
        runner.grant_hint_recovery().map_err(log_misuse)?;
        tracing::info!(tier = %runner.tier(), "hint budget restored");
        Ok(())
    }

    /// Advance past the shown result, finalizing when the session completes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `ShowingResult`, or
    /// a storage error from finalization. A failed finalization can be
    /// retried with [`ListeningSessionService::finalize`].
    pub async fn advance(&self, runner: &mut SessionRunner) -> Result<RunnerState, SessionError> {
        let state = runner.advance(self.clock.now()).map_err(log_misuse)?;
        if state == RunnerState::Completed {
            self.finalize(runner).await?;
        }
        Ok(state)
    }

    /// Persist a completed session: unlock the next tier and record best
    /// stars on a pass, add experience, append history. Safe to call again;
    /// finished steps are not repeated. Returns the history record id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session is not
    /// complete, or `SessionError::Storage` if persistence fails.
    pub async fn finalize(&self, runner: &mut SessionRunner) -> Result<i64, SessionError> {
        if let FinalizeStage::Recorded(id) = runner.finalize_stage() {
            return Ok(id);
        }
        let result = *runner
            .result()
            .ok_or(SessionError::InvalidTransition {
                action: "finalize",
                state: runner.state(),
            })
            .map_err(log_misuse)?;
        let tier = runner.tier();

        if runner.finalize_stage() == FinalizeStage::Pending {
            if result.passed {
                if let Some(next) = tier.next() {
                    self.progression.unlock_tier(next).await?;
                    tracing::info!(%next, "tier unlocked");
                }
                self.progression.record_best_stars(tier, result.stars).await?;
            }
            let total_xp = self.progression.add_experience(result.xp_earned).await?;
            tracing::info!(%tier, xp = result.xp_earned, total_xp, "experience added");
            runner.set_finalize_stage(FinalizeStage::ProgressionApplied);
        }

        let record = runner.record()?;
        let id = self.results.append_record(&record).await?;
        runner.set_finalize_stage(FinalizeStage::Recorded(id));
        Ok(id)
    }

    /// Clear anti-repetition history. Intended for QA.
    pub fn reset_seen(&self, scope: ResetScope) {
        self.pool.reset_seen(scope);
    }

    /// Re-read a tier's distinct questions into the pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if content cannot be read.
    pub async fn reload_content(&self, tier: Tier) -> Result<usize, SessionError> {
        let items = self.content.get_distinct_questions(tier).await?;
        let size = self.pool.replace(tier, items);
        tracing::debug!(%tier, size, "pool reloaded");
        Ok(size)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if history cannot be read.
    pub async fn history(&self, tier: Tier, limit: u32) -> Result<Vec<SessionRecord>, SessionError> {
        Ok(self.results.list_records(tier, limit).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if progression cannot be read.
    pub async fn progress(&self) -> Result<Vec<TierProgress>, SessionError> {
        Ok(self.progression.list_progress().await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if experience cannot be read.
    pub async fn learner_rank(&self) -> Result<LearnerRank, SessionError> {
        let total = self.progression.total_experience().await?;
        Ok(LearnerRank::from_experience(total))
    }
}
