use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use listen_core::model::text::answers_match;
use listen_core::model::{
    DifficultyController, DifficultyState, HintOutcome, QuestionRecord, ScoringRules,
    SessionRecord, SessionResult, Tier, TokenBoard,
};
use rand::rng;
use rand::seq::SliceRandom;

use super::builder::SessionPlan;
use super::progress::SessionProgress;
use crate::distractors::DistractorSource;
use crate::error::SessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a running session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    AwaitingAnswer { index: usize },
    ShowingResult { index: usize, was_correct: bool },
    Completed,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerState::AwaitingAnswer { index } => write!(f, "awaiting answer {index}"),
            RunnerState::ShowingResult { index, was_correct } => {
                let verdict = if *was_correct { "correct" } else { "incorrect" };
                write!(f, "showing result {index} ({verdict})")
            }
            RunnerState::Completed => f.write_str("completed"),
        }
    }
}

/// Judgement of one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub index: usize,
    pub was_correct: bool,
    pub submitted: Vec<String>,
    pub expected: Vec<String>,
    pub difficulty: DifficultyState,
}

/// How far persistence of a completed session got. Lets a failed
/// finalization be retried without applying experience twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FinalizeStage {
    #[default]
    Pending,
    ProgressionApplied,
    Recorded(i64),
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// Steps a learner through a session plan one question at a time.
///
/// `AwaitingAnswer(i)` accepts token selection, hints and submission;
/// `ShowingResult(i, _)` only accepts `advance`; `Completed` is terminal and
/// carries the scored result.
pub struct SessionRunner {
    tier: Tier,
    items: Vec<QuestionRecord>,
    state: RunnerState,
    correct: u32,
    mistakes: u32,
    answered: u32,
    difficulty: DifficultyController,
    board: Option<TokenBoard>,
    distractors: Arc<dyn DistractorSource>,
    rules: ScoringRules,
    result: Option<SessionResult>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    finalize: FinalizeStage,
}

impl fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRunner")
            .field("tier", &self.tier)
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("correct", &self.correct)
            .field("mistakes", &self.mistakes)
            .field("answered", &self.answered)
            .finish_non_exhaustive()
    }
}

impl SessionRunner {
    /// Starts at the first question. `difficulty` should already be reset
    /// for this session. An empty plan starts out completed with a zero
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Scoring` only if the empty-plan result cannot be
    /// computed.
    pub fn new(
        plan: SessionPlan,
        difficulty: DifficultyController,
        rules: ScoringRules,
        distractors: Arc<dyn DistractorSource>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let mut runner = Self {
            tier: plan.tier,
            items: plan.items,
            state: RunnerState::AwaitingAnswer { index: 0 },
            correct: 0,
            mistakes: 0,
            answered: 0,
            difficulty,
            board: None,
            distractors,
            rules,
            result: None,
            started_at,
            completed_at: None,
            finalize: FinalizeStage::Pending,
        };

        if runner.items.is_empty() {
            runner.result = Some(rules.score(0, 0)?);
            runner.completed_at = Some(started_at);
            runner.state = RunnerState::Completed;
        } else {
            runner.board = Some(runner.build_board(0));
        }
        Ok(runner)
    }

    fn build_board(&self, index: usize) -> TokenBoard {
        let answer = self.items[index].answer_tokens();
        let distractors = self.distractors.distractors(
            self.tier,
            answer,
            TokenBoard::distractor_slots(answer.len()),
        );
        let mut board = TokenBoard::new(answer, &distractors);
        board.arrange(|options| options.shuffle(&mut rng()));
        board
    }

    fn awaiting(&self, action: &'static str) -> Result<usize, SessionError> {
        match self.state {
            RunnerState::AwaitingAnswer { index } => Ok(index),
            state => Err(SessionError::InvalidTransition { action, state }),
        }
    }

    fn board_mut(&mut self, action: &'static str) -> Result<&mut TokenBoard, SessionError> {
        self.awaiting(action)?;
        let state = self.state;
        self.board
            .as_mut()
            .ok_or(SessionError::InvalidTransition { action, state })
    }

    // ─── Queries ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    #[must_use]
    pub fn items(&self) -> &[QuestionRecord] {
        &self.items
    }

    /// The question being answered or reviewed; `None` once completed.
    #[must_use]
    pub fn current_item(&self) -> Option<&QuestionRecord> {
        match self.state {
            RunnerState::AwaitingAnswer { index } | RunnerState::ShowingResult { index, .. } => {
                self.items.get(index)
            }
            RunnerState::Completed => None,
        }
    }

    #[must_use]
    pub fn board(&self) -> Option<&TokenBoard> {
        self.board.as_ref()
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyState {
        self.difficulty.state()
    }

    #[must_use]
    pub fn playback_rate(&self) -> f32 {
        self.difficulty.playback_rate()
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn mistake_count(&self) -> u32 {
        self.mistakes
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == RunnerState::Completed
    }

    /// Set exactly once, on entering `Completed`.
    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.items.len();
        let answered = usize::try_from(self.answered).unwrap_or(usize::MAX);
        SessionProgress {
            total,
            answered,
            correct: self.correct,
            mistakes: self.mistakes,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    // ─── Answering ─────────────────────────────────────────────────────────

    /// Adds a token to the partial answer. Once the answer length is reached
    /// the selection is submitted and its outcome returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer` and
    /// `SessionError::Board` for tokens that are not on the board.
    pub fn select_token(&mut self, token: &str) -> Result<Option<AnswerOutcome>, SessionError> {
        let board = self.board_mut("select a token")?;
        board.select(token)?;
        if !board.is_complete() {
            return Ok(None);
        }
        let selected = board.selected().to_vec();
        self.submit_answer(&selected).map(Some)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn remove_last_token(&mut self) -> Result<Option<String>, SessionError> {
        Ok(self.board_mut("remove a token")?.remove_last())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer` and
    /// `SessionError::Board` when nothing is selected at `index`.
    pub fn remove_token_at(&mut self, index: usize) -> Result<String, SessionError> {
        Ok(self.board_mut("remove a token")?.remove_at(index)?)
    }

    /// Judges a full answer for the current question: case-folded, exact
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer` and
    /// `SessionError::IncompleteAnswer` when the token count is wrong. The
    /// state is unchanged on error.
    pub fn submit_answer<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
    ) -> Result<AnswerOutcome, SessionError> {
        let index = self.awaiting("submit an answer")?;
        let expected = self.items[index].answer_tokens();
        if tokens.len() != expected.len() {
            return Err(SessionError::IncompleteAnswer {
                expected: expected.len(),
                got: tokens.len(),
            });
        }

        let was_correct = answers_match(tokens, expected);
        let expected = expected.to_vec();
        self.answered += 1;
        if was_correct {
            self.correct += 1;
            self.difficulty.record_correct();
        } else {
            self.mistakes += 1;
            self.difficulty.record_incorrect();
        }
        self.state = RunnerState::ShowingResult { index, was_correct };

        let difficulty = self.difficulty.state();
        tracing::debug!(
            index,
            was_correct,
            rate_pct = difficulty.rate_pct,
            streak = difficulty.streak,
            "answer judged"
        );

        Ok(AnswerOutcome {
            index,
            was_correct,
            submitted: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
            expected,
            difficulty,
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn request_hint(&mut self) -> Result<HintOutcome, SessionError> {
        self.awaiting("request a hint")?;
        Ok(self.difficulty.request_hint())
    }

    /// Refills the hint budget after an external reward.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session is completed.
    pub fn grant_hint_recovery(&mut self) -> Result<(), SessionError> {
        if self.state == RunnerState::Completed {
            return Err(SessionError::InvalidTransition {
                action: "grant hint recovery",
                state: self.state,
            });
        }
        self.difficulty.grant_hint_recovery();
        Ok(())
    }

    /// Moves past a shown result. After the last question the session is
    /// scored and becomes `Completed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `ShowingResult`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<RunnerState, SessionError> {
        let RunnerState::ShowingResult { index, .. } = self.state else {
            return Err(SessionError::InvalidTransition {
                action: "advance",
                state: self.state,
            });
        };

        let next = index + 1;
        if next < self.items.len() {
            self.board = Some(self.build_board(next));
            self.state = RunnerState::AwaitingAnswer { index: next };
        } else {
            let total = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
            let result = self.rules.score(self.correct, total)?;
            tracing::info!(
                tier = %self.tier,
                correct = result.correct_count,
                total = result.total_questions,
                passed = result.passed,
                stars = result.stars.value(),
                "session completed"
            );
            self.board = None;
            self.result = Some(result);
            self.completed_at = Some(now.max(self.started_at));
            self.state = RunnerState::Completed;
        }
        Ok(self.state)
    }

    // ─── Finalization bookkeeping ──────────────────────────────────────────

    pub(crate) fn finalize_stage(&self) -> FinalizeStage {
        self.finalize
    }

    pub(crate) fn set_finalize_stage(&mut self, stage: FinalizeStage) {
        self.finalize = stage;
    }

    /// History entry for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` before completion.
    pub fn record(&self) -> Result<SessionRecord, SessionError> {
        let (Some(result), Some(completed_at)) = (self.result, self.completed_at) else {
            return Err(SessionError::InvalidTransition {
                action: "build a session record",
                state: self.state,
            });
        };
        Ok(SessionRecord::new(
            self.tier,
            self.started_at,
            completed_at,
            result,
        )?)
    }
}
