use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::scoring::SessionResult;
use crate::model::tier::Tier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionRecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { correct: u32, total: u32 },
}

/// History entry for one finished listening session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    tier: Tier,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    result: SessionResult,
}

impl SessionRecord {
    /// # Errors
    ///
    /// Returns `SessionRecordError::InvalidTimeRange` if the session ends
    /// before it starts, or `CountMismatch` for an impossible result.
    pub fn new(
        tier: Tier,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: SessionResult,
    ) -> Result<Self, SessionRecordError> {
        if completed_at < started_at {
            return Err(SessionRecordError::InvalidTimeRange);
        }
        if result.correct_count > result.total_questions {
            return Err(SessionRecordError::CountMismatch {
                correct: result.correct_count,
                total: result.total_questions,
            });
        }
        Ok(Self {
            tier,
            started_at,
            completed_at,
            result,
        })
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn result(&self) -> &SessionResult {
        &self.result
    }
}
