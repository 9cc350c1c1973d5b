//! Shared error types for the services crate.

use thiserror::Error;

use listen_core::model::{BoardError, ScoringError, SessionRecordError, Tier};
use storage::import::ImportError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::RunnerState;

/// Errors emitted by session building, running and finalization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The tier has no content at all, even after borrowing across kinds.
    #[error("no questions available for tier {tier}")]
    EmptyContentPool { tier: Tier },

    /// An action was invoked in a state that does not accept it.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: RunnerState,
    },

    #[error("answer has {got} tokens, expected {expected}")]
    IncompleteAnswer { expected: usize, got: usize },

    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Record(#[from] SessionRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Import(#[from] ImportError),
}
