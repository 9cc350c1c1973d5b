use thiserror::Error;

use crate::model::{
    BoardError, DifficultyError, QuestionError, ScoringError, SessionRecordError, TierError,
    TypeMixError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Tier(#[from] TierError),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    TypeMix(#[from] TypeMixError),
    #[error(transparent)]
    SessionRecord(#[from] SessionRecordError),
}
