mod board;
mod difficulty;
mod ids;
mod mix;
mod progress;
mod question;
mod rank;
mod scoring;
mod session;
pub mod text;
mod tier;

pub use ids::{ParseIdError, QuestionId, SourceId};
pub use tier::{QuestionKind, Tier, TierError};

pub use board::{BoardError, MAX_PANEL_COUNT, TokenBoard};
pub use difficulty::{
    DifficultyController, DifficultyError, DifficultySettings, DifficultyState, HintOutcome,
};
pub use mix::{TypeMix, TypeMixError};
pub use progress::TierProgress;
pub use question::{NewQuestion, QuestionError, QuestionRecord};
pub use rank::LearnerRank;
pub use scoring::{ScoringError, ScoringRules, SessionResult, StarRating};
pub use session::{SessionRecord, SessionRecordError};
