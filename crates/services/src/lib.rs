#![forbid(unsafe_code)]

pub mod app_services;
pub mod distractors;
pub mod error;
pub mod pool;
pub mod sessions;
pub mod speech;

pub use listen_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use distractors::{DistractorSource, VocabularyDistractors};
pub use error::{AppServicesError, SessionError};
pub use pool::{PoolManager, ResetScope};
pub use speech::{SilentSpeech, SpeechOutput};

pub use sessions::{
    AnswerOutcome, ListeningSessionService, RunnerState, SessionBuilder, SessionPlan,
    SessionProgress, SessionRunner,
};
