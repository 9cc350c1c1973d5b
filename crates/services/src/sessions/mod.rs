mod builder;
mod progress;
mod runner;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use builder::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use runner::{AnswerOutcome, RunnerState, SessionRunner};
pub use workflow::ListeningSessionService;
