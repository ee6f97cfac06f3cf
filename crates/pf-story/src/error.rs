use crate::choice::ChoiceId;
use crate::path::LocationPath;

/// Alias for `Result<T, StoryError>`.
pub type StoryResult<T> = Result<T, StoryError>;

/// Faults a story runtime can raise while tooling drives it.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    /// The path does not name a location in the compiled program.
    #[error("unknown location: {0}")]
    UnknownLocation(LocationPath),

    /// No pending option carries the given id.
    #[error("no pending choice with id {0}")]
    InvalidChoice(ChoiceId),

    /// `continue_until` was called while the story was stalled or finished.
    #[error("cannot continue: story is stalled or finished")]
    CannotContinue,

    /// A snapshot could not be decoded back into execution state.
    #[error("corrupt snapshot: {0}")]
    SnapshotCorrupt(String),

    /// A single continue call executed more steps than allowed, which on a
    /// finite program means a runaway loop.
    #[error("step limit exceeded after {limit} steps")]
    StepLimitExceeded {
        /// The budget that was exhausted.
        limit: u32,
    },
}
