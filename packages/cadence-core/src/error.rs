use cadence_scheduler::SchedulerError;
use thiserror::Error;

/// Returned by an action that refuses to produce a patch.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action rejected: {0}")]
    Rejected(String),
}

impl ActionError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ActionError::Rejected(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// Updates before the failing one stay applied; the rest of the batch is dropped.
    #[error("action failed after {applied} applied update(s), {discarded} discarded")]
    ActionFailed {
        applied: usize,
        discarded: usize,
        #[source]
        source: ActionError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
