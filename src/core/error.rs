//! Error types for scheduler and job operations.

use thiserror::Error;

use super::SchedulerPhase;

/// Errors produced by scheduler operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Configuration values were rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The operation is not valid in the scheduler's current phase.
    #[error("cannot {operation} while scheduler is {phase}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// Phase the scheduler was in.
        phase: SchedulerPhase,
    },
}

/// Failure recorded on a job that ended in the `Failed` state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job callback panicked; carries the reconstructed panic message.
    #[error("job panicked: {0}")]
    Panicked(String),
    /// The job callback returned an error.
    #[error("job failed: {0}")]
    Failed(String),
    /// The job was submitted after the scheduler stopped accepting work.
    #[error("job rejected: scheduler is not accepting submissions")]
    Rejected,
    /// The job was still queued when pending work was discarded by a reset.
    #[error("job discarded before it was dispatched")]
    Discarded,
    /// Scheduler bookkeeping failed for this job.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
