//! Core scheduling abstractions, job lifecycle, and capacity accounting.

pub mod audit;
pub mod error;
pub mod executor;
pub mod job;
pub mod scheduler;
pub mod stats;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, JobError, SchedulerError};
pub use executor::{JobOutput, JobTask};
pub use job::{JobHandle, JobId, JobSnapshot, JobState};
pub use scheduler::{
    JobQueue, Scheduler, SchedulerLimits, SchedulerPhase, Spawn, DEFAULT_GRACE_PERIOD,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use stats::SchedulerStats;
