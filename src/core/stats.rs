//! Scheduler statistics: lifetime counters plus point-in-time gauges.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{JobState, SchedulerPhase};

/// Statistics about scheduler utilization and job outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Current lifecycle phase.
    pub phase: SchedulerPhase,
    /// Maximum number of concurrently running jobs.
    pub concurrency_limit: usize,
    /// Jobs waiting in the queue.
    pub queued_jobs: usize,
    /// Jobs occupying running slots.
    pub running_jobs: usize,
    /// Queued plus running jobs, as seen by `wait`.
    pub outstanding_jobs: usize,
    /// Total jobs accepted.
    pub submitted_jobs: u64,
    /// Jobs that ended `Done`.
    pub completed_jobs: u64,
    /// Jobs whose callback panicked or returned an error.
    pub failed_jobs: u64,
    /// Jobs that ended `TimedOut`, including abandoned ones.
    pub timed_out_jobs: u64,
    /// Jobs the scheduler stopped waiting for while they were still running.
    pub abandoned_jobs: u64,
    /// Submissions refused because the scheduler was not active.
    pub rejected_jobs: u64,
    /// Queued jobs dropped by a reset.
    pub discarded_jobs: u64,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
    pub abandoned: AtomicU64,
    pub rejected: AtomicU64,
    pub discarded: AtomicU64,
}

impl SchedulerCounters {
    /// Count a job that reached a terminal state through the done hook.
    pub fn record_outcome(&self, state: JobState) {
        let counter = match state {
            JobState::Done => &self.completed,
            JobState::TimedOut => &self.timed_out,
            JobState::Failed => &self.failed,
            JobState::Prepared | JobState::Running => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Combine counters with gauges taken under the scheduler lock.
    pub fn snapshot(
        &self,
        phase: SchedulerPhase,
        concurrency_limit: usize,
        queued_jobs: usize,
        running_jobs: usize,
        outstanding_jobs: usize,
    ) -> SchedulerStats {
        SchedulerStats {
            phase,
            concurrency_limit,
            queued_jobs,
            running_jobs,
            outstanding_jobs,
            submitted_jobs: self.submitted.load(Ordering::Relaxed),
            completed_jobs: self.completed.load(Ordering::Relaxed),
            failed_jobs: self.failed.load(Ordering::Relaxed),
            timed_out_jobs: self.timed_out.load(Ordering::Relaxed),
            abandoned_jobs: self.abandoned.load(Ordering::Relaxed),
            rejected_jobs: self.rejected.load(Ordering::Relaxed),
            discarded_jobs: self.discarded.load(Ordering::Relaxed),
        }
    }
}
