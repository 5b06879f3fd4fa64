//! Job lifecycle: state machine, single-fire completion, and invocation.
//!
//! A job moves `Prepared → Running → {Done, TimedOut, Failed}`. Every
//! transition goes through the job's record mutex, so only one completion
//! path (natural return, timeout watchdog, scheduler abandonment) can win.
//! The winner is the only caller allowed to fire the done hook.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::executor::JobBody;
use super::{JobError, Spawn};
use crate::util::clock::now_ms;

/// Job identifier, assigned in submission order.
pub type JobId = u64;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created and waiting in the queue.
    Prepared,
    /// Dispatched into a running slot.
    Running,
    /// Callback returned normally.
    Done,
    /// Timeout or forced abandonment ended the job.
    TimedOut,
    /// Callback panicked, returned an error, or the job never ran.
    Failed,
}

impl JobState {
    /// Whether this is one of the terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::TimedOut | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepared => write!(f, "prepared"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Called exactly once by whichever path completes a running job.
pub(crate) type DoneHook = Arc<dyn Fn(&Arc<Job>) + Send + Sync>;

struct JobRecord {
    state: JobState,
    started_at_ms: Option<u128>,
    finished_at_ms: Option<u128>,
    error: Option<JobError>,
    token: Option<CancellationToken>,
    /// Set once the timeout fired and cancelled the token.
    deadline_hit: bool,
    /// Set when the scheduler stopped waiting for a still-running callback.
    abandoned: bool,
}

/// Scheduler-owned job. Callers only see it through [`JobHandle`].
pub(crate) struct Job {
    id: JobId,
    timeout: Option<Duration>,
    record: Mutex<JobRecord>,
    body: Mutex<Option<JobBody>>,
    /// Cancelled when the job reaches a terminal state.
    finished: CancellationToken,
}

impl Job {
    pub(crate) fn new(id: JobId, timeout: Option<Duration>, body: JobBody) -> Arc<Self> {
        Arc::new(Self {
            id,
            timeout: timeout.filter(|t| !t.is_zero()),
            record: Mutex::new(JobRecord {
                state: JobState::Prepared,
                started_at_ms: None,
                finished_at_ms: None,
                error: None,
                token: None,
                deadline_hit: false,
                abandoned: false,
            }),
            body: Mutex::new(Some(body)),
            finished: CancellationToken::new(),
        })
    }

    pub(crate) const fn id(&self) -> JobId {
        self.id
    }

    pub(crate) fn state(&self) -> JobState {
        self.record.lock().state
    }

    pub(crate) fn error(&self) -> Option<JobError> {
        self.record.lock().error.clone()
    }

    pub(crate) fn was_abandoned(&self) -> bool {
        self.record.lock().abandoned
    }

    /// Spawn the body with the token returned by [`mark_running`](Self::mark_running)
    /// and arm the timeout watchdog when a timeout is set.
    ///
    /// Must be called without the scheduler lock held: a spawner may poll
    /// the body inline, and completion re-enters the scheduler through
    /// `on_done`.
    pub(crate) fn invoke<S: Spawn>(
        self: &Arc<Self>,
        token: CancellationToken,
        grace_period: Duration,
        spawner: &S,
        on_done: &DoneHook,
    ) {
        let body = self.body.lock().take();

        let job = Arc::clone(self);
        let hook = Arc::clone(on_done);
        spawner.spawn(async move {
            let result = match body {
                Some(body) => AssertUnwindSafe(async move { body(token).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(&*payload)))),
                None => Err(JobError::Internal("job body already consumed".into())),
            };
            if let Err(e) = &result {
                debug!(job_id = job.id, error = %e, "job callback failed");
            }
            if job.complete_with(result) {
                hook(&job);
            } else {
                warn!(job_id = job.id, "job returned after it was abandoned");
            }
        });

        if let Some(timeout) = self.timeout {
            let job = Arc::clone(self);
            let hook = Arc::clone(on_done);
            spawner.spawn(async move {
                tokio::select! {
                    () = job.finished.cancelled() => return,
                    () = tokio::time::sleep(timeout) => {}
                }
                job.mark_deadline();
                debug!(job_id = job.id, ?timeout, "job timeout reached, cancellation signalled");

                tokio::select! {
                    () = job.finished.cancelled() => return,
                    () = tokio::time::sleep(grace_period) => {}
                }
                if job.force_complete() {
                    warn!(
                        job_id = job.id,
                        ?timeout,
                        ?grace_period,
                        "job ignored cancellation past its grace period, abandoning"
                    );
                    hook(&job);
                }
            });
        }
    }

    /// Move `Prepared → Running` and derive the job token from `parent`.
    /// Returns `None` if the job was not prepared.
    pub(crate) fn mark_running(&self, parent: &CancellationToken) -> Option<CancellationToken> {
        let mut rec = self.record.lock();
        if rec.state != JobState::Prepared {
            return None;
        }
        let token = parent.child_token();
        rec.state = JobState::Running;
        rec.started_at_ms = Some(now_ms());
        rec.token = Some(token.clone());
        Some(token)
    }

    fn mark_deadline(&self) {
        let mut rec = self.record.lock();
        if rec.state == JobState::Running {
            rec.deadline_hit = true;
            if let Some(token) = &rec.token {
                token.cancel();
            }
        }
    }

    /// Record the callback's own outcome. Returns `false` if another path
    /// already completed the job.
    fn complete_with(&self, result: Result<(), JobError>) -> bool {
        let mut rec = self.record.lock();
        if rec.state != JobState::Running {
            return false;
        }
        match result {
            Ok(()) if rec.deadline_hit => rec.state = JobState::TimedOut,
            Ok(()) => rec.state = JobState::Done,
            Err(e) => {
                rec.state = JobState::Failed;
                rec.error = Some(e);
            }
        }
        rec.finished_at_ms = Some(now_ms());
        drop(rec);
        self.finished.cancel();
        true
    }

    /// Abandon a running job: cancel its token and mark it `TimedOut`
    /// without waiting for the callback. Returns `false` if the job was not
    /// running (already completed, or never started).
    pub(crate) fn force_complete(&self) -> bool {
        let mut rec = self.record.lock();
        if rec.state != JobState::Running {
            return false;
        }
        if let Some(token) = &rec.token {
            token.cancel();
        }
        rec.state = JobState::TimedOut;
        rec.abandoned = true;
        rec.finished_at_ms = Some(now_ms());
        drop(rec);
        self.finished.cancel();
        true
    }

    /// Fail a job that never ran (rejected or discarded).
    pub(crate) fn fail_unstarted(&self, error: JobError) -> bool {
        let mut rec = self.record.lock();
        if rec.state != JobState::Prepared {
            return false;
        }
        rec.state = JobState::Failed;
        rec.error = Some(error);
        rec.finished_at_ms = Some(now_ms());
        drop(rec);
        drop(self.body.lock().take());
        self.finished.cancel();
        true
    }
}

/// Render a panic payload into a message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Read-only view of a submitted job.
///
/// Handles are cheap to clone and stay valid after the job finishes.
#[derive(Clone)]
pub struct JobHandle {
    job: Arc<Job>,
}

impl JobHandle {
    pub(crate) const fn new(job: Arc<Job>) -> Self {
        Self { job }
    }

    pub(crate) const fn job(&self) -> &Arc<Job> {
        &self.job
    }

    /// Job identifier.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.job.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.job.state()
    }

    /// Error recorded when the job ended `Failed`.
    #[must_use]
    pub fn error(&self) -> Option<JobError> {
        self.job.error()
    }

    /// Whether the scheduler gave up waiting on this job while its callback
    /// was still running. The callback may still be executing.
    #[must_use]
    pub fn was_abandoned(&self) -> bool {
        self.job.was_abandoned()
    }

    /// Whether the job reached a terminal state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state().is_terminal()
    }

    /// Whether the job currently occupies a running slot.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == JobState::Running
    }

    /// Per-job timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.job.timeout
    }

    /// Dispatch time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn started_at_ms(&self) -> Option<u128> {
        self.job.record.lock().started_at_ms
    }

    /// Completion time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn finished_at_ms(&self) -> Option<u128> {
        self.job.record.lock().finished_at_ms
    }

    /// Cancellation token handed to the callback; `None` until dispatched.
    #[must_use]
    pub fn token(&self) -> Option<CancellationToken> {
        self.job.record.lock().token.clone()
    }

    /// Wait until the job reaches a terminal state.
    ///
    /// For abandoned jobs this resolves when the scheduler gives up on them,
    /// not when their callback actually returns.
    pub async fn wait_async(&self) {
        self.job.finished.cancelled().await;
    }

    /// Point-in-time serializable view of the job.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        let rec = self.job.record.lock();
        JobSnapshot {
            id: self.job.id,
            state: rec.state,
            error: rec.error.as_ref().map(ToString::to_string),
            timeout_ms: self.job.timeout.map(|t| t.as_millis()),
            started_at_ms: rec.started_at_ms,
            finished_at_ms: rec.finished_at_ms,
        }
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.job.record.lock();
        f.debug_struct("JobHandle")
            .field("id", &self.job.id)
            .field("state", &rec.state)
            .field("error", &rec.error)
            .finish_non_exhaustive()
    }
}

/// Serializable job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job identifier.
    pub id: JobId,
    /// Lifecycle state.
    pub state: JobState,
    /// Failure message, if the job failed.
    pub error: Option<String>,
    /// Timeout in milliseconds, if set.
    pub timeout_ms: Option<u128>,
    /// Dispatch time (ms since epoch).
    pub started_at_ms: Option<u128>,
    /// Completion time (ms since epoch).
    pub finished_at_ms: Option<u128>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::closure_body;

    fn noop_job(id: JobId) -> Arc<Job> {
        Job::new(id, None, closure_body(|_token: CancellationToken| async {}))
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Prepared.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Done.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_completion_is_single_fire() {
        let job = noop_job(1);
        let root = CancellationToken::new();
        assert!(job.mark_running(&root).is_some());

        assert!(job.complete_with(Ok(())));
        assert!(!job.force_complete());
        assert!(!job.complete_with(Err(JobError::Failed("late".into()))));

        let handle = JobHandle::new(job);
        assert_eq!(handle.state(), JobState::Done);
        assert!(handle.error().is_none());
        assert!(handle.finished_at_ms().is_some());
    }

    #[test]
    fn test_force_complete_cancels_token() {
        let job = noop_job(2);
        let root = CancellationToken::new();
        let token = job.mark_running(&root).unwrap();

        assert!(job.force_complete());
        assert!(token.is_cancelled());
        assert!(job.was_abandoned());
        assert_eq!(job.state(), JobState::TimedOut);
        assert!(!job.complete_with(Ok(())));
    }

    #[test]
    fn test_return_after_deadline_is_timed_out() {
        let job = noop_job(3);
        let token = job.mark_running(&CancellationToken::new()).unwrap();
        job.mark_deadline();
        assert!(token.is_cancelled());
        assert!(job.complete_with(Ok(())));
        assert_eq!(job.state(), JobState::TimedOut);
    }

    #[test]
    fn test_terminal_job_never_restarts() {
        let job = noop_job(4);
        assert!(job.fail_unstarted(JobError::Rejected));
        assert!(job.mark_running(&CancellationToken::new()).is_none());
        assert_eq!(job.state(), JobState::Failed);
    }

    #[test]
    fn test_zero_timeout_is_unset() {
        let job = Job::new(
            5,
            Some(Duration::ZERO),
            closure_body(|_token: CancellationToken| async {}),
        );
        assert_eq!(JobHandle::new(job).timeout(), None);
    }

    #[test]
    fn test_panic_message_downcasts() {
        let s: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(&*s), "static str");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*s), "owned");
        let s: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(&*s), "non-string panic payload");
    }

    #[test]
    fn test_snapshot_serializes() {
        let handle = JobHandle::new(noop_job(6));
        let json = serde_json::to_string(&handle.snapshot()).unwrap();
        assert!(json.contains("\"state\":\"prepared\""));
    }
}
