//! Bounded scheduler: FIFO admission, completion bookkeeping, and shutdown.
//!
//! All queue/running-set mutations are linearized through one
//! `parking_lot::Mutex`. Job bodies run as spawned tasks outside that lock.
//! Blocking waits use a `Condvar` paired with the same mutex; async waits use
//! a `tokio::sync::Notify` armed before the condition is checked, so neither
//! can miss a wakeup.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::executor::{closure_body, task_body, JobBody, JobOutput, JobTask};
use super::job::{DoneHook, Job, JobHandle, JobId, JobState};
use super::stats::{SchedulerCounters, SchedulerStats};
use super::{JobError, SchedulerError};
use crate::infra::queue::InMemoryQueue;
use crate::runtime::TokioSpawner;

/// Default time a job may keep running after its timeout cancelled it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Default bound on a graceful stop before running jobs are abandoned.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Abstraction for spawning job execution on a runtime.
pub trait Spawn {
    /// Spawn a detached task.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Abstraction for pending-job storage.
///
/// Implementations must be FIFO and safe to call concurrently; the scheduler
/// calls them while holding its own lock, so they must not call back into the
/// scheduler.
pub trait JobQueue: Send + Sync {
    /// Append a job at the tail.
    fn push(&self, job: JobHandle);
    /// Remove and return the head.
    fn pop(&self) -> Option<JobHandle>;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether the queue holds no jobs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Atomically empty the queue, returning what was removed in FIFO order.
    fn clear(&self) -> Vec<JobHandle>;
    /// Pending jobs in FIFO order, without removing them.
    fn snapshot(&self) -> Vec<JobHandle>;
}

/// Scheduler lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Accepting submissions and dispatching.
    Active,
    /// No new dispatch; waiting for running jobs to be reaped.
    Stopping,
    /// Terminal until [`Scheduler::reset`].
    Stopped,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Configuration values for concurrency and timing enforcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerLimits {
    /// Maximum number of concurrently running jobs.
    pub concurrency_limit: usize,
    /// Bound on a graceful stop before running jobs are abandoned.
    pub shutdown_timeout: Duration,
    /// Extra time a timed-out job gets to observe cancellation.
    pub grace_period: Duration,
    /// Timeout applied to jobs submitted without an explicit one.
    pub default_job_timeout: Option<Duration>,
}

impl SchedulerLimits {
    /// Limits with the default grace period and no default job timeout.
    #[must_use]
    pub const fn new(concurrency_limit: usize, shutdown_timeout: Duration) -> Self {
        Self {
            concurrency_limit,
            shutdown_timeout,
            grace_period: DEFAULT_GRACE_PERIOD,
            default_job_timeout: None,
        }
    }

    /// Validate limit values.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the concurrency limit is 0.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.concurrency_limit == 0 {
            return Err(SchedulerError::InvalidConfig(
                "concurrency_limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// State guarded by the scheduler lock.
struct SchedulerState {
    phase: SchedulerPhase,
    concurrency_limit: usize,
    running: HashMap<JobId, Arc<Job>>,
    /// Queued plus running jobs. Only ever decremented with `saturating_sub`.
    outstanding: usize,
    /// Parent of every job token for the current activation.
    root: CancellationToken,
}

impl SchedulerState {
    /// Nothing running, and nothing queued that could still be dispatched.
    fn is_drained(&self) -> bool {
        self.running.is_empty()
            && (self.outstanding == 0 || self.phase == SchedulerPhase::Stopped)
    }
}

struct Shared<S> {
    state: Mutex<SchedulerState>,
    changed: Condvar,
    changed_async: Notify,
    queue: Box<dyn JobQueue>,
    spawner: S,
    audit: Option<Arc<dyn AuditSink>>,
    counters: SchedulerCounters,
    next_id: AtomicU64,
    shutdown_timeout: Duration,
    grace_period: Duration,
    default_job_timeout: Option<Duration>,
    parent: Option<CancellationToken>,
}

/// Bounded-concurrency job scheduler.
///
/// Cheap to clone; clones share the same queue, running set and phase.
///
/// # Blocking vs async
///
/// `wait`, `stop` and `shutdown` block the calling thread; the `_async`
/// variants suspend the calling task instead. Do not call the blocking
/// variants from a current-thread runtime that also drives the jobs.
pub struct Scheduler<S = TokioSpawner> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.state.lock();
        f.debug_struct("Scheduler")
            .field("phase", &st.phase)
            .field("concurrency_limit", &st.concurrency_limit)
            .field("running", &st.running.len())
            .field("outstanding", &st.outstanding)
            .finish_non_exhaustive()
    }
}

impl<S> Scheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Create a scheduler running at most `concurrency_limit` jobs at once.
    ///
    /// `shutdown_timeout` bounds [`stop`](Self::stop) before running jobs are
    /// abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if `concurrency_limit` is 0.
    pub fn new(
        concurrency_limit: usize,
        shutdown_timeout: Duration,
        spawner: S,
    ) -> Result<Self, SchedulerError> {
        Self::with_limits(SchedulerLimits::new(concurrency_limit, shutdown_timeout), spawner)
    }

    /// Create a scheduler from explicit limits, with an in-memory queue.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the limits are invalid.
    pub fn with_limits(limits: SchedulerLimits, spawner: S) -> Result<Self, SchedulerError> {
        Self::from_parts(limits, Box::new(InMemoryQueue::new()), spawner, None, None)
    }

    pub(crate) fn from_parts(
        limits: SchedulerLimits,
        queue: Box<dyn JobQueue>,
        spawner: S,
        audit: Option<Arc<dyn AuditSink>>,
        parent: Option<CancellationToken>,
    ) -> Result<Self, SchedulerError> {
        limits.validate()?;
        let root = new_root(parent.as_ref());

        info!(
            concurrency_limit = limits.concurrency_limit,
            shutdown_timeout = ?limits.shutdown_timeout,
            grace_period = ?limits.grace_period,
            "scheduler initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState {
                    phase: SchedulerPhase::Active,
                    concurrency_limit: limits.concurrency_limit,
                    running: HashMap::new(),
                    outstanding: 0,
                    root,
                }),
                changed: Condvar::new(),
                changed_async: Notify::new(),
                queue,
                spawner,
                audit,
                counters: SchedulerCounters::default(),
                next_id: AtomicU64::new(1),
                shutdown_timeout: limits.shutdown_timeout,
                grace_period: limits.grace_period,
                default_job_timeout: limits.default_job_timeout.filter(|t| !t.is_zero()),
                parent,
            }),
        })
    }

    /// Submit a job. Non-blocking.
    ///
    /// The callback receives the job's cancellation token and should return
    /// early once it is cancelled. The scheduler's default job timeout, if
    /// configured, applies.
    ///
    /// If the scheduler is not active the job is rejected: the returned handle
    /// is already `Failed` with [`JobError::Rejected`].
    pub fn submit<F, Fut>(&self, f: F) -> JobHandle
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: JobOutput,
    {
        self.shared
            .submit_body(closure_body(f), self.shared.default_job_timeout)
    }

    /// Submit several jobs in order. Returns one handle per job.
    pub fn submit_all<I, F, Fut>(&self, fns: I) -> Vec<JobHandle>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: JobOutput,
    {
        fns.into_iter().map(|f| self.submit(f)).collect()
    }

    /// Submit a job with its own timeout. A zero timeout means none.
    ///
    /// When the timeout elapses the job's token is cancelled; if the callback
    /// has not returned after the grace period as well, the job is marked
    /// `TimedOut` and its slot is released while the callback keeps running
    /// detached.
    pub fn submit_with_timeout<F, Fut>(&self, f: F, timeout: Duration) -> JobHandle
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: JobOutput,
    {
        self.shared.submit_body(closure_body(f), Some(timeout))
    }

    /// Submit a [`JobTask`] implementation.
    pub fn submit_task<T: JobTask>(&self, task: T) -> JobHandle {
        self.shared
            .submit_body(task_body(task), self.shared.default_job_timeout)
    }

    /// Submit a [`JobTask`] implementation with its own timeout.
    pub fn submit_task_with_timeout<T: JobTask>(&self, task: T, timeout: Duration) -> JobHandle {
        self.shared.submit_body(task_body(task), Some(timeout))
    }

    /// Block until no job is queued or running. Returns immediately when
    /// nothing was submitted.
    ///
    /// Once the scheduler is `Stopped`, jobs left in the queue no longer
    /// count: it is drained as soon as nothing is running. Those jobs stay
    /// queued for [`reset`](Self::reset).
    pub fn wait(&self) {
        self.shared.wait_blocking(SchedulerState::is_drained, None);
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`. Returns whether
    /// the scheduler drained.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared
            .wait_blocking(SchedulerState::is_drained, Instant::now().checked_add(timeout))
    }

    /// Async variant of [`wait`](Self::wait).
    pub async fn wait_async(&self) {
        self.shared.wait_async(SchedulerState::is_drained).await;
    }

    /// Graceful stop. Idempotent.
    ///
    /// Stops dispatching queued jobs and lets running jobs finish without
    /// signalling cancellation. If they are not done within the shutdown
    /// timeout, the remaining jobs are abandoned one by one. Returns once
    /// every running job is reaped and the scheduler is `Stopped`. Queued
    /// jobs stay queued for [`reset`](Self::reset).
    pub fn stop(&self) {
        let shared = &self.shared;
        if !shared.begin_stopping("stop") {
            return;
        }
        let deadline = Instant::now().checked_add(shared.shutdown_timeout);
        if !shared.wait_blocking(|st| st.running.is_empty(), deadline) {
            warn!(
                timeout = ?shared.shutdown_timeout,
                "graceful stop timed out, abandoning running jobs"
            );
            shared.abandon_running("graceful stop timed out");
        }
        shared.wait_blocking(|st| st.running.is_empty(), None);
        shared.finish_stopping();
    }

    /// Async variant of [`stop`](Self::stop).
    pub async fn stop_async(&self) {
        let shared = &self.shared;
        if !shared.begin_stopping("stop") {
            return;
        }
        let drained = tokio::time::timeout(
            shared.shutdown_timeout,
            shared.wait_async(|st| st.running.is_empty()),
        )
        .await
        .is_ok();
        if !drained {
            warn!(
                timeout = ?shared.shutdown_timeout,
                "graceful stop timed out, abandoning running jobs"
            );
            shared.abandon_running("graceful stop timed out");
        }
        shared.wait_async(|st| st.running.is_empty()).await;
        shared.finish_stopping();
    }

    /// Forced shutdown. Idempotent.
    ///
    /// Stops dispatching, cancels every running job's token, and waits up to
    /// `timeout` for them to return. Jobs still running afterwards are
    /// abandoned. A zero timeout abandons everything immediately.
    pub fn shutdown(&self, timeout: Duration) {
        let shared = &self.shared;
        if !shared.begin_stopping("shutdown") {
            return;
        }
        shared.cancel_running(timeout);
        let drained = if timeout.is_zero() {
            shared.state.lock().running.is_empty()
        } else {
            shared.wait_blocking(|st| st.running.is_empty(), Instant::now().checked_add(timeout))
        };
        if !drained {
            shared.abandon_running("forced shutdown timeout");
        }
        shared.wait_blocking(|st| st.running.is_empty(), None);
        shared.finish_stopping();
    }

    /// Async variant of [`shutdown`](Self::shutdown).
    pub async fn shutdown_async(&self, timeout: Duration) {
        let shared = &self.shared;
        if !shared.begin_stopping("shutdown") {
            return;
        }
        shared.cancel_running(timeout);
        let drained = if timeout.is_zero() {
            shared.state.lock().running.is_empty()
        } else {
            tokio::time::timeout(timeout, shared.wait_async(|st| st.running.is_empty()))
                .await
                .is_ok()
        };
        if !drained {
            shared.abandon_running("forced shutdown timeout");
        }
        shared.wait_async(|st| st.running.is_empty()).await;
        shared.finish_stopping();
    }

    /// Reactivate a stopped scheduler.
    ///
    /// With `keep_pending` the queued jobs are dispatched again; otherwise
    /// they are discarded and end `Failed` with [`JobError::Discarded`].
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidState`] unless the scheduler is `Stopped`.
    pub fn reset(&self, keep_pending: bool) -> Result<(), SchedulerError> {
        self.shared.reset(keep_pending)
    }

    /// Change the concurrency limit. Running jobs are unaffected; the new
    /// value applies to subsequent admissions.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if `limit` is 0.
    pub fn set_concurrency_limit(&self, limit: usize) -> Result<(), SchedulerError> {
        if limit == 0 {
            return Err(SchedulerError::InvalidConfig(
                "concurrency_limit must be greater than 0".into(),
            ));
        }
        let previous = {
            let mut st = self.shared.state.lock();
            std::mem::replace(&mut st.concurrency_limit, limit)
        };
        info!(previous, limit, "concurrency limit changed");
        self.shared.dispatch();
        Ok(())
    }

    /// Whether the scheduler is accepting and dispatching jobs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase() == SchedulerPhase::Active
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.shared.state.lock().phase
    }

    /// Current concurrency limit.
    #[must_use]
    pub fn concurrency_limit(&self) -> usize {
        self.shared.state.lock().concurrency_limit
    }

    /// Pending jobs in admission order.
    #[must_use]
    pub fn queued_jobs(&self) -> Vec<JobHandle> {
        let _st = self.shared.state.lock();
        self.shared.queue.snapshot()
    }

    /// Jobs currently occupying running slots, ordered by id.
    #[must_use]
    pub fn running_jobs(&self) -> Vec<JobHandle> {
        let mut jobs: Vec<JobHandle> = {
            let st = self.shared.state.lock();
            st.running
                .values()
                .map(|job| JobHandle::new(Arc::clone(job)))
                .collect()
        };
        jobs.sort_by_key(JobHandle::id);
        jobs
    }

    /// Point-in-time statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let st = self.shared.state.lock();
        self.shared.counters.snapshot(
            st.phase,
            st.concurrency_limit,
            self.shared.queue.len(),
            st.running.len(),
            st.outstanding,
        )
    }
}

impl<S> Shared<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn submit_body(self: &Arc<Self>, body: JobBody, timeout: Option<Duration>) -> JobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = Job::new(id, timeout, body);
        let handle = JobHandle::new(Arc::clone(&job));

        {
            let mut st = self.state.lock();
            if st.phase != SchedulerPhase::Active {
                let phase = st.phase;
                drop(st);
                job.fail_unstarted(JobError::Rejected);
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                self.audit(id, AuditAction::Rejected, Some(format!("scheduler {phase}")));
                warn!(job_id = id, %phase, "scheduler is not accepting submissions, job rejected");
                return handle;
            }
            self.queue.push(handle.clone());
            st.outstanding += 1;
            self.counters.submitted.fetch_add(1, Ordering::Relaxed);
            self.audit(id, AuditAction::Submitted, None);
        }
        debug!(job_id = id, timeout = ?handle.timeout(), "job submitted");

        self.dispatch();
        handle
    }

    /// Admit queued jobs while slots are free. Safe to call from any path at
    /// any time: admission (pop, mark running, insert) runs under the lock,
    /// and the admitted jobs are spawned after it is released.
    fn dispatch(self: &Arc<Self>) {
        let mut admitted = Vec::new();
        let mut dropped = false;
        {
            let mut st = self.state.lock();
            if st.phase != SchedulerPhase::Active {
                return;
            }
            while st.running.len() < st.concurrency_limit {
                let Some(handle) = self.queue.pop() else {
                    break;
                };
                let job = Arc::clone(handle.job());
                let id = job.id();
                if let Some(token) = job.mark_running(&st.root) {
                    st.running.insert(id, Arc::clone(&job));
                    self.audit(id, AuditAction::Started, None);
                    debug!(job_id = id, running = st.running.len(), "job dispatched");
                    admitted.push((job, token));
                } else {
                    st.outstanding = st.outstanding.saturating_sub(1);
                    dropped = true;
                    error!(job_id = id, state = %job.state(), "queued job was not dispatchable, dropping it");
                }
            }
        }
        if dropped {
            self.notify_changed();
        }
        if admitted.is_empty() {
            return;
        }

        let hook = self.done_hook();
        for (job, token) in admitted {
            job.invoke(token, self.grace_period, &self.spawner, &hook);
        }
    }

    fn done_hook(self: &Arc<Self>) -> DoneHook {
        let shared = Arc::clone(self);
        Arc::new(move |job: &Arc<Job>| shared.on_job_done(job))
    }

    /// Done hook: release the slot, then dispatch.
    fn on_job_done(self: &Arc<Self>, job: &Arc<Job>) {
        let id = job.id();
        let state = job.state();
        let abandoned = job.was_abandoned();
        let error = job.error();

        let action = match state {
            JobState::TimedOut if abandoned => AuditAction::Abandoned,
            JobState::TimedOut => AuditAction::TimedOut,
            JobState::Failed => AuditAction::Failed,
            _ => AuditAction::Completed,
        };

        // Counters and audit are updated with the lock held so that a waiter
        // observing the drained state also observes this job's outcome.
        {
            let mut st = self.state.lock();
            if st.running.remove(&id).is_some() {
                st.outstanding = st.outstanding.saturating_sub(1);
            } else {
                debug!(job_id = id, "completed job was no longer tracked as running");
            }
            self.counters.record_outcome(state);
            if abandoned {
                self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            }
            self.audit(id, action, error.as_ref().map(ToString::to_string));
        }

        match &error {
            Some(e) => warn!(job_id = id, error = %e, "job failed"),
            None => debug!(job_id = id, %state, "job finished"),
        }
        self.notify_changed();

        // The released slot must be visible before re-dispatching, or the
        // next dispatch can miss it and leave queued jobs stranded.
        self.dispatch();
    }

    fn notify_changed(&self) {
        self.changed.notify_all();
        self.changed_async.notify_waiters();
    }

    /// Block until `pred` holds or `deadline` passes. Returns whether `pred` held.
    fn wait_blocking<P>(&self, pred: P, deadline: Option<Instant>) -> bool
    where
        P: Fn(&SchedulerState) -> bool,
    {
        let mut st = self.state.lock();
        while !pred(&*st) {
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut st, deadline).timed_out() {
                        return pred(&*st);
                    }
                }
                None => self.changed.wait(&mut st),
            }
        }
        true
    }

    async fn wait_async<P>(&self, pred: P)
    where
        P: Fn(&SchedulerState) -> bool,
    {
        loop {
            let notified = self.changed_async.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let done = {
                let st = self.state.lock();
                pred(&*st)
            };
            if done {
                return;
            }
            notified.await;
        }
    }

    /// Enter `Stopping`. Returns `false` if already `Stopped`.
    fn begin_stopping(&self, operation: &'static str) -> bool {
        let mut st = self.state.lock();
        match st.phase {
            SchedulerPhase::Active => {
                st.phase = SchedulerPhase::Stopping;
                info!(
                    operation,
                    running = st.running.len(),
                    queued = self.queue.len(),
                    "scheduler stopping"
                );
                true
            }
            SchedulerPhase::Stopping => true,
            SchedulerPhase::Stopped => {
                debug!(operation, "scheduler already stopped");
                false
            }
        }
    }

    fn finish_stopping(&self) {
        {
            let mut st = self.state.lock();
            if st.phase != SchedulerPhase::Stopping {
                return;
            }
            st.phase = SchedulerPhase::Stopped;
            info!(queued = self.queue.len(), "scheduler stopped");
        }
        self.notify_changed();
    }

    /// Signal cancellation to every running job via the activation's root token.
    fn cancel_running(&self, timeout: Duration) {
        let st = self.state.lock();
        info!(
            running = st.running.len(),
            ?timeout,
            "forced shutdown, cancelling running jobs"
        );
        st.root.cancel();
    }

    /// Stop waiting for every running job. Their callbacks may keep running.
    fn abandon_running(self: &Arc<Self>, reason: &'static str) {
        let mut jobs: Vec<Arc<Job>> = {
            let st = self.state.lock();
            st.running.values().cloned().collect()
        };
        jobs.sort_by_key(|job| job.id());
        for job in jobs {
            if job.force_complete() {
                warn!(
                    job_id = job.id(),
                    reason, "abandoning job that did not finish; its callback may still be running"
                );
                self.on_job_done(&job);
            }
        }
    }

    fn reset(self: &Arc<Self>, keep_pending: bool) -> Result<(), SchedulerError> {
        let (discarded, stale) = {
            let mut st = self.state.lock();
            if st.phase != SchedulerPhase::Stopped {
                return Err(SchedulerError::InvalidState {
                    operation: "reset",
                    phase: st.phase,
                });
            }
            let discarded = if keep_pending {
                Vec::new()
            } else {
                self.queue.clear()
            };
            let stale: Vec<Arc<Job>> = st.running.drain().map(|(_, job)| job).collect();
            st.outstanding = st
                .outstanding
                .saturating_sub(discarded.len() + stale.len());
            for handle in &discarded {
                if handle.job().fail_unstarted(JobError::Discarded) {
                    self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                    self.audit(handle.id(), AuditAction::Discarded, None);
                }
            }
            st.root = new_root(self.parent.as_ref());
            st.phase = SchedulerPhase::Active;
            (discarded, stale)
        };

        for job in &stale {
            if job.force_complete() {
                warn!(job_id = job.id(), "reset released a job that was still tracked as running");
            }
        }
        self.notify_changed();
        info!(
            keep_pending,
            queued = self.queue.len(),
            discarded = discarded.len(),
            "scheduler reset"
        );

        self.dispatch();
        Ok(())
    }

    fn audit(&self, job_id: JobId, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(job_id, action, detail));
        }
    }
}

fn new_root(parent: Option<&CancellationToken>) -> CancellationToken {
    parent.map_or_else(CancellationToken::new, CancellationToken::child_token)
}
