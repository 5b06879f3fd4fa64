//! Builder wiring configuration, queue, audit sink and parent token into a
//! [`Scheduler`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, JobQueue, Scheduler, SchedulerError, Spawn};
use crate::infra::InMemoryQueue;

/// Step-by-step scheduler construction.
///
/// ```rust,ignore
/// let audit = InMemoryAuditSink::new(1024);
/// let scheduler = SchedulerBuilder::new(SchedulerConfig::default().with_concurrency_limit(4))
///     .audit(Arc::new(audit.clone()))
///     .parent_token(app_token.clone())
///     .build(TokioSpawner::current())?;
/// ```
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    queue: Option<Box<dyn JobQueue>>,
    audit: Option<Arc<dyn AuditSink>>,
    parent: Option<CancellationToken>,
}

impl SchedulerBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queue: None,
            audit: None,
            parent: None,
        }
    }

    /// Use a custom pending-job queue instead of [`InMemoryQueue`].
    #[must_use]
    pub fn queue(mut self, queue: Box<dyn JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Report job lifecycle events to `sink`.
    #[must_use]
    pub fn audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Derive every job token from `parent`, so cancelling it cancels all jobs.
    #[must_use]
    pub fn parent_token(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Build the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration is invalid.
    pub fn build<S>(self, spawner: S) -> Result<Scheduler<S>, SchedulerError>
    where
        S: Spawn + Send + Sync + 'static,
    {
        self.config
            .validate()
            .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;
        let queue = self
            .queue
            .unwrap_or_else(|| Box::new(InMemoryQueue::new()));
        Scheduler::from_parts(self.config.to_limits(), queue, spawner, self.audit, self.parent)
    }
}

/// Build a scheduler with an in-memory queue from configuration.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] if the configuration is invalid.
pub fn build_scheduler<S>(cfg: &SchedulerConfig, spawner: S) -> Result<Scheduler<S>, SchedulerError>
where
    S: Spawn + Send + Sync + 'static,
{
    SchedulerBuilder::new(cfg.clone()).build(spawner)
}

impl<S> Scheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Create a scheduler from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration is invalid.
    pub fn from_config(cfg: &SchedulerConfig, spawner: S) -> Result<Self, SchedulerError> {
        build_scheduler(cfg, spawner)
    }
}
