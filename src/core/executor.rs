//! Job body abstractions: what a job runs and how its outcome is interpreted.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::JobError;

/// Output types a job callback may produce.
///
/// `()` always counts as success. `Result<(), E>` maps `Err` to
/// [`JobError::Failed`] using the error's `Display` text.
pub trait JobOutput: Send + 'static {
    /// Convert the callback output into the job's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Failed`] when the callback reported an error.
    fn into_job_result(self) -> Result<(), JobError>;
}

impl JobOutput for () {
    fn into_job_result(self) -> Result<(), JobError> {
        Ok(())
    }
}

impl<E> JobOutput for Result<(), E>
where
    E: fmt::Display + Send + 'static,
{
    fn into_job_result(self) -> Result<(), JobError> {
        self.map_err(|e| JobError::Failed(e.to_string()))
    }
}

/// A named unit of work that can be submitted to a scheduler.
///
/// Implement this for job types that carry their own state instead of
/// capturing it in a closure.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use bounded_scheduler::core::JobTask;
/// use tokio_util::sync::CancellationToken;
///
/// struct Reindex {
///     shard: u32,
/// }
///
/// #[async_trait]
/// impl JobTask for Reindex {
///     async fn run(self, token: CancellationToken) -> anyhow::Result<()> {
///         while !token.is_cancelled() {
///             // process a batch of shard `self.shard`...
///             break;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait JobTask: Send + 'static {
    /// Run the job. Implementations should observe `token` and return early
    /// once it is cancelled.
    async fn run(self, token: CancellationToken) -> anyhow::Result<()>;
}

/// Type-erased future produced by a job body.
pub(crate) type JobFuture = BoxFuture<'static, Result<(), JobError>>;

/// Type-erased job body: called once with the job's cancellation token.
pub(crate) type JobBody = Box<dyn FnOnce(CancellationToken) -> JobFuture + Send>;

/// Box a closure callback. The closure itself runs on first poll, so a
/// panicking closure is captured like a panicking future.
pub(crate) fn closure_body<F, Fut>(f: F) -> JobBody
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: JobOutput,
{
    Box::new(move |token: CancellationToken| async move { f(token).await.into_job_result() }.boxed())
}

/// Box a [`JobTask`] implementation.
pub(crate) fn task_body<T>(task: T) -> JobBody
where
    T: JobTask,
{
    Box::new(move |token: CancellationToken| async move { task.run(token).await.into_job_result() }.boxed())
}
