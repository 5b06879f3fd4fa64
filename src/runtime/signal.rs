//! Stop a scheduler gracefully on SIGINT/SIGTERM or when a parent token is
//! cancelled.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::{Scheduler, Spawn};

/// Handle to a running signal listener.
#[derive(Debug)]
pub struct SignalListener {
    detach: CancellationToken,
    stopped: CancellationToken,
}

impl SignalListener {
    /// Detach the listener without stopping the scheduler.
    pub fn cancel(&self) {
        self.detach.cancel();
    }

    /// Whether the listener has stopped the scheduler.
    #[must_use]
    pub fn has_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Resolve once the listener has finished stopping the scheduler.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }
}

/// Spawn a listener that calls [`Scheduler::stop_async`] exactly once, on the
/// first SIGINT/SIGTERM (ctrl-c on non-unix targets) or when `parent` is
/// cancelled.
///
/// Must be called from within a tokio runtime.
pub fn stop_on_signal<S>(scheduler: Scheduler<S>, parent: Option<CancellationToken>) -> SignalListener
where
    S: Spawn + Send + Sync + 'static,
{
    let detach = CancellationToken::new();
    let stopped = CancellationToken::new();
    let listener = SignalListener {
        detach: detach.clone(),
        stopped: stopped.clone(),
    };
    let parent = parent.unwrap_or_default();

    tokio::spawn(async move {
        tokio::select! {
            () = detach.cancelled() => {
                info!("signal listener detached");
                return;
            }
            () = parent.cancelled() => {
                info!("parent token cancelled, stopping scheduler");
            }
            source = shutdown_signal() => {
                info!(signal = source, "received signal, stopping scheduler");
            }
        }
        scheduler.stop_async().await;
        stopped.cancel();
    });

    listener
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "failed to install signal handlers");
            return std::future::pending().await;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        return std::future::pending().await;
    }
    "ctrl-c"
}
