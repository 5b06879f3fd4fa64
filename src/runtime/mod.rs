//! Runtime adapters: the tokio spawner and process-signal handling.

pub mod signal;
pub mod tokio_spawner;

pub use signal::{stop_on_signal, SignalListener};
pub use tokio_spawner::TokioSpawner;
