//! Infrastructure adapters for pending-job queues.

pub mod queue;

pub use queue::InMemoryQueue;
