//! Configuration models for scheduler limits and timeouts.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
