//! # Bounded Scheduler
//!
//! A bounded-concurrency job scheduler for async workloads running on tokio.
//!
//! The scheduler accepts units of asynchronous work ("jobs"), runs at most *N*
//! of them at once, and admits queued jobs in FIFO order whenever a slot frees
//! up. Jobs receive a cooperative cancellation token; the scheduler enforces
//! per-job timeouts, captures panics, and offers two shutdown protocols.
//!
//! ## Key Features
//!
//! - **Bounded concurrency**: never more than `concurrency_limit` jobs run at once
//! - **FIFO admission**: queued jobs start in submission order
//! - **Timeouts with abandonment**: a job that overruns its timeout plus a grace
//!   period is marked `TimedOut` and its slot is reclaimed, even if its code keeps running
//! - **Panic containment**: a panicking job ends `Failed` and never takes the scheduler down
//! - **Graceful stop**: stop dispatching, let running jobs finish (bounded by a watchdog)
//! - **Forced shutdown**: cancel every running job and abandon stragglers after a timeout
//! - **Reset**: reactivate a stopped scheduler, keeping or discarding pending jobs
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use bounded_scheduler::core::Scheduler;
//! use bounded_scheduler::runtime::TokioSpawner;
//!
//! let scheduler = Scheduler::new(2, Duration::from_secs(5), TokioSpawner::current())?;
//!
//! let handle = scheduler.submit(|token| async move {
//!     tokio::select! {
//!         _ = token.cancelled() => {}
//!         _ = tokio::time::sleep(Duration::from_millis(100)) => {}
//!     }
//! });
//!
//! scheduler.wait_async().await;
//! assert!(handle.is_complete());
//!
//! scheduler.shutdown_async(Duration::from_secs(1)).await;
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs` and `tests/shutdown_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: jobs, handles, the scheduler state machine.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure adapters for pending-job queues.
pub mod infra;
/// Runtime adapters (tokio spawner, process signals).
pub mod runtime;
/// Shared utilities.
pub mod util;
