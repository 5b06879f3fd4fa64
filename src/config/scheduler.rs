//! Scheduler configuration structure.
//!
//! Values can come from JSON, from the environment (with `.env` support via
//! `dotenvy`), or from code through the `with_*` methods.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SchedulerLimits;
use crate::util::clock::millis_opt;

/// Environment variable overriding `concurrency_limit`.
pub const ENV_CONCURRENCY_LIMIT: &str = "SCHEDULER_CONCURRENCY_LIMIT";
/// Environment variable overriding `shutdown_timeout_ms`.
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "SCHEDULER_SHUTDOWN_TIMEOUT_MS";
/// Environment variable overriding `grace_period_ms`.
pub const ENV_GRACE_PERIOD_MS: &str = "SCHEDULER_GRACE_PERIOD_MS";
/// Environment variable overriding `default_job_timeout_ms`.
pub const ENV_DEFAULT_JOB_TIMEOUT_MS: &str = "SCHEDULER_DEFAULT_JOB_TIMEOUT_MS";

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of concurrently running jobs.
    pub concurrency_limit: usize,
    /// Bound on a graceful stop before running jobs are abandoned, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Time a timed-out job gets to observe cancellation, in milliseconds.
    pub grace_period_ms: u64,
    /// Timeout for jobs submitted without one, in milliseconds. `None` or 0 disables it.
    pub default_job_timeout_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: num_cpus::get(),
            shutdown_timeout_ms: 30_000,
            grace_period_ms: 1_000,
            default_job_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Set the concurrency limit.
    #[must_use]
    pub const fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set the graceful stop timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the grace period granted to timed-out jobs.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = grace.as_millis() as u64;
        self
    }

    /// Set the default job timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_default_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_job_timeout_ms = match timeout {
            Some(t) => Some(t.as_millis() as u64),
            None => None,
        };
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency_limit == 0 {
            return Err("concurrency_limit must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns a message if the JSON is malformed or a value is invalid.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from defaults overridden by `SCHEDULER_*`
    /// environment variables. A `.env` file in the working directory is
    /// loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns a message if a variable is not a valid number or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        let cfg = Self::default().with_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_CONCURRENCY_LIMIT)? {
            self.concurrency_limit = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SHUTDOWN_TIMEOUT_MS)? {
            self.shutdown_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_GRACE_PERIOD_MS)? {
            self.grace_period_ms = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, ENV_DEFAULT_JOB_TIMEOUT_MS)? {
            self.default_job_timeout_ms = Some(v).filter(|ms| *ms > 0);
        }
        Ok(self)
    }

    /// Convert to the limits the scheduler runs with.
    #[must_use]
    pub fn to_limits(&self) -> SchedulerLimits {
        SchedulerLimits {
            concurrency_limit: self.concurrency_limit,
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            grace_period: Duration::from_millis(self.grace_period_ms),
            default_job_timeout: millis_opt(self.default_job_timeout_ms),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}")),
    }
}
