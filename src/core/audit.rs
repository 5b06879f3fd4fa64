//! Audit sink implementations.
//!
//! The scheduler reports every job lifecycle transition to an optional
//! [`AuditSink`]. The in-memory sink keeps a bounded ring for tests and
//! local inspection.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::JobId;
use crate::util::clock::now_ms;

/// Lifecycle transition recorded for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Accepted into the queue.
    Submitted,
    /// Refused because the scheduler was not active.
    Rejected,
    /// Dispatched into a running slot.
    Started,
    /// Callback returned normally.
    Completed,
    /// Callback panicked or returned an error.
    Failed,
    /// Ended by its timeout.
    TimedOut,
    /// Released by a stop or shutdown while still running.
    Abandoned,
    /// Dropped from the queue by a reset.
    Discarded,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Rejected => "rejected",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Abandoned => "abandoned",
            Self::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related job identifier.
    pub job_id: JobId,
    /// Transition that happened.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, e.g. a failure message.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
///
/// `record` may be called while the scheduler lock is held, from both caller
/// threads and job tasks. Implementations must be cheap and must never call
/// back into the scheduler.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
///
/// Clones share the same buffer, so a test can keep one clone and hand the
/// other to the scheduler.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one job, oldest first.
    #[must_use]
    pub fn actions_for(&self, job_id: JobId) -> Vec<AuditAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.job_id == job_id)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    job_id: JobId,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        job_id,
        action,
        created_at_ms: now_ms(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_is_bounded() {
        let sink = InMemoryAuditSink::new(2);
        sink.record(build_audit_event(1, AuditAction::Submitted, None));
        sink.record(build_audit_event(1, AuditAction::Started, None));
        sink.record(build_audit_event(1, AuditAction::Completed, None));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::Started);
        assert_eq!(events[1].action, AuditAction::Completed);
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = InMemoryAuditSink::new(8);
        let observer = sink.clone();
        sink.record(build_audit_event(7, AuditAction::Failed, Some("boom".into())));
        assert_eq!(observer.actions_for(7), vec![AuditAction::Failed]);
        assert_eq!(observer.events()[0].detail.as_deref(), Some("boom"));
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = build_audit_event(1, AuditAction::Submitted, None);
        let b = build_audit_event(1, AuditAction::Submitted, None);
        assert_ne!(a.event_id, b.event_id);
    }
}
