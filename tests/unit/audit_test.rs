//! Tests for audit sink

use bounded_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(1, AuditAction::Submitted, Some("payload".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].job_id, 1);
    assert_eq!(events[0].action, AuditAction::Submitted);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, AuditAction::Submitted, None));
    sink.record(build_audit_event(2, AuditAction::Submitted, None));
    sink.record(build_audit_event(3, AuditAction::Submitted, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id, 2); // First one popped
    assert_eq!(events[1].job_id, 3);
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(7, AuditAction::Failed, Some("job failed: boom".to_string()));

    assert_eq!(event.job_id, 7);
    assert_eq!(event.action, AuditAction::Failed);
    assert_eq!(event.detail, Some("job failed: boom".to_string()));
    assert!(event.created_at_ms > 0);
    assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
}

#[test]
fn test_audit_action_serializes_snake_case() {
    let json = serde_json::to_string(&AuditAction::TimedOut).unwrap();
    assert_eq!(json, "\"timed_out\"");
    assert_eq!(AuditAction::TimedOut.to_string(), "timed_out");
}
