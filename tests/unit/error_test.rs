//! Tests for error types

use bounded_scheduler::core::{JobError, SchedulerError, SchedulerPhase};

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("concurrency_limit must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: concurrency_limit must be greater than 0"
    );
}

#[test]
fn test_invalid_state_error() {
    let err = SchedulerError::InvalidState {
        operation: "reset",
        phase: SchedulerPhase::Stopping,
    };
    assert_eq!(format!("{}", err), "cannot reset while scheduler is stopping");
}

#[test]
fn test_panicked_error() {
    let err = JobError::Panicked("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "job panicked: index out of bounds");
}

#[test]
fn test_failed_error() {
    let err = JobError::Failed("connection refused".to_string());
    assert_eq!(format!("{}", err), "job failed: connection refused");
}

#[test]
fn test_rejected_and_discarded_errors() {
    assert_eq!(
        JobError::Rejected.to_string(),
        "job rejected: scheduler is not accepting submissions"
    );
    assert_eq!(
        JobError::Discarded.to_string(),
        "job discarded before it was dispatched"
    );
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn build() -> bounded_scheduler::core::AppResult<()> {
        Err(SchedulerError::InvalidConfig("bad".into()))?
    }
    let err = build().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
