//! Tests for utility functions

use std::time::Duration;

use bounded_scheduler::util::{init_test_tracing, init_tracing, millis_opt, now_ms};

#[test]
fn test_now_ms() {
    let before = now_ms();
    std::thread::sleep(Duration::from_millis(2));
    assert!(now_ms() > before);
}

#[test]
fn test_millis_opt() {
    assert_eq!(millis_opt(Some(1500)), Some(Duration::from_millis(1500)));
    assert_eq!(millis_opt(Some(0)), None);
    assert_eq!(millis_opt(None), None);
}

#[test]
fn test_tracing_init_is_idempotent() {
    init_tracing();
    init_test_tracing();
    init_test_tracing();
    tracing::info!(limit = 4, "tracing installed");
}
