//! Tests for configuration validation

use std::time::Duration;

use bounded_scheduler::config::SchedulerConfig;

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.concurrency_limit, num_cpus::get());
    assert_eq!(cfg.shutdown_timeout_ms, 30_000);
    assert_eq!(cfg.grace_period_ms, 1_000);
    assert_eq!(cfg.default_job_timeout_ms, None);
}

#[test]
fn test_config_invalid_concurrency_limit() {
    let invalid = SchedulerConfig::default().with_concurrency_limit(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "concurrency_limit": 4,
        "shutdown_timeout_ms": 500,
        "default_job_timeout_ms": 2000
    }"#;

    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.concurrency_limit, 4);
    assert_eq!(cfg.shutdown_timeout_ms, 500);
    assert_eq!(cfg.grace_period_ms, 1_000);
    assert_eq!(cfg.default_job_timeout_ms, Some(2000));
}

#[test]
fn test_config_from_json_rejects_zero_limit() {
    let err = SchedulerConfig::from_json_str(r#"{"concurrency_limit": 0}"#).unwrap_err();
    assert!(err.contains("concurrency_limit"));
}

#[test]
fn test_config_from_invalid_json() {
    let err = SchedulerConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_config_to_limits() {
    let cfg = SchedulerConfig::default()
        .with_concurrency_limit(2)
        .with_shutdown_timeout(Duration::from_millis(750))
        .with_grace_period(Duration::from_millis(50))
        .with_default_job_timeout(Some(Duration::from_secs(3)));

    let limits = cfg.to_limits();
    assert_eq!(limits.concurrency_limit, 2);
    assert_eq!(limits.shutdown_timeout, Duration::from_millis(750));
    assert_eq!(limits.grace_period, Duration::from_millis(50));
    assert_eq!(limits.default_job_timeout, Some(Duration::from_secs(3)));
}

#[test]
fn test_zero_default_job_timeout_means_none() {
    let cfg = SchedulerConfig {
        default_job_timeout_ms: Some(0),
        ..SchedulerConfig::default()
    };
    assert_eq!(cfg.to_limits().default_job_timeout, None);
}
