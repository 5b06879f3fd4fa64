//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use bounded_scheduler::builders::{build_scheduler, SchedulerBuilder};
use bounded_scheduler::config::SchedulerConfig;
use bounded_scheduler::core::{AuditAction, InMemoryAuditSink, JobState, Scheduler, SchedulerError};
use bounded_scheduler::infra::InMemoryQueue;
use bounded_scheduler::runtime::TokioSpawner;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_build_scheduler_from_config() {
    let cfg = SchedulerConfig::default().with_concurrency_limit(3);
    let scheduler = build_scheduler(&cfg, TokioSpawner::current()).unwrap();
    assert_eq!(scheduler.concurrency_limit(), 3);
    assert!(scheduler.is_running());

    let from_config = Scheduler::from_config(&cfg, TokioSpawner::current()).unwrap();
    assert_eq!(from_config.concurrency_limit(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_builder_rejects_invalid_config() {
    let cfg = SchedulerConfig::default().with_concurrency_limit(0);
    let err = SchedulerBuilder::new(cfg)
        .build(TokioSpawner::current())
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_builder_wires_audit_sink() {
    let audit = InMemoryAuditSink::new(64);
    let scheduler = SchedulerBuilder::new(SchedulerConfig::default().with_concurrency_limit(1))
        .queue(Box::new(InMemoryQueue::with_capacity(8)))
        .audit(Arc::new(audit.clone()))
        .build(TokioSpawner::current())
        .unwrap();

    let handle = scheduler.submit(|_token| async {});
    handle.wait_async().await;
    scheduler.wait_async().await;

    assert_eq!(
        audit.actions_for(handle.id()),
        vec![
            AuditAction::Submitted,
            AuditAction::Started,
            AuditAction::Completed
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_builder_parent_token_cancels_jobs() {
    let parent = CancellationToken::new();
    let scheduler = SchedulerBuilder::new(SchedulerConfig::default().with_concurrency_limit(1))
        .parent_token(parent.clone())
        .build(TokioSpawner::current())
        .unwrap();

    let handle = scheduler.submit(|token| async move { token.cancelled().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(handle.is_running());

    parent.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle.wait_async())
        .await
        .unwrap();
    assert_eq!(handle.state(), JobState::Done);
}
