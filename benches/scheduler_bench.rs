//! Benchmarks for the bounded scheduler.
//!
//! Benchmarks cover:
//! - Submit-and-drain throughput across concurrency limits
//! - Queue build-up behind a saturated scheduler
//! - Forced shutdown with a deep pending queue

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use bounded_scheduler::core::Scheduler;
use bounded_scheduler::runtime::TokioSpawner;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn scheduler(limit: usize) -> Scheduler {
    Scheduler::new(limit, Duration::from_secs(5), TokioSpawner::current()).unwrap()
}

// ============================================================================
// Throughput Benchmarks
// ============================================================================

fn bench_submit_and_drain(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("submit_and_drain");

    for limit in [1_usize, 4, 16] {
        let jobs = 1_000_u64;
        group.throughput(Throughput::Elements(jobs));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.to_async(&rt).iter(|| async move {
                let s = scheduler(limit);
                for i in 0..jobs {
                    s.submit(move |_token| async move {
                        black_box(i);
                    });
                }
                s.wait_async().await;
                black_box(s.stats());
            });
        });
    }
    group.finish();
}

fn bench_submit_with_timeouts(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("submit_with_timeouts");
    let jobs = 1_000_u64;
    group.throughput(Throughput::Elements(jobs));

    group.bench_function("timeout_watchdogs", |b| {
        b.to_async(&rt).iter(|| async move {
            let s = scheduler(8);
            for i in 0..jobs {
                s.submit_with_timeout(
                    move |_token| async move {
                        black_box(i);
                    },
                    Duration::from_secs(1),
                );
            }
            s.wait_async().await;
        });
    });
    group.finish();
}

// ============================================================================
// Queueing Benchmarks
// ============================================================================

fn bench_queue_behind_saturated_scheduler(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("queue_behind_saturated_scheduler");

    for depth in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(depth));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.to_async(&rt).iter(|| async move {
                let s = scheduler(1);
                let gate = CancellationToken::new();
                let blocker = gate.clone();
                s.submit(move |_token| async move { blocker.cancelled().await });
                for _ in 0..depth {
                    s.submit(|_token| async {});
                }
                black_box(s.queued_jobs().len());
                gate.cancel();
                s.wait_async().await;
            });
        });
    }
    group.finish();
}

fn bench_forced_shutdown(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("forced_shutdown");

    for running in [4_usize, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(running), &running, |b, &running| {
            b.to_async(&rt).iter(|| async move {
                let s = scheduler(running);
                for _ in 0..running * 4 {
                    s.submit(|token| async move { token.cancelled().await });
                }
                s.shutdown_async(Duration::from_secs(1)).await;
                black_box(s.phase());
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    throughput_benches,
    bench_submit_and_drain,
    bench_submit_with_timeouts
);

criterion_group!(
    queue_benches,
    bench_queue_behind_saturated_scheduler,
    bench_forced_shutdown
);

criterion_main!(throughput_benches, queue_benches);
