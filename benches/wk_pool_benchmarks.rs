use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wkpool::prelude::*;

fn benchmark_pool_creation(c: &mut Criterion) {
    c.bench_function("pool_creation_and_stop", |b| {
        b.iter(|| {
            let pool = WkPool::new(4).expect("Failed to create pool");
            pool.stop().expect("Failed to stop pool");
        });
    });
}

fn benchmark_job_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_submission");

    group.bench_function("lightweight_jobs_100", |b| {
        b.iter_batched(
            || WkPool::new(4).expect("Failed to create pool"),
            |pool| {
                for _ in 0..100 {
                    pool.execute(|| {
                        black_box(1 + 1);
                    })
                    .expect("Failed to submit job");
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("panicking_jobs_100", |b| {
        b.iter_batched(
            || WkPool::new(4).expect("Failed to create pool"),
            |pool| {
                for _ in 0..100 {
                    pool.execute(|| panic!("benchmark panic"))
                        .expect("Failed to submit job");
                }
                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_concurrent_submission(c: &mut Criterion) {
    c.bench_function("concurrent_submission_4_threads", |b| {
        b.iter_batched(
            || Arc::new(WkPool::new(4).expect("Failed to create pool")),
            |pool| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        std::thread::spawn(move || {
                            for _ in 0..25 {
                                pool.execute(|| {}).expect("Failed to submit job");
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().expect("Thread panicked");
                }

                pool.stop().expect("Failed to stop pool");
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("jobs_per_second", |b| {
        b.iter_batched(
            || {
                let pool = WkPool::new(8).expect("Failed to create pool");
                let counter = Arc::new(AtomicU64::new(0));
                (pool, counter)
            },
            |(pool, counter)| {
                for _ in 0..1000 {
                    let counter = Arc::clone(&counter);
                    pool.execute(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .expect("Failed to submit job");
                }

                pool.stop().expect("Failed to stop pool");
                assert_eq!(counter.load(Ordering::Relaxed), 1000, "Not all jobs completed");
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_pool_creation,
    benchmark_job_submission,
    benchmark_concurrent_submission,
    benchmark_throughput
);
criterion_main!(benches);
