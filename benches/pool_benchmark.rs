use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use workers::WorkerPool;

// submit throughput at several pool sizes
pub fn submit_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_bench");
    for size in [1, 2, 4, 8].iter() {
        group.bench_with_input(BenchmarkId::new("workers", size), size, |b, &size| {
            b.iter(|| {
                let pool = WorkerPool::new(size);
                pool.start().unwrap();
                let counter = Arc::new(AtomicUsize::new(0));
                for _ in 0..1000 {
                    let counter = Arc::clone(&counter);
                    pool.submit(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .unwrap();
                }
                pool.stop();
                pool.join().unwrap();
                assert_eq!(counter.load(Ordering::Relaxed), 1000);
            })
        });
    }
    group.finish();
}

pub fn deferred_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_bench");
    group.bench_with_input(BenchmarkId::new("workers", 4), &100, |b, &timers| {
        b.iter(|| {
            let pool = WorkerPool::new(4);
            pool.start().unwrap();
            for _ in 0..timers {
                pool.submit_after(|| {}, Duration::from_millis(1)).unwrap();
            }
            pool.stop();
            pool.join().unwrap();
        })
    });
    group.finish();
}

criterion_group!(benches, submit_bench, deferred_bench);
criterion_main!(benches);
