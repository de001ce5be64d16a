//! Benchmark: bulk and per-reference operation throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::thread;

use static_set::StaticSet;

const SMALL_OPS: usize = 1_000;
const MEDIUM_OPS: usize = 10_000;
const LARGE_OPS: usize = 100_000;

const THREAD_COUNTS: &[usize] = &[1, 2, 4, 8];

/// Benchmark: bulk insert at 50% target load
fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_insert");

    for &size in &[SMALL_OPS, MEDIUM_OPS, LARGE_OPS] {
        group.throughput(Throughput::Elements(size as u64));
        let keys: Vec<u64> = (1..=size as u64).collect();

        group.bench_with_input(BenchmarkId::new("static-set", size), &size, |b, &size| {
            b.iter(|| {
                let set = StaticSet::<u64, _, _, 2>::new(size * 2, u64::MAX).unwrap();
                set.insert(black_box(&keys)).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark: bulk contains over a fully resident key set
fn bench_bulk_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_contains");

    for &size in &[SMALL_OPS, MEDIUM_OPS, LARGE_OPS] {
        group.throughput(Throughput::Elements(size as u64));
        let keys: Vec<u64> = (1..=size as u64).collect();

        group.bench_with_input(BenchmarkId::new("static-set", size), &size, |b, _| {
            let set = StaticSet::<u64, _, _, 2>::new(size * 2, u64::MAX).unwrap();
            set.insert(&keys).unwrap();
            let mut output = vec![false; keys.len()];
            b.iter(|| {
                set.contains(black_box(&keys), &mut output).unwrap();
                output.iter().filter(|&&found| found).count()
            });
        });
    }

    group.finish();
}

/// Benchmark: threads driving inserts through copies of one reference
fn bench_concurrent_ref_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_ref_insert");
    group.sample_size(20);

    for &threads in THREAD_COUNTS {
        let ops_per_thread = MEDIUM_OPS / threads;
        let total_ops = ops_per_thread * threads;
        group.throughput(Throughput::Elements(total_ops as u64));

        group.bench_with_input(
            BenchmarkId::new("static-set", threads),
            &(threads, ops_per_thread),
            |b, &(threads, ops)| {
                b.iter(|| {
                    let set = StaticSet::<u64, _, _, 2>::new(total_ops * 2, u64::MAX).unwrap();
                    let set_ref = set.as_ref();
                    thread::scope(|s| {
                        for tid in 0..threads {
                            s.spawn(move || {
                                for i in 0..ops {
                                    let key = (tid * ops + i + 1) as u64;
                                    set_ref.insert(black_box(key));
                                }
                            });
                        }
                    });
                    set.len()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bulk_insert,
    bench_bulk_contains,
    bench_concurrent_ref_insert,
);

criterion_main!(benches);
