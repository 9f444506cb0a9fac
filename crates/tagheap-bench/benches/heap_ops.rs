//! Criterion micro-benchmarks for allocate, release, and first-fit scan.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagheap::{Allocation, Heap, HeapConfig};
use tagheap_bench::{churn_trace, fragmented_heap, ChurnOp};

/// First-fit cost when every free block but the last is too small:
/// the scan has to walk the whole block sequence.
fn bench_first_fit_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_fit_scan");
    for pairs in [16usize, 128, 1024] {
        group.bench_function(format!("{pairs}_pairs"), |b| {
            b.iter_batched(
                || fragmented_heap(pairs, 256),
                |mut heap| {
                    let a = heap.allocate(black_box(256)).unwrap();
                    black_box(a);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Apply a churn trace: allocate on `(size, false)`, release a live
/// handle on `(size, true)`.
fn apply_churn(heap: &mut Heap, ops: &[ChurnOp]) -> usize {
    let mut live: Vec<Allocation> = Vec::new();
    for &(size, release) in ops {
        if release && !live.is_empty() {
            let victim = live.swap_remove(size % live.len());
            heap.release(victim).unwrap();
        } else {
            live.push(heap.allocate(size).unwrap());
        }
    }
    live.len()
}

/// Allocate/release churn over a seeded random trace, the common
/// steady-state workload.
fn bench_churn(c: &mut Criterion) {
    let ops = churn_trace(42, 512, 256);

    c.bench_function("churn_512_ops", |b| {
        b.iter_batched(
            || Heap::new(HeapConfig::new(1 << 24)).unwrap(),
            |mut heap| {
                black_box(apply_churn(&mut heap, &ops));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

/// Release with full three-way coalescing on every call.
fn bench_coalesce(c: &mut Criterion) {
    c.bench_function("release_coalesce_both", |b| {
        b.iter_batched(
            || {
                let mut heap = Heap::new(HeapConfig::new(1 << 20)).unwrap();
                let a = heap.allocate(64).unwrap();
                let m = heap.allocate(64).unwrap();
                let z = heap.allocate(64).unwrap();
                heap.release(a).unwrap();
                heap.release(z).unwrap();
                (heap, m)
            },
            |(mut heap, m)| {
                heap.release(m).unwrap();
                black_box(heap.block_count());
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_first_fit_scan, bench_churn, bench_coalesce);
criterion_main!(benches);
