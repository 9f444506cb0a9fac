//! Deterministic workload generation for the tagheap benchmarks.
//!
//! Uses a seeded ChaCha8 RNG so runs are reproducible across machines
//! and bench comparisons are meaningful.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use tagheap::{Allocation, Heap, HeapConfig};

/// One step of a generated workload: `(size, release)`.
///
/// `release == false` allocates `size` payload bytes; `release == true`
/// releases the `size`-th live allocation (modulo the live count).
pub type ChurnOp = (usize, bool);

/// Generate a reproducible allocate/release churn trace.
///
/// Roughly 40% of steps are releases, so the live set grows over the
/// trace and both the scan and coalesce paths stay busy.
pub fn churn_trace(seed: u64, len: usize, max_size: usize) -> Vec<ChurnOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            let size = rng.random_range(1..max_size);
            let release = rng.random_range(0..10) < 4;
            (size, release)
        })
        .collect()
}

/// Build a heap whose free list is fragmented: `pairs` adjacent
/// (allocated, free) block pairs, all free blocks one unit too small
/// for the probe size, so a first-fit scan for `probe_size` walks the
/// whole sequence.
pub fn fragmented_heap(pairs: usize, probe_size: usize) -> Heap {
    let hole = probe_size.saturating_sub(16).max(1);
    let mut heap = Heap::new(HeapConfig::new(1 << 24)).expect("bench heap fits");
    let mut holes: Vec<Allocation> = Vec::with_capacity(pairs);
    for _ in 0..pairs {
        let _pin = heap.allocate(probe_size).expect("bench heap fits");
        holes.push(heap.allocate(hole).expect("bench heap fits"));
    }
    for h in holes {
        heap.release(h).expect("live handle");
    }
    heap
}
