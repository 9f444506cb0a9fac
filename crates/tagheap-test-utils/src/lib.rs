//! Test utilities for tagheap development.
//!
//! Provides a [`LiveSet`] model of currently-live allocations, a
//! [`HeapOp`] trace vocabulary with a [`run_trace`] driver that checks
//! the allocator's observable properties after every step, and shared
//! heap fixtures so scenario tests agree on a configuration.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;
use tagheap::{check, Allocation, Heap, HeapConfig};

/// Model of the currently-live allocations, independent of the heap's
/// own bookkeeping.
///
/// Backed by an `IndexMap` keyed on payload offset, insertion-ordered
/// so trace replays are deterministic. `insert` asserts the round-trip
/// property: live payloads are pairwise non-overlapping and lie
/// entirely within the arena.
#[derive(Default)]
pub struct LiveSet {
    live: IndexMap<usize, Allocation>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh allocation, asserting it does not overlap any
    /// live payload and fits under the heap's break.
    pub fn insert(&mut self, heap: &Heap, allocation: Allocation) {
        assert!(
            allocation.offset() + allocation.len() <= heap.brk(),
            "{allocation} extends past the break {}",
            heap.brk()
        );
        for other in self.live.values() {
            let disjoint = allocation.offset() + allocation.len() <= other.offset()
                || other.offset() + other.len() <= allocation.offset();
            assert!(disjoint, "{allocation} overlaps live {other}");
        }
        let replaced = self.live.insert(allocation.offset(), allocation);
        assert!(replaced.is_none(), "offset {} reused while live", allocation.offset());
    }

    /// Forget the `index`-th live allocation (insertion order modulo
    /// the live count) and return it for release.
    pub fn take(&mut self, index: usize) -> Option<Allocation> {
        if self.live.is_empty() {
            return None;
        }
        let (_, allocation) = self.live.swap_remove_index(index % self.live.len())?;
        Some(allocation)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.live.values()
    }
}

/// One step of an allocate/release trace.
#[derive(Clone, Copy, Debug)]
pub enum HeapOp {
    /// Allocate this many payload bytes; the handle joins the live set.
    Alloc(usize),
    /// Release the n-th live allocation (modulo the live count);
    /// a no-op when nothing is live.
    Release(usize),
}

/// Apply a trace to a heap, maintaining the live-set model and
/// verifying heap invariants after every step.
///
/// Allocations that fail with `OutOfMemory` are skipped (exhaustion is
/// a legal outcome of a random trace); every other error panics.
/// Returns the final live set.
pub fn run_trace(heap: &mut Heap, ops: &[HeapOp]) -> LiveSet {
    let mut live = LiveSet::new();
    for &op in ops {
        match op {
            HeapOp::Alloc(size) => match heap.allocate(size) {
                Ok(allocation) if allocation.is_empty() => {}
                Ok(allocation) => live.insert(heap, allocation),
                Err(tagheap::HeapError::OutOfMemory { .. }) => {}
                Err(err) => panic!("allocate({size}) failed: {err}"),
            },
            HeapOp::Release(index) => {
                if let Some(allocation) = live.take(index) {
                    heap.release(allocation).unwrap();
                }
            }
        }
        check::verify(heap).unwrap();
    }
    live
}

/// 4 KiB arena with a 1 KiB chunk: the configuration the scenario
/// tests are written against.
pub fn small_heap() -> Heap {
    Heap::new(HeapConfig::new(4096).chunk(1024)).unwrap()
}

/// 64 KiB arena with a 1 KiB chunk, for traces that need headroom.
pub fn medium_heap() -> Heap {
    Heap::new(HeapConfig::new(1 << 16).chunk(1024)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_trace_maintains_the_model() {
        let mut heap = medium_heap();
        let live = run_trace(
            &mut heap,
            &[
                HeapOp::Alloc(8),
                HeapOp::Alloc(100),
                HeapOp::Release(0),
                HeapOp::Alloc(50),
                HeapOp::Release(5),
            ],
        );
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn release_on_empty_live_set_is_ignored() {
        let mut heap = small_heap();
        let live = run_trace(&mut heap, &[HeapOp::Release(0), HeapOp::Release(3)]);
        assert!(live.is_empty());
    }

    #[test]
    #[should_panic(expected = "overlaps live")]
    fn live_set_rejects_overlap() {
        let mut heap = small_heap();
        let a = heap.allocate(16).unwrap();
        let mut live = LiveSet::new();
        live.insert(&heap, a);
        live.insert(&heap, a);
    }
}
