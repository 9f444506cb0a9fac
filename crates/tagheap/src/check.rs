//! Block-sequence consistency checker.
//!
//! [`verify`] walks a heap's block sequence and confirms every
//! structural invariant the allocator maintains: intact sentinels,
//! matching header/footer tags, aligned gap-free blocks, an epilogue
//! at the break, and no two adjacent free blocks. Tests call it after
//! every mutation; it is also the first tool to reach for when a heap
//! misbehaves.

use crate::error::HeapError;
use crate::heap::Heap;
use crate::tag::{self, ALIGN, MIN_BLOCK, OVERHEAD, WORD};

/// Verify the heap's structural invariants.
///
/// Returns the first violation found as a
/// [`HeapError::CorruptedBlock`] naming the offending offset.
pub fn verify(heap: &Heap) -> Result<(), HeapError> {
    let arena = heap.arena();
    let base = heap.base();
    let corrupted = |offset, reason| Err(HeapError::CorruptedBlock { offset, reason });

    // Prologue: zero-payload allocated sentinel.
    let prologue_header = tag::unpack(arena.read_word(base - WORD));
    let prologue_footer = tag::unpack(arena.read_word(base));
    if prologue_header != (OVERHEAD, true) || prologue_footer != (OVERHEAD, true) {
        return corrupted(base, "prologue sentinel damaged");
    }

    let mut bp = base + OVERHEAD;
    let mut prev_free = false;
    loop {
        let (size, allocated) = tag::unpack(arena.read_word(bp - WORD));
        if size == 0 {
            // Epilogue: allocated, and flush against the break.
            if !allocated {
                return corrupted(bp, "epilogue not marked allocated");
            }
            if bp != arena.brk() {
                return corrupted(bp, "epilogue not at the break");
            }
            return Ok(());
        }

        if size % ALIGN != 0 {
            return corrupted(bp, "block size not aligned");
        }
        if size < MIN_BLOCK {
            return corrupted(bp, "block below minimum size");
        }
        if bp + size > arena.brk() {
            return corrupted(bp, "block extends past the break");
        }
        let footer = tag::unpack(arena.read_word(bp + size - OVERHEAD));
        if footer != (size, allocated) {
            return corrupted(bp, "header and footer disagree");
        }
        if prev_free && !allocated {
            return corrupted(bp, "two adjacent free blocks (missed coalesce)");
        }

        prev_free = !allocated;
        bp += size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeapConfig;

    #[test]
    fn fresh_heap_verifies() {
        let heap = Heap::new(HeapConfig::new(4096).chunk(1024)).unwrap();
        verify(&heap).unwrap();
    }

    #[test]
    fn verifies_through_a_working_session() {
        let mut heap = Heap::new(HeapConfig::new(1 << 16)).unwrap();
        let a = heap.allocate(100).unwrap();
        let b = heap.allocate(200).unwrap();
        verify(&heap).unwrap();
        heap.release(a).unwrap();
        verify(&heap).unwrap();
        heap.release(b).unwrap();
        verify(&heap).unwrap();
    }

    #[test]
    fn detects_an_overwritten_header() {
        let mut heap = Heap::new(HeapConfig::new(4096).chunk(1024)).unwrap();
        let a = heap.allocate(8).unwrap();
        // Simulate a buffer overrun clobbering the header: the recorded
        // size no longer lands on the real footer.
        let bp = a.offset();
        corrupt_word(&mut heap, bp - WORD, tag::pack(64, true));
        let err = verify(&heap).unwrap_err();
        assert!(matches!(err, HeapError::CorruptedBlock { .. }));
    }

    #[test]
    fn detects_adjacent_free_blocks() {
        let mut heap = Heap::new(HeapConfig::new(4096).chunk(1024)).unwrap();
        let a = heap.allocate(8).unwrap();
        let _b = heap.allocate(8).unwrap();
        // Hand-flip a to free without coalescing: legal tags, illegal
        // sequence only once its free neighbour appears.
        let bp = a.offset();
        let (size, _) = tag::unpack(heap.arena().read_word(bp - WORD));
        corrupt_word(&mut heap, bp - WORD, tag::pack(size, false));
        corrupt_word(&mut heap, bp + size - OVERHEAD, tag::pack(size, false));
        verify(&heap).unwrap(); // free/allocated alternation intact

        // Free the following block the same way: now two adjacent
        // frees exist and the checker must object.
        let next = bp + size;
        let (next_size, _) = tag::unpack(heap.arena().read_word(next - WORD));
        corrupt_word(&mut heap, next - WORD, tag::pack(next_size, false));
        corrupt_word(
            &mut heap,
            next + next_size - OVERHEAD,
            tag::pack(next_size, false),
        );
        let err = verify(&heap).unwrap_err();
        assert_eq!(
            err,
            HeapError::CorruptedBlock {
                offset: a.offset() + size,
                reason: "two adjacent free blocks (missed coalesce)",
            }
        );
    }

    /// Tests-only backdoor for damaging tag words in place.
    fn corrupt_word(heap: &mut Heap, offset: usize, word: u64) {
        heap.arena_mut()
            .bytes_mut(offset, WORD)
            .copy_from_slice(&word.to_le_bytes());
    }
}
