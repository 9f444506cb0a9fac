//! Boundary-tag heap over an [`Arena`].
//!
//! [`Heap`] maintains an implicit free list: a gap-free sequence of
//! variable-size blocks, each self-describing via matching header and
//! footer tags, bracketed by zero-payload allocated sentinels (the
//! prologue and epilogue) so every real block has well-defined
//! neighbours.
//!
//! ```text
//! offset 0      8        16       24           brk-8    brk
//!        ┌──────┬────────┬────────┬─── ... ───┬────────┐
//!        │ pad  │ pro hdr│ pro ftr│ real blocks│ epi hdr│
//!        └──────┴────────┴────────┴─── ... ───┴────────┘
//!                        ▲
//!                        base (prologue payload offset)
//! ```
//!
//! Placement is first-fit from the sequence head; release coalesces
//! immediately, so at every quiescent point no two adjacent blocks are
//! both free. The scan is O(blocks) by design — no index is kept.

use std::fmt;

use crate::arena::Arena;
use crate::config::HeapConfig;
use crate::error::HeapError;
use crate::tag::{self, ALIGN, MIN_BLOCK, OVERHEAD, WORD};

/// Handle for a placed payload region.
///
/// Returned by [`Heap::allocate`] and consumed by [`Heap::release`].
/// The offset is a byte index from the arena base, not a pointer, so a
/// stale handle can at worst fail validation — it cannot dangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Allocation {
    /// Byte offset of the payload within the arena.
    pub(crate) offset: usize,
    /// Requested payload length in bytes.
    pub(crate) len: usize,
}

impl Allocation {
    /// The legal result of `allocate(0)`: no block, no arena traffic.
    ///
    /// Offset 0 is the arena's padding word and never a real payload,
    /// so the empty handle is unambiguous.
    pub const EMPTY: Allocation = Allocation { offset: 0, len: 0 };

    /// Byte offset of the payload within the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Requested payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is the zero-size sentinel handle.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Allocation(off={}, len={})", self.offset, self.len)
    }
}

/// One entry of the block sequence, as reported by [`Heap::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Payload offset of the block.
    pub offset: usize,
    /// Total block size (header + payload + footer).
    pub size: usize,
    /// Whether the block is allocated.
    pub allocated: bool,
}

/// Explicit allocator over a fixed arena, boundary-tag implicit-list
/// design.
///
/// One heap owns one arena; instances are independent, so each test
/// can construct its own. All mutators take `&mut self` — there is no
/// interior mutability and no locking (single execution context by
/// contract).
#[derive(Debug)]
pub struct Heap {
    /// The managed storage. Only this heap holds a cursor into it.
    arena: Arena,
    /// Payload offset of the prologue block; first-fit scans start at
    /// the block after it.
    base: usize,
    /// Growth quantum, aligned.
    chunk: usize,
}

impl Heap {
    /// Create a heap: place the prologue and epilogue sentinels, then
    /// grow by one chunk to form the first free block.
    ///
    /// Fails with [`HeapError::InitializationFailed`] if the arena
    /// cannot hold the sentinels plus one chunk.
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        let chunk = config.aligned_chunk();
        let required = 4 * WORD + chunk;
        let init_failed = HeapError::InitializationFailed {
            capacity: config.capacity,
            required,
        };

        let mut arena = Arena::new(config.capacity);
        let start = arena.extend(4 * WORD).map_err(|_| init_failed)?;

        // Padding word, prologue header + footer, epilogue header.
        arena.write_word(start, 0);
        arena.write_word(start + WORD, tag::pack(OVERHEAD, true));
        arena.write_word(start + 2 * WORD, tag::pack(OVERHEAD, true));
        arena.write_word(start + 3 * WORD, tag::pack(0, true));

        let mut heap = Self {
            arena,
            base: start + 2 * WORD,
            chunk,
        };
        heap.extend_heap(chunk).map_err(|_| init_failed)?;
        Ok(heap)
    }

    /// Allocate `size` payload bytes.
    ///
    /// `size == 0` is legal and returns [`Allocation::EMPTY`] without
    /// touching the arena. Otherwise the request is rounded up to the
    /// alignment unit (plus tag overhead), placed first-fit, and the
    /// arena grows by at least one chunk if no free block fits.
    /// Returns [`HeapError::OutOfMemory`] once growth is impossible,
    /// or immediately for a request so large its block size does not
    /// fit in `usize`.
    pub fn allocate(&mut self, size: usize) -> Result<Allocation, HeapError> {
        if size == 0 {
            return Ok(Allocation::EMPTY);
        }
        let adjusted =
            tag::adjust(size).ok_or(HeapError::OutOfMemory { requested: size })?;

        if let Some(bp) = self.find_fit(adjusted) {
            self.place(bp, adjusted);
            return Ok(Allocation { offset: bp, len: size });
        }

        // No fit: grow by at least one chunk, then the retry cannot
        // miss — the grown (and backward-coalesced) block fits.
        let grow_by = adjusted.max(self.chunk);
        self.extend_heap(grow_by).map_err(|err| match err {
            HeapError::Exhausted { .. } => HeapError::OutOfMemory { requested: adjusted },
            other => other,
        })?;
        let bp = self
            .find_fit(adjusted)
            .expect("grown block is at least the adjusted size, so the retry always fits");
        self.place(bp, adjusted);
        Ok(Allocation { offset: bp, len: size })
    }

    /// Release a previously allocated handle, coalescing with any free
    /// neighbour.
    ///
    /// Releasing [`Allocation::EMPTY`] is a no-op. A handle that does
    /// not name a live allocated block (double release, forged offset,
    /// overwritten tags) fails with [`HeapError::CorruptedBlock`]
    /// rather than corrupting the block sequence.
    pub fn release(&mut self, allocation: Allocation) -> Result<(), HeapError> {
        if allocation.is_empty() {
            return Ok(());
        }
        let size = self.lookup_allocated(&allocation)?;
        self.set_tags(allocation.offset, size, false);
        self.coalesce(allocation.offset);
        Ok(())
    }

    /// Shared view of an allocation's payload bytes.
    ///
    /// The handle is validated the same way [`Heap::release`] validates
    /// it. The empty handle yields an empty slice.
    pub fn payload(&self, allocation: &Allocation) -> Result<&[u8], HeapError> {
        if allocation.is_empty() {
            return Ok(&[]);
        }
        self.lookup_allocated(allocation)?;
        Ok(self.arena.bytes(allocation.offset, allocation.len))
    }

    /// Mutable view of an allocation's payload bytes.
    pub fn payload_mut(&mut self, allocation: &Allocation) -> Result<&mut [u8], HeapError> {
        if allocation.is_empty() {
            return Ok(&mut []);
        }
        self.lookup_allocated(allocation)?;
        Ok(self.arena.bytes_mut(allocation.offset, allocation.len))
    }

    /// Iterate the real blocks in address order (sentinels excluded).
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            heap: self,
            bp: self.base + OVERHEAD,
        }
    }

    /// Current arena break.
    pub fn brk(&self) -> usize {
        self.arena.brk()
    }

    /// Fixed arena capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Total bytes held in free blocks (including their tag overhead).
    pub fn free_bytes(&self) -> usize {
        self.blocks().filter(|b| !b.allocated).map(|b| b.size).sum()
    }

    /// Size of the largest free block, or 0 if none.
    pub fn largest_free_block(&self) -> usize {
        self.blocks()
            .filter(|b| !b.allocated)
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Number of real blocks in the sequence.
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.arena.capacity()
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    #[cfg(test)]
    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub(crate) fn base(&self) -> usize {
        self.base
    }

    // ---- block navigation ------------------------------------------------
    //
    // `bp` is always a payload offset; the header sits one word below
    // it, the footer one overhead below the next block's payload.

    fn header(&self, bp: usize) -> (usize, bool) {
        tag::unpack(self.arena.read_word(bp - WORD))
    }

    fn footer(&self, bp: usize) -> (usize, bool) {
        let (size, _) = self.header(bp);
        tag::unpack(self.arena.read_word(bp + size - OVERHEAD))
    }

    /// Write matching header and footer tags for the block at `bp`.
    fn set_tags(&mut self, bp: usize, size: usize, allocated: bool) {
        let word = tag::pack(size, allocated);
        self.arena.write_word(bp - WORD, word);
        self.arena.write_word(bp + size - OVERHEAD, word);
    }

    fn next_block(&self, bp: usize) -> usize {
        let (size, _) = self.header(bp);
        bp + size
    }

    fn prev_block(&self, bp: usize) -> usize {
        let (prev_size, _) = tag::unpack(self.arena.read_word(bp - OVERHEAD));
        bp - prev_size
    }

    // ---- placement and growth --------------------------------------------

    /// First-fit: scan from the first real block to the epilogue for a
    /// free block of at least `adjusted` bytes.
    fn find_fit(&self, adjusted: usize) -> Option<usize> {
        let mut bp = self.base + OVERHEAD;
        loop {
            let (size, allocated) = self.header(bp);
            if size == 0 {
                return None; // epilogue
            }
            if !allocated && size >= adjusted {
                return Some(bp);
            }
            bp += size;
        }
    }

    /// Carve `adjusted` bytes out of the free block at `bp`, splitting
    /// off the remainder as a new free block when it is big enough to
    /// stand alone.
    fn place(&mut self, bp: usize, adjusted: usize) {
        let (current, _) = self.header(bp);
        let remainder = current - adjusted;
        if remainder >= MIN_BLOCK {
            self.set_tags(bp, adjusted, true);
            self.set_tags(bp + adjusted, remainder, false);
        } else {
            // A fragment below the minimum block size could never be
            // reused; absorb it as internal fragmentation instead.
            self.set_tags(bp, current, true);
        }
    }

    /// Grow the arena by `bytes` (aligned), overwrite the old epilogue
    /// with the new free block's header, write a fresh epilogue past
    /// it, and coalesce backwards. Returns the new free block.
    ///
    /// Growth failure propagates before any tag is written, so a
    /// failed extension leaves the block sequence untouched.
    fn extend_heap(&mut self, bytes: usize) -> Result<usize, HeapError> {
        let size = tag::align_up(bytes);
        let bp = self.arena.extend(size)?;
        self.set_tags(bp, size, false);
        let epilogue = self.next_block(bp);
        self.arena.write_word(epilogue - WORD, tag::pack(0, true));
        Ok(self.coalesce(bp))
    }

    /// Merge the free block at `bp` with either free neighbour,
    /// returning the payload offset of the surviving block.
    ///
    /// The sentinels are allocated, so both neighbour reads are always
    /// legal and at most two merges occur.
    fn coalesce(&mut self, bp: usize) -> usize {
        let (_, prev_allocated) = tag::unpack(self.arena.read_word(bp - OVERHEAD));
        let (next_size, next_allocated) = self.header(self.next_block(bp));
        let (mut size, _) = self.header(bp);

        match (prev_allocated, next_allocated) {
            (true, true) => bp,
            (true, false) => {
                size += next_size;
                self.set_tags(bp, size, false);
                bp
            }
            (false, true) => {
                let prev = self.prev_block(bp);
                let (prev_size, _) = self.header(prev);
                size += prev_size;
                self.set_tags(prev, size, false);
                prev
            }
            (false, false) => {
                let prev = self.prev_block(bp);
                let (prev_size, _) = self.header(prev);
                size += prev_size + next_size;
                self.set_tags(prev, size, false);
                prev
            }
        }
    }

    // ---- handle validation -----------------------------------------------

    /// Check that a handle names a live allocated block; returns the
    /// block's size. Every failure is a [`HeapError::CorruptedBlock`]
    /// naming what the validation found.
    fn lookup_allocated(&self, allocation: &Allocation) -> Result<usize, HeapError> {
        let bp = allocation.offset;
        let corrupted = |reason| HeapError::CorruptedBlock { offset: bp, reason };

        if bp % ALIGN != 0 {
            return Err(corrupted("payload offset not aligned"));
        }
        if bp < self.base + OVERHEAD || bp >= self.arena.brk() {
            return Err(corrupted("payload offset outside the block sequence"));
        }
        let (size, allocated) = self.header(bp);
        if size % ALIGN != 0 || size < MIN_BLOCK {
            return Err(corrupted("header size invalid"));
        }
        if bp - WORD + size > self.arena.brk() {
            return Err(corrupted("block extends past the break"));
        }
        if !allocated {
            return Err(corrupted("block is not allocated (double release?)"));
        }
        if self.footer(bp) != (size, allocated) {
            return Err(corrupted("header and footer disagree"));
        }
        if allocation.len > size - OVERHEAD {
            return Err(corrupted("handle length exceeds block capacity"));
        }
        Ok(size)
    }
}

/// Iterator over the real blocks of a [`Heap`], in address order.
pub struct Blocks<'a> {
    heap: &'a Heap,
    bp: usize,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let (size, allocated) = self.heap.header(self.bp);
        if size == 0 {
            return None; // epilogue
        }
        let info = BlockInfo {
            offset: self.bp,
            size,
            allocated,
        };
        self.bp += size;
        Some(info)
    }
}
