//! Fixed-capacity arena with a movable break.
//!
//! The [`Arena`] models the memory the heap manages: a contiguous byte
//! region allocated to full capacity at construction, with a break
//! cursor that only moves forward. [`Arena::extend`] is the single
//! growth primitive; the allocator writes valid tags into newly exposed
//! bytes before they are ever observed as blocks.
//!
//! All access goes through byte-offset helpers — block references are
//! plain offsets from the arena base, never native pointers.

use crate::error::HeapError;
use crate::tag::WORD;

/// Fixed-capacity contiguous storage with monotonic growth.
#[derive(Debug)]
pub struct Arena {
    /// Backing storage. Allocated to full capacity at creation.
    storage: Vec<u8>,
    /// Current break: bytes below this are live heap, bytes at or
    /// above it are not yet exposed. Invariant: `brk <= capacity`.
    brk: usize,
}

impl Arena {
    /// Create an arena of exactly `capacity` bytes with the break at 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            brk: 0,
        }
    }

    /// Advance the break by `by` bytes, returning the pre-extension
    /// break (the start of the newly exposed region).
    ///
    /// Fails with [`HeapError::Exhausted`] and leaves the break
    /// unchanged if the capacity would be passed. The break never moves
    /// backwards; shrink is never requested.
    pub fn extend(&mut self, by: usize) -> Result<usize, HeapError> {
        let new_brk = self.brk.checked_add(by).unwrap_or(usize::MAX);
        if new_brk > self.storage.len() {
            return Err(HeapError::Exhausted {
                requested: by,
                capacity: self.storage.len(),
            });
        }
        let old_brk = self.brk;
        self.brk = new_brk;
        Ok(old_brk)
    }

    /// Current break.
    pub fn brk(&self) -> usize {
        self.brk
    }

    /// Total fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Read the tag word at `offset` (little endian).
    ///
    /// # Panics
    ///
    /// Panics if the word does not lie entirely below the break.
    pub fn read_word(&self, offset: usize) -> u64 {
        debug_assert!(offset + WORD <= self.brk, "word read past break");
        let bytes: [u8; WORD] = self.storage[offset..offset + WORD]
            .try_into()
            .expect("slice is exactly one word");
        u64::from_le_bytes(bytes)
    }

    /// Write the tag word at `offset` (little endian).
    ///
    /// # Panics
    ///
    /// Panics if the word does not lie entirely below the break.
    pub fn write_word(&mut self, offset: usize, word: u64) {
        debug_assert!(offset + WORD <= self.brk, "word write past break");
        self.storage[offset..offset + WORD].copy_from_slice(&word.to_le_bytes());
    }

    /// Shared view of `len` payload bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie entirely below the break.
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        debug_assert!(offset + len <= self.brk, "byte read past break");
        &self.storage[offset..offset + len]
    }

    /// Mutable view of `len` payload bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range does not lie entirely below the break.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        debug_assert!(offset + len <= self.brk, "byte write past break");
        &mut self.storage[offset..offset + len]
    }
}
