//! Heap configuration parameters.

use crate::tag;

/// Configuration for a [`Heap`](crate::Heap).
///
/// Controls the arena's fixed capacity and the growth quantum. Values
/// are immutable after the heap is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Total fixed capacity of the arena in bytes.
    ///
    /// Default: 16 MiB. The arena never grows past this; reaching it is
    /// the only hard failure mode of the allocator.
    pub capacity: usize,

    /// Minimum increment by which the arena grows when no free block
    /// satisfies a request.
    ///
    /// Default: 4096 bytes (one page). Rounded up to the alignment
    /// unit at `Heap::new` time. Tests shrink this to exercise growth
    /// paths inside small arenas.
    pub chunk_size: usize,
}

impl HeapConfig {
    /// Default arena capacity: 16 MiB.
    pub const DEFAULT_CAPACITY: usize = 1 << 24;

    /// Default growth chunk: one 4 KiB page.
    pub const DEFAULT_CHUNK_SIZE: usize = 1 << 12;

    /// Create a config with the given capacity and the default chunk.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the growth chunk.
    pub fn chunk(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The growth chunk rounded up to the alignment unit, as the heap
    /// actually uses it.
    pub fn aligned_chunk(&self) -> usize {
        tag::align_up(self.chunk_size)
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_16_mib() {
        assert_eq!(HeapConfig::default().capacity, 16 * 1024 * 1024);
    }

    #[test]
    fn chunk_override_preserved() {
        let config = HeapConfig::new(4096).chunk(512);
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.chunk_size, 512);
    }

    #[test]
    fn aligned_chunk_rounds_up() {
        assert_eq!(HeapConfig::new(4096).chunk(500).aligned_chunk(), 512);
        assert_eq!(HeapConfig::new(4096).chunk(512).aligned_chunk(), 512);
    }
}
