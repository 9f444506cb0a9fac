//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during heap operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// Arena growth would pass the fixed capacity.
    Exhausted {
        /// Number of bytes the growth requested.
        requested: usize,
        /// Total fixed capacity of the arena.
        capacity: usize,
    },
    /// `Heap::new` could not place its sentinels and first chunk.
    InitializationFailed {
        /// Configured arena capacity.
        capacity: usize,
        /// Bytes the initial layout needed.
        required: usize,
    },
    /// `allocate` could not satisfy the request even after growth.
    OutOfMemory {
        /// Adjusted block size that could not be placed, or the raw
        /// request when its block size does not fit in `usize`.
        requested: usize,
    },
    /// A block's tags failed validation — a stale or forged handle,
    /// a double release, or an overwrite of bookkeeping words.
    CorruptedBlock {
        /// Payload offset of the offending block.
        offset: usize,
        /// What the validation found.
        reason: &'static str,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} more bytes, capacity {capacity} bytes"
                )
            }
            Self::InitializationFailed { capacity, required } => {
                write!(
                    f,
                    "heap initialization failed: capacity {capacity} bytes, \
                     initial layout needs {required} bytes"
                )
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: no free block of {requested} bytes")
            }
            Self::CorruptedBlock { offset, reason } => {
                write!(f, "corrupted block at offset {offset}: {reason}")
            }
        }
    }
}

impl Error for HeapError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_numbers() {
        let err = HeapError::Exhausted {
            requested: 4096,
            capacity: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn corrupted_block_display_carries_reason() {
        let err = HeapError::CorruptedBlock {
            offset: 32,
            reason: "header and footer disagree",
        };
        assert!(err.to_string().contains("header and footer disagree"));
        assert!(err.to_string().contains("32"));
    }
}
