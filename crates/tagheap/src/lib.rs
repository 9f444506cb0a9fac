//! Boundary-tag implicit-free-list heap allocator over a fixed arena.
//!
//! An explicit, single-threaded allocator in the classic boundary-tag
//! design: variable-size blocks bracketed by matching header/footer
//! tags, first-fit placement with in-place splitting, and immediate
//! coalescing on release so no two adjacent blocks are ever both free.
//!
//! # Architecture
//!
//! ```text
//! Heap (allocator)
//! ├── Arena (fixed-capacity Vec<u8> with a monotonic break)
//! ├── tag codec (pack/unpack size+flag words, alignment math)
//! └── block sequence: [pad][prologue][block...][epilogue]
//! ```
//!
//! Block references are byte offsets from the arena base rather than
//! native pointers, so a stale [`Allocation`] handle fails validation
//! ([`HeapError::CorruptedBlock`]) instead of corrupting memory, and
//! the whole structure stays in safe Rust.
//!
//! # Quick start
//!
//! ```rust
//! use tagheap::{Heap, HeapConfig};
//!
//! let mut heap = Heap::new(HeapConfig::new(4096).chunk(1024)).unwrap();
//! let a = heap.allocate(24).unwrap();
//! heap.payload_mut(&a).unwrap().fill(0xAB);
//! assert_eq!(heap.payload(&a).unwrap()[0], 0xAB);
//! heap.release(a).unwrap();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod check;
pub mod config;
pub mod error;
pub mod heap;
pub mod tag;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::HeapConfig;
pub use error::HeapError;
pub use heap::{Allocation, BlockInfo, Blocks, Heap};
