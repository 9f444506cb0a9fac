//! Boundary-tag word codec and alignment math.
//!
//! Every block is bracketed by a header and a footer holding the same
//! packed word: the block's total size (a multiple of [`ALIGN`], so its
//! low four bits are always zero) ORed with the allocated flag in bit 0.
//! This module is the only place tags are encoded or decoded; everything
//! else works with `(size, allocated)` pairs.

/// Size of one tag word in bytes.
pub const WORD: usize = 8;

/// Double-word alignment unit. Every block size and every payload
/// address is a multiple of this.
pub const ALIGN: usize = 2 * WORD;

/// Per-block bookkeeping overhead: one header plus one footer.
pub const OVERHEAD: usize = 2 * WORD;

/// Minimum block size: enough for header + footer even with a zero
/// payload, rounded to two alignment units so a split remainder is
/// always itself a valid block.
pub const MIN_BLOCK: usize = 2 * ALIGN;

/// Mask selecting the size bits of a packed tag word.
const SIZE_MASK: u64 = !(ALIGN as u64 - 1);

/// Pack a block size and allocated flag into one tag word.
///
/// `size` must be a multiple of [`ALIGN`]; the flag lives in the low
/// bits that alignment frees up.
pub fn pack(size: usize, allocated: bool) -> u64 {
    debug_assert_eq!(size % ALIGN, 0, "tag size {size} not aligned");
    size as u64 | u64::from(allocated)
}

/// Unpack a tag word into `(size, allocated)`.
pub fn unpack(word: u64) -> (usize, bool) {
    ((word & SIZE_MASK) as usize, word & 1 != 0)
}

/// Round `n` up to the next multiple of [`ALIGN`].
pub fn align_up(n: usize) -> usize {
    (n + ALIGN - 1) & !(ALIGN - 1)
}

/// Adjusted block size for a payload request: header + footer + payload
/// rounded up to [`ALIGN`], floored at [`MIN_BLOCK`].
///
/// Returns `None` when the total does not fit in `usize` — such a
/// request can never be satisfied by any arena.
pub fn adjust(requested: usize) -> Option<usize> {
    let total = requested.checked_add(OVERHEAD)?;
    let aligned = total.checked_add(ALIGN - 1)? & !(ALIGN - 1);
    Some(aligned.max(MIN_BLOCK))
}
