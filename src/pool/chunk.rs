//! Backing memory chunks
//!
//! A chunk is one contiguous allocation contributing a batch of blocks to
//! the pool. Chunks are owned exclusively by the pool and released exactly
//! once, when the pool is dropped; growth never releases or moves a prior
//! chunk, so issued block addresses stay valid for the pool's lifetime.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

use crate::align::align_up;
use crate::error::{PoolError, PoolResult};

use super::FreeLink;

/// One contiguous backing allocation.
///
/// The raw allocation is over-sized by `align - 1` bytes of slack; `base`
/// is the first address inside it that satisfies the pool alignment. Block
/// `i` lives at `base + i * stride`.
pub(crate) struct Chunk {
    raw: NonNull<u8>,
    layout: Layout,
    base: usize,
    blocks: usize,
    stride: usize,
}

impl Chunk {
    /// Allocates a chunk holding `blocks` slots of `stride` bytes, with
    /// the usable region aligned to `align`.
    ///
    /// `stride` must already be a multiple of `align`, so aligning the
    /// base aligns every block. The caller validates both.
    pub(crate) fn new(stride: usize, blocks: usize, align: usize) -> PoolResult<Self> {
        debug_assert!(blocks > 0);
        debug_assert!(stride > 0 && stride % align == 0);

        let payload = stride
            .checked_mul(blocks)
            .ok_or_else(|| PoolError::size_overflow("chunk payload"))?;
        let size = payload
            .checked_add(align - 1)
            .ok_or_else(|| PoolError::size_overflow("chunk slack"))?;
        let layout = Layout::from_size_align(size, 1)
            .map_err(|_| PoolError::size_overflow("chunk layout"))?;

        // SAFETY: layout has non-zero size (stride and blocks are both
        // non-zero) and alignment 1. The pointer is null-checked below and
        // deallocated with the same layout in Drop.
        let ptr = unsafe { alloc(layout) };
        let raw = NonNull::new(ptr).ok_or_else(|| PoolError::allocation_failed(size, align))?;

        let base = align_up(raw.as_ptr() as usize, align)?;

        Ok(Self {
            raw,
            layout,
            base,
            blocks,
            stride,
        })
    }

    /// Number of blocks this chunk contributes.
    pub(crate) fn blocks(&self) -> usize {
        self.blocks
    }

    /// Address of block `index`.
    fn block_addr(&self, index: usize) -> usize {
        debug_assert!(index < self.blocks);
        self.base + index * self.stride
    }

    /// Threads every block of this chunk into an intrusive sub-list.
    ///
    /// Block `i` links to block `i + 1`; the last block links to `tail`.
    /// Returns the head of the resulting chain (the chunk's first block).
    pub(crate) fn link_blocks(
        &self,
        tail: Option<NonNull<FreeLink>>,
    ) -> Option<NonNull<FreeLink>> {
        let mut next = tail;
        for index in (0..self.blocks).rev() {
            let link = self.block_addr(index) as *mut FreeLink;
            // SAFETY: block_addr is within this chunk's allocation, and
            // stride/base alignment guarantees FreeLink's alignment. The
            // caller holds the pool lock (or exclusive access), and every
            // block being threaded is free, so its storage is ours to
            // reinterpret.
            unsafe { link.write(FreeLink { next }) };
            next = NonNull::new(link);
        }
        next
    }

    /// Whether `addr` is a block address owned by this chunk.
    pub(crate) fn contains(&self, addr: usize) -> bool {
        addr >= self.base
            && addr < self.base + self.blocks * self.stride
            && (addr - self.base) % self.stride == 0
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: raw was returned by alloc with this exact layout, and
        // Drop runs exactly once.
        unsafe { dealloc(self.raw.as_ptr(), self.layout) };
    }
}

// SAFETY: the chunk exclusively owns its allocation; NonNull<u8> is the
// only non-Send field and it points to untyped memory reachable through
// this chunk alone.
unsafe impl Send for Chunk {}
