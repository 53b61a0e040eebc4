//! Fixed-size block pool
//!
//! A growable store of equal-sized storage slots, intended as a fast
//! substitute for per-object heap allocation. Free blocks are threaded
//! into an intrusive LIFO list (the link lives inside the free block
//! itself), so allocate and deallocate are a single pointer splice under
//! the pool lock.
//!
//! # Safety
//!
//! - All mutable pool state (free-list head, chunk list) sits behind one
//!   [`Lock`]; counters are atomics readable without it.
//! - While a block is free, its first bytes are a [`FreeLink`]; while
//!   allocated, the pool never touches its contents.
//! - A block address is, at any instant, either on the free list or held
//!   by exactly one [`RawBlock`]: the handle is not clonable, and
//!   [`BlockPool::deallocate`] consumes it.
//! - Chunks are never released or moved before the pool drops, so issued
//!   addresses survive growth.

mod chunk;
mod config;
mod stats;

pub use config::PoolConfig;
pub use stats::PoolStats;

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{PoolError, PoolResult};
use crate::sync::{Lock, RawLock, SpinLock};
use chunk::Chunk;

#[cfg(feature = "logging")]
use tracing::debug;

/// Intrusive free-list link stored in the first bytes of a free block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FreeLink {
    pub(crate) next: Option<NonNull<FreeLink>>,
}

/// Handle to one allocated block.
///
/// Deliberately neither `Clone` nor `Copy`: the handle *is* the ownership
/// of the block, and [`BlockPool::deallocate`] consumes it, so safe code
/// cannot double-free. Dropping a handle without deallocating leaks the
/// block until [`BlockPool::reset`] or pool teardown.
#[derive(Debug)]
pub struct RawBlock {
    ptr: NonNull<u8>,
}

impl RawBlock {
    /// Pointer to the block's storage.
    ///
    /// Valid for `block_stride` bytes, aligned to the pool alignment, and
    /// exclusively owned by the holder until the handle is returned via
    /// [`BlockPool::deallocate`].
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// The block's address, for diagnostics and alignment checks.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Rebuilds a handle from a pointer previously obtained through
    /// [`RawBlock::as_ptr`]. In-crate only: the typed layer and the list
    /// consumer stash block pointers inside their own structures.
    #[inline]
    pub(crate) fn from_ptr(ptr: NonNull<u8>) -> Self {
        Self { ptr }
    }
}

// SAFETY: the handle represents exclusive ownership of untyped storage;
// transferring that ownership to another thread is sound because the pool
// itself is Sync and the storage outlives every handle.
unsafe impl Send for RawBlock {}

/// Lock-protected mutable pool state.
struct PoolState {
    free_head: Option<NonNull<FreeLink>>,
    chunks: Vec<Chunk>,
}

// SAFETY: the raw free-list pointers all target memory owned by the
// chunks in this same struct; sending the state moves the chunks with it.
unsafe impl Send for PoolState {}

/// Thread-safe, growable pool of fixed-size blocks.
///
/// # Example
///
/// ```
/// use blockpool::BlockPool;
///
/// let pool = BlockPool::new(64, 8)?;
/// let block = pool.allocate().expect("fresh pool has free blocks");
/// assert_eq!(block.addr() % pool.alignment(), 0);
/// pool.deallocate(block);
/// # Ok::<(), blockpool::PoolError>(())
/// ```
pub struct BlockPool<R: RawLock = SpinLock> {
    state: Lock<PoolState, R>,
    stride: usize,
    alignment: usize,
    total_blocks: AtomicUsize,
    used_blocks: AtomicUsize,
    config: PoolConfig,
    stats: PoolStats,
}

impl BlockPool {
    /// Pool of `initial_blocks` slots of `block_size` bytes, guarded by
    /// the default busy-wait lock.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] for zero sizes,
    /// [`PoolError::AllocationFailed`] if the first chunk cannot be
    /// allocated.
    pub fn new(block_size: usize, initial_blocks: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::new(block_size, initial_blocks))
    }

    /// Pool from an explicit configuration, default lock.
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        Self::with_config_in(config)
    }
}

impl<R: RawLock> BlockPool<R> {
    /// Pool from an explicit configuration and lock type, e.g.
    /// `BlockPool::<BlockingLock>::with_config_in(config)`.
    pub fn with_config_in(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;

        let stride = config.stride()?;
        let alignment = config.effective_alignment();

        let first = Chunk::new(stride, config.initial_blocks, alignment)?;
        let free_head = first.link_blocks(None);
        let total = first.blocks();

        #[cfg(feature = "logging")]
        debug!(
            block_size = config.block_size,
            stride,
            alignment,
            blocks = total,
            "block pool created"
        );

        Ok(Self {
            state: Lock::new(PoolState {
                free_head,
                chunks: vec![first],
            }),
            stride,
            alignment,
            total_blocks: AtomicUsize::new(total),
            used_blocks: AtomicUsize::new(0),
            config,
            stats: PoolStats::default(),
        })
    }

    /// Takes a free block, growing the pool if the free list is empty.
    ///
    /// Returns `None` when no block is free and growth failed or was
    /// capped; exhaustion is a normal outcome, not a panic. O(1) except
    /// for the growth slow path.
    pub fn allocate(&self) -> Option<RawBlock> {
        let mut state = self.state.lock();

        if state.free_head.is_none()
            && let Err(_err) = self.grow(&mut state)
        {
            #[cfg(feature = "logging")]
            debug!(error = %_err, "pool growth failed, reporting exhaustion");
        }

        let Some(head) = state.free_head else {
            if self.config.track_stats {
                self.stats.record_exhaustion();
            }
            return None;
        };

        // SAFETY: head came off the free list, so its storage holds the
        // FreeLink written by link_blocks or deallocate; the lock is held.
        state.free_head = unsafe { head.as_ref().next };
        self.used_blocks.fetch_add(1, Ordering::Relaxed);

        if self.config.track_stats {
            self.stats.record_allocation();
        }

        Some(RawBlock { ptr: head.cast() })
    }

    /// Returns a block to the free list.
    ///
    /// Consuming the handle makes ordinary double-free unrepresentable.
    /// The caller must have destroyed any value it constructed in the
    /// block; the pool does not run destructors.
    pub fn deallocate(&self, block: RawBlock) {
        let mut state = self.state.lock();

        debug_assert!(
            state.chunks.iter().any(|c| c.contains(block.addr())),
            "deallocate called with a block this pool does not own"
        );

        let link = block.ptr.cast::<FreeLink>();
        // SAFETY: the handle was issued by allocate and is consumed here,
        // returning exclusive ownership of the storage to the pool; the
        // lock is held for the splice.
        unsafe {
            link.as_ptr().write(FreeLink {
                next: state.free_head,
            });
        }
        state.free_head = Some(link);
        self.used_blocks.fetch_sub(1, Ordering::Relaxed);

        if self.config.track_stats {
            self.stats.record_deallocation();
        }
    }

    /// Appends one chunk and splices its blocks onto the free list.
    ///
    /// Called with the lock held and the free list empty. On failure the
    /// pool state is untouched. Lock hold time is O(new block count),
    /// the one critical section that scales with work.
    fn grow(&self, state: &mut PoolState) -> PoolResult<()> {
        let total = self.total_blocks.load(Ordering::Relaxed);
        let mut new_blocks = (total / 2).max(1);

        if let Some(max) = self.config.max_blocks {
            if total >= max {
                if self.config.track_stats {
                    self.stats.record_failed_grow();
                }
                return Err(PoolError::pool_exhausted(total));
            }
            new_blocks = new_blocks.min(max - total);
        }

        let chunk = match Chunk::new(self.stride, new_blocks, self.alignment) {
            Ok(chunk) => chunk,
            Err(err) => {
                if self.config.track_stats {
                    self.stats.record_failed_grow();
                }
                return Err(err);
            }
        };

        state.free_head = chunk.link_blocks(state.free_head);
        state.chunks.push(chunk);
        self.total_blocks.fetch_add(new_blocks, Ordering::Relaxed);

        if self.config.track_stats {
            self.stats.record_grow();
        }

        #[cfg(feature = "logging")]
        debug!(
            new_blocks,
            capacity = total + new_blocks,
            "block pool grew"
        );

        Ok(())
    }

    /// Reclaims every block of every chunk back to the free list.
    ///
    /// Capacity is unchanged; `used()` drops to zero. Taking `&mut self`
    /// makes the no-concurrent-activity requirement a compile-time fact.
    /// Outstanding [`RawBlock`] handles are invalidated by contract; any
    /// values constructed in them must already be destroyed.
    pub fn reset(&mut self) {
        let state = self.state.get_mut();

        let mut head = None;
        for chunk in state.chunks.iter().rev() {
            head = chunk.link_blocks(head);
        }
        state.free_head = head;
        self.used_blocks.store(0, Ordering::Relaxed);

        if self.config.track_stats {
            self.stats.record_reset();
        }
    }

    /// Total blocks across all chunks. Lock-free; may be stale under
    /// concurrency.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.total_blocks.load(Ordering::Relaxed)
    }

    /// Blocks currently held by consumers. Lock-free; may be stale under
    /// concurrency.
    #[inline]
    pub fn used(&self) -> usize {
        self.used_blocks.load(Ordering::Relaxed)
    }

    /// Usable bytes per block, as requested at construction.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Actual per-block step: `block_size` rounded up for alignment and
    /// link storage. Consumers may use up to this many bytes.
    #[inline]
    pub fn block_stride(&self) -> usize {
        self.stride
    }

    /// Alignment every returned address satisfies.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Lifetime counters; populated only when `track_stats` is set.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// The configuration this pool was built from.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl<R: RawLock> core::fmt::Debug for BlockPool<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockPool")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .field("block_size", &self.block_size())
            .field("stride", &self.stride)
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "logging")]
impl<R: RawLock> Drop for BlockPool<R> {
    fn drop(&mut self) {
        let used = self.used();
        if used > 0 {
            tracing::warn!(
                used,
                capacity = self.capacity(),
                "block pool dropped with outstanding blocks"
            );
        }
    }
}
