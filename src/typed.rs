//! Typed layer over the raw pool
//!
//! The raw [`BlockPool`] hands out untyped storage and never runs
//! constructors or destructors. `TypedPool<T>` layers the consumer
//! contract on top for one value type: construct on allocate, destroy
//! before the block goes back. [`PoolBox`] is the RAII side of that
//! contract: its `Drop` runs `T`'s destructor and only then returns the
//! block, so destroy-before-deallocate cannot be forgotten.

use core::marker::PhantomData;
use core::mem::{align_of, size_of};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use crate::error::PoolResult;
use crate::pool::{BlockPool, PoolConfig, RawBlock};
use crate::sync::{RawLock, SpinLock};

/// Pool of blocks sized and aligned for values of type `T`.
///
/// # Example
///
/// ```
/// use blockpool::TypedPool;
///
/// let pool: TypedPool<String> = TypedPool::new(8)?;
///
/// let mut s = pool.allocate(String::from("hello")).expect("pool has room");
/// s.push_str(", world");
/// assert_eq!(&*s, "hello, world");
///
/// drop(s); // destroys the String, then returns the block
/// assert_eq!(pool.used(), 0);
/// # Ok::<(), blockpool::PoolError>(())
/// ```
pub struct TypedPool<T, R: RawLock = SpinLock> {
    raw: BlockPool<R>,
    _marker: PhantomData<T>,
}

impl<T> TypedPool<T> {
    /// Pool with room for `initial_blocks` values of `T`, default lock.
    ///
    /// Blocks are sized `size_of::<T>()` and aligned `align_of::<T>()`.
    pub fn new(initial_blocks: usize) -> PoolResult<Self> {
        Self::with_config(Self::config_for(initial_blocks))
    }

    /// Pool from an explicit configuration, default lock. The block size
    /// and alignment are raised to `T`'s requirements if the
    /// configuration understates them.
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        Self::with_config_in(config)
    }
}

impl<T, R: RawLock> TypedPool<T, R> {
    /// Baseline configuration for values of `T`.
    #[must_use]
    pub fn config_for(initial_blocks: usize) -> PoolConfig {
        PoolConfig::new(size_of::<T>().max(1), initial_blocks).with_alignment(align_of::<T>())
    }

    /// Pool from an explicit configuration and lock type.
    ///
    /// # Errors
    ///
    /// The configuration is validated as given, before any raising: an
    /// alignment of `3` is rejected, not silently rounded to `T`'s.
    pub fn with_config_in(mut config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        config.block_size = config.block_size.max(size_of::<T>()).max(1);
        config.alignment = config.alignment.max(align_of::<T>());

        Ok(Self {
            raw: BlockPool::with_config_in(config)?,
            _marker: PhantomData,
        })
    }

    /// Moves `value` into a pool block.
    ///
    /// Returns `None` on exhaustion (no free block and growth failed or
    /// was capped); `value` is dropped in that case, matching the usual
    /// `try_insert` contract.
    pub fn allocate(&self, value: T) -> Option<PoolBox<'_, T, R>> {
        let block = self.raw.allocate()?;
        let ptr = block.as_ptr().cast::<T>();

        // SAFETY: the block is at least size_of::<T>() bytes (config was
        // raised above), aligned for T, uninitialized, and exclusively
        // ours; write moves the value in without dropping stale contents.
        unsafe { ptr.write(value) };

        // The handle's address now lives in the PoolBox; reconstructed on
        // drop. NonNull is safe: as_ptr comes from a NonNull.
        let ptr = NonNull::new(ptr)?;
        core::mem::forget(block);

        Some(PoolBox {
            ptr,
            pool: self,
        })
    }

    /// Total blocks across all chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Values currently live in the pool.
    #[inline]
    pub fn used(&self) -> usize {
        self.raw.used()
    }

    /// The underlying untyped pool, for diagnostics.
    pub fn raw(&self) -> &BlockPool<R> {
        &self.raw
    }

    /// Reclaims all blocks. `&mut self` guarantees no [`PoolBox`] is
    /// outstanding (each one borrows the pool), so no live value is lost.
    pub fn reset(&mut self) {
        self.raw.reset();
    }
}

impl<T, R: RawLock> core::fmt::Debug for TypedPool<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypedPool")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .finish_non_exhaustive()
    }
}

/// RAII handle to a pool-resident value.
///
/// Dereferences to `T`. Dropping destroys the value, then returns its
/// block to the pool.
pub struct PoolBox<'a, T, R: RawLock = SpinLock> {
    ptr: NonNull<T>,
    pool: &'a TypedPool<T, R>,
}

impl<'a, T, R: RawLock> PoolBox<'a, T, R> {
    /// Moves the value out, returning its block to the pool without
    /// running `T`'s destructor on pool storage.
    pub fn into_inner(self) -> T {
        // SAFETY: ptr holds an initialized T owned by this box; reading
        // moves it out, and mem::forget below prevents Drop from touching
        // the now-logically-empty slot.
        let value = unsafe { self.ptr.as_ptr().read() };
        let block = RawBlock::from_ptr(self.ptr.cast());
        self.pool.raw.deallocate(block);
        core::mem::forget(self);
        value
    }

    /// The pool this value lives in.
    pub fn pool(&self) -> &'a TypedPool<T, R> {
        self.pool
    }
}

impl<T, R: RawLock> Deref for PoolBox<'_, T, R> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: ptr is valid and initialized for the box's lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, R: RawLock> DerefMut for PoolBox<'_, T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: exclusive by &mut self; ptr is valid and initialized.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T, R: RawLock> Drop for PoolBox<'_, T, R> {
    fn drop(&mut self) {
        // SAFETY: the value is initialized and exclusively owned; it is
        // destroyed before its block is returned, per the consumer
        // contract.
        unsafe { ptr::drop_in_place(self.ptr.as_ptr()) };
        self.pool
            .raw
            .deallocate(RawBlock::from_ptr(self.ptr.cast()));
    }
}

impl<T: core::fmt::Debug, R: RawLock> core::fmt::Debug for PoolBox<'_, T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        (**self).fmt(f)
    }
}

impl<T, R: RawLock> AsRef<T> for PoolBox<'_, T, R> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T, R: RawLock> AsMut<T> for PoolBox<'_, T, R> {
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

// SAFETY: a PoolBox owns its T (Send moves the value's ownership) and
// holds a shared reference to the pool, which is Sync; deallocating from
// another thread goes through the pool lock.
unsafe impl<T: Send, R: RawLock> Send for PoolBox<'_, T, R> {}

// SAFETY: shared access to the boxed value is shared access to T.
unsafe impl<T: Sync, R: RawLock> Sync for PoolBox<'_, T, R> {}
