//! Mutual-exclusion primitives guarding pool state
//!
//! The default lock is a busy-wait spin lock: acquisition repeatedly
//! attempts an atomic test-and-set with acquire ordering and yields the
//! thread between attempts. That is the right trade-off for the pool's
//! O(1) critical sections on multi-core targets. Growth holds the lock
//! for O(new block count), so a blocking alternative backed by
//! `parking_lot` is provided for single-core or growth-heavy contexts.
//!
//! # Safety
//!
//! `Lock<T, R>` hands out `&mut T` through its guard from a shared
//! reference. Soundness rests on `RawLock` implementations providing
//! mutual exclusion: `acquire` must not return while another caller holds
//! the lock, and `release` must only be called by the current holder.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::RawMutex as _;

/// A raw mutual-exclusion primitive.
///
/// Not re-entrant: re-acquiring while held by the same thread deadlocks.
/// No fairness or bounded-wait guarantee.
pub trait RawLock: Default + Send + Sync {
    /// Blocks (or spins) until the lock is held by the caller.
    fn acquire(&self);

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The caller must currently hold the lock.
    unsafe fn release(&self);
}

/// Busy-wait lock: test-and-set with acquire ordering, yielding the
/// thread between failed attempts; release is a store with release
/// ordering.
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl RawLock for SpinLock {
    #[inline]
    fn acquire(&self) {
        while self.locked.swap(true, Ordering::Acquire) {
            std::thread::yield_now();
        }
    }

    #[inline]
    unsafe fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Blocking lock backed by `parking_lot`, for contexts where busy-waiting
/// is wasteful (single-core targets, pools that grow often).
pub struct BlockingLock {
    inner: parking_lot::RawMutex,
}

impl Default for BlockingLock {
    fn default() -> Self {
        Self {
            inner: parking_lot::RawMutex::INIT,
        }
    }
}

impl core::fmt::Debug for BlockingLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockingLock").finish_non_exhaustive()
    }
}

impl RawLock for BlockingLock {
    #[inline]
    fn acquire(&self) {
        self.inner.lock();
    }

    #[inline]
    unsafe fn release(&self) {
        // SAFETY: the RawLock contract requires the caller to hold the lock.
        unsafe { self.inner.unlock() }
    }
}

/// Interior-mutable value guarded by a [`RawLock`].
pub struct Lock<T, R: RawLock = SpinLock> {
    raw: R,
    value: UnsafeCell<T>,
}

// SAFETY: Lock<T, R> provides access to T only through the guard, which
// holds the raw lock for its lifetime. With mutual exclusion guaranteed
// by R, sharing the lock across threads is safe whenever T itself may be
// sent between threads.
unsafe impl<T: Send, R: RawLock> Sync for Lock<T, R> {}

// SAFETY: moving the lock moves the owned T; no thread-local state.
unsafe impl<T: Send, R: RawLock> Send for Lock<T, R> {}

impl<T, R: RawLock> Lock<T, R> {
    /// Wraps `value` behind a freshly initialized lock.
    pub fn new(value: T) -> Self {
        Self {
            raw: R::default(),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, returning an RAII guard.
    #[inline]
    pub fn lock(&self) -> LockGuard<'_, T, R> {
        self.raw.acquire();
        LockGuard { lock: self }
    }

    /// Direct access without locking; `&mut self` proves exclusivity.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

impl<T: core::fmt::Debug, R: RawLock> core::fmt::Debug for Lock<T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Lock").finish_non_exhaustive()
    }
}

/// RAII guard; the lock is released when the guard drops.
pub struct LockGuard<'a, T, R: RawLock> {
    lock: &'a Lock<T, R>,
}

impl<T, R: RawLock> Deref for LockGuard<'_, T, R> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the guard holds the raw lock, so no other reference to
        // the value exists.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T, R: RawLock> DerefMut for LockGuard<'_, T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above; the guard is borrowed mutably, so this is the
        // only live reference.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T, R: RawLock> Drop for LockGuard<'_, T, R> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard was created by Lock::lock, so the lock is held.
        unsafe { self.lock.raw.release() }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn guard_gives_exclusive_access() {
        let lock: Lock<i32> = Lock::new(41);
        {
            let mut guard = lock.lock();
            *guard += 1;
        }
        assert_eq!(*lock.lock(), 42);
    }

    #[test]
    fn get_mut_bypasses_lock() {
        let mut lock: Lock<Vec<u8>> = Lock::new(vec![1, 2]);
        lock.get_mut().push(3);
        assert_eq!(lock.lock().len(), 3);
    }

    fn hammer<R: RawLock + 'static>() {
        let lock: Arc<Lock<u64, R>> = Arc::new(Lock::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..1_000 {
                    *lock.lock() += 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*lock.lock(), 8_000);
    }

    #[test]
    fn spin_lock_counts_under_contention() {
        hammer::<SpinLock>();
    }

    #[test]
    fn blocking_lock_counts_under_contention() {
        hammer::<BlockingLock>();
    }

    #[test]
    fn send_sync_bounds() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Lock<Vec<u8>>>();
        assert_sync::<Lock<Vec<u8>>>();
        assert_sync::<Lock<Vec<u8>, BlockingLock>>();
    }
}
