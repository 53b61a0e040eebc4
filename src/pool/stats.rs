//! Pool statistics
//!
//! Atomic counters recorded only when
//! [`PoolConfig::track_stats`](super::PoolConfig) is set, so the release
//! fast path pays nothing.

use core::sync::atomic::{AtomicU64, Ordering};

/// Counters describing a pool's lifetime activity.
#[derive(Debug, Default)]
pub struct PoolStats {
    allocations: AtomicU64,
    deallocations: AtomicU64,
    exhaustions: AtomicU64,
    grow_events: AtomicU64,
    failed_grows: AtomicU64,
    resets: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_deallocation(&self) {
        self.deallocations.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_exhaustion(&self) {
        self.exhaustions.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_grow(&self) {
        self.grow_events.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failed_grow(&self) {
        self.failed_grows.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::AcqRel);
    }

    /// Successful allocations over the pool's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Acquire)
    }

    /// Blocks returned over the pool's lifetime.
    pub fn deallocations(&self) -> u64 {
        self.deallocations.load(Ordering::Acquire)
    }

    /// Allocation attempts that found no block after growth.
    pub fn exhaustions(&self) -> u64 {
        self.exhaustions.load(Ordering::Acquire)
    }

    /// Chunks appended after construction.
    pub fn grow_events(&self) -> u64 {
        self.grow_events.load(Ordering::Acquire)
    }

    /// Growth attempts refused by the backing allocator or the cap.
    pub fn failed_grows(&self) -> u64 {
        self.failed_grows.load(Ordering::Acquire)
    }

    /// Calls to `reset`.
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = PoolStats::default();
        stats.record_allocation();
        stats.record_allocation();
        stats.record_deallocation();
        stats.record_grow();

        assert_eq!(stats.allocations(), 2);
        assert_eq!(stats.deallocations(), 1);
        assert_eq!(stats.grow_events(), 1);
        assert_eq!(stats.failed_grows(), 0);
    }
}
