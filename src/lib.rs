//! # blockpool
//!
//! Thread-safe, growable pool of fixed-size memory blocks.
//!
//! A [`BlockPool`] carves backing memory into equal-sized, aligned slots
//! and hands them out in O(1) from an intrusive free list. When the list
//! runs dry the pool grows by appending a new chunk; existing chunks are
//! never moved or released, so every address the pool has issued stays
//! valid until the pool itself is dropped.
//!
//! ## Layers
//!
//! - [`BlockPool`] / [`RawBlock`]: untyped blocks, the core allocator.
//! - [`TypedPool`] / [`PoolBox`]: one value per block with RAII
//!   construction and destruction.
//! - [`PooledList`]: a linked list that feeds its nodes from a pool,
//!   with in-place middle lookup and an iterative merge sort.
//!
//! ## Locking
//!
//! The pool's mutable state sits behind a pluggable [`RawLock`]. The
//! default [`SpinLock`] busy-waits and suits short, uncontended critical
//! sections; [`BlockingLock`] parks contending threads instead and is the
//! better fit when hold times grow or contention is heavy.
//!
//! ```
//! use blockpool::{BlockPool, PoolConfig};
//!
//! let pool = BlockPool::with_config(PoolConfig::new(64, 8))?;
//!
//! let block = pool.allocate().expect("fresh pool has free blocks");
//! assert_eq!(pool.used(), 1);
//!
//! pool.deallocate(block);
//! assert_eq!(pool.used(), 0);
//! # Ok::<(), blockpool::PoolError>(())
//! ```

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]
#![allow(clippy::module_name_repetitions)]

pub mod align;
mod error;
mod list;
mod pool;
mod sync;
mod typed;

pub use error::{PoolError, PoolResult};
pub use list::{Iter, PooledList};
pub use pool::{BlockPool, PoolConfig, PoolStats, RawBlock};
pub use sync::{BlockingLock, Lock, LockGuard, RawLock, SpinLock};
pub use typed::{PoolBox, TypedPool};

/// Common imports for pool consumers.
pub mod prelude {
    pub use crate::align::{align_up, is_aligned};
    pub use crate::error::{PoolError, PoolResult};
    pub use crate::list::PooledList;
    pub use crate::pool::{BlockPool, PoolConfig, PoolStats, RawBlock};
    pub use crate::sync::{BlockingLock, RawLock, SpinLock};
    pub use crate::typed::{PoolBox, TypedPool};
}
