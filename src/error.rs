//! Error types for the block pool
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.
//!
//! Exhaustion is deliberately *not* represented here as a failure of
//! [`BlockPool::allocate`](crate::pool::BlockPool::allocate): running out
//! of blocks is a normal, reported outcome (`None`). The
//! [`PoolError::Exhausted`] variant exists for consumers that need to
//! surface exhaustion across their own API boundary.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

/// Block pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Backing-store request was refused by the system allocator.
    #[error("memory allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed {
        /// Bytes requested from the backing allocator.
        size: usize,
        /// Alignment the request carried.
        align: usize,
    },

    /// Alignment is zero or not a power of two.
    #[error("invalid alignment: {alignment} (must be a non-zero power of two)")]
    InvalidAlignment {
        /// The rejected alignment value.
        alignment: usize,
    },

    /// Construction parameters are unusable.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig {
        /// Which parameter was rejected and why.
        reason: String,
    },

    /// Arithmetic on sizes or addresses would overflow.
    #[error("size overflow during {operation}")]
    SizeOverflow {
        /// The computation that overflowed.
        operation: String,
    },

    /// No free block and growth failed or was capped.
    #[error("pool exhausted (capacity: {capacity} blocks)")]
    Exhausted {
        /// Pool capacity at the time of exhaustion.
        capacity: usize,
    },
}

impl PoolError {
    /// Check if the error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "POOL:ALLOC:FAILED",
            Self::InvalidAlignment { .. } => "POOL:CONFIG:ALIGN",
            Self::InvalidConfig { .. } => "POOL:CONFIG:INVALID",
            Self::SizeOverflow { .. } => "POOL:ALLOC:OVERFLOW",
            Self::Exhausted { .. } => "POOL:EXHAUSTED",
        }
    }

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "backing memory allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create invalid alignment error
    #[must_use]
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(capacity, "block pool exhausted");

        Self::Exhausted { capacity }
    }

    /// Check if this is an invalid alignment error
    #[must_use]
    pub fn is_invalid_alignment(&self) -> bool {
        matches!(self, Self::InvalidAlignment { .. })
    }
}

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, PoolError>;
