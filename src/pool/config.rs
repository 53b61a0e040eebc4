//! Pool configuration

use crate::align::{self, align_up};
use crate::error::{PoolError, PoolResult};

/// Configuration for a [`BlockPool`](super::BlockPool).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Usable bytes per block. Must be non-zero; rounded up internally so
    /// every block can hold a free-list link and stays aligned.
    pub block_size: usize,

    /// Blocks in the first chunk. Must be non-zero.
    pub initial_blocks: usize,

    /// Alignment every returned block address satisfies. Must be a power
    /// of two; defaults to the platform's maximum fundamental alignment.
    pub alignment: usize,

    /// Hard capacity cap. Growth is skipped once `capacity()` reaches the
    /// cap; `None` means the pool grows whenever backing memory allows.
    pub max_blocks: Option<usize>,

    /// Enable statistics tracking
    pub track_stats: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: 64,
            initial_blocks: 16,
            alignment: align::DEFAULT_ALIGN,
            max_blocks: None,
            track_stats: cfg!(debug_assertions),
        }
    }
}

impl PoolConfig {
    /// Configuration sized for `block_size`-byte blocks with
    /// `initial_blocks` slots in the first chunk.
    #[must_use]
    pub fn new(block_size: usize, initial_blocks: usize) -> Self {
        Self {
            block_size,
            initial_blocks,
            ..Default::default()
        }
    }

    /// Production configuration - no statistics overhead
    #[must_use]
    pub fn production(block_size: usize, initial_blocks: usize) -> Self {
        Self {
            track_stats: false,
            ..Self::new(block_size, initial_blocks)
        }
    }

    /// Debug configuration - statistics always recorded
    #[must_use]
    pub fn debug(block_size: usize, initial_blocks: usize) -> Self {
        Self {
            track_stats: true,
            ..Self::new(block_size, initial_blocks)
        }
    }

    /// Bounded pool: starts at `max` blocks and never grows past it.
    #[must_use]
    pub fn bounded(block_size: usize, max: usize) -> Self {
        Self {
            initial_blocks: max,
            max_blocks: Some(max),
            ..Self::new(block_size, max)
        }
    }

    /// Sets the block alignment.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Caps total capacity at `max` blocks.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_max_blocks(mut self, max: usize) -> Self {
        self.max_blocks = Some(max);
        self
    }

    /// Enables or disables statistics recording.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_stats(mut self, track: bool) -> Self {
        self.track_stats = track;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] for zero sizes or a cap below the
    /// initial count, [`PoolError::InvalidAlignment`] for a bad alignment.
    pub fn validate(&self) -> PoolResult<()> {
        if self.block_size == 0 {
            return Err(PoolError::invalid_config("block_size must be non-zero"));
        }
        if self.initial_blocks == 0 {
            return Err(PoolError::invalid_config("initial_blocks must be non-zero"));
        }
        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            return Err(PoolError::invalid_alignment(self.alignment));
        }
        if let Some(max) = self.max_blocks
            && max < self.initial_blocks
        {
            return Err(PoolError::invalid_config(
                "max_blocks must be >= initial_blocks",
            ));
        }
        Ok(())
    }

    /// Per-block step: `block_size` rounded up so each slot can hold a
    /// [`FreeLink`](super::FreeLink) and every slot address stays a
    /// multiple of the effective alignment.
    pub(crate) fn stride(&self) -> PoolResult<usize> {
        let link = core::mem::size_of::<super::FreeLink>();
        align_up(self.block_size.max(link), self.effective_alignment())
    }

    /// Alignment actually applied: the requested alignment, raised to the
    /// free-list link's own requirement so free blocks can store links.
    pub(crate) fn effective_alignment(&self) -> usize {
        self.alignment.max(core::mem::align_of::<super::FreeLink>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(PoolConfig::new(0, 4).validate().is_err());
        assert!(PoolConfig::new(16, 0).validate().is_err());
    }

    #[test]
    fn bad_alignment_rejected() {
        let err = PoolConfig::new(16, 4).with_alignment(3).validate();
        assert!(err.unwrap_err().is_invalid_alignment());

        let err = PoolConfig::new(16, 4).with_alignment(0).validate();
        assert!(err.unwrap_err().is_invalid_alignment());
    }

    #[test]
    fn cap_below_initial_rejected() {
        let config = PoolConfig::new(16, 8).with_max_blocks(4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn stride_is_aligned_and_holds_a_link() {
        let config = PoolConfig::new(1, 4).with_alignment(64);
        let stride = config.stride().unwrap();
        assert_eq!(stride % 64, 0);
        assert!(stride >= core::mem::size_of::<crate::pool::FreeLink>());

        // Block sizes that are not an alignment multiple round up, so
        // block N stays aligned, not just block 0.
        let config = PoolConfig::new(100, 4).with_alignment(64);
        assert_eq!(config.stride().unwrap(), 128);
    }

    #[test]
    fn bounded_starts_full() {
        let config = PoolConfig::bounded(32, 3);
        assert_eq!(config.initial_blocks, 3);
        assert_eq!(config.max_blocks, Some(3));
        assert!(config.validate().is_ok());
    }
}
