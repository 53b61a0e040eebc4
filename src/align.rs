//! Address alignment helpers
//!
//! Pure functions: no side effects, no pool state involved.

use crate::error::{PoolError, PoolResult};

/// Platform's maximum fundamental alignment; default for pools that do not
/// request anything stricter.
pub const DEFAULT_ALIGN: usize = core::mem::align_of::<u128>();

/// Cache line size on common targets, useful for contention-sensitive
/// block sizes.
pub const CACHE_LINE: usize = 64;

/// Rounds `addr` up to the next multiple of `align`.
///
/// Returns the smallest `addr' >= addr` with `addr' % align == 0`.
///
/// # Errors
///
/// - [`PoolError::InvalidAlignment`] if `align` is zero or not a power of
///   two.
/// - [`PoolError::SizeOverflow`] if rounding would overflow `usize`.
#[inline]
pub fn align_up(addr: usize, align: usize) -> PoolResult<usize> {
    if align == 0 || !align.is_power_of_two() {
        return Err(PoolError::invalid_alignment(align));
    }

    let mask = align - 1;
    addr.checked_add(mask)
        .map(|a| a & !mask)
        .ok_or_else(|| PoolError::size_overflow("align_up"))
}

/// Whether `addr` is a multiple of `align`.
///
/// Returns `false` for alignments that are zero or not a power of two.
#[inline]
#[must_use]
pub fn is_aligned(addr: usize, align: usize) -> bool {
    align != 0 && align.is_power_of_two() && addr & (align - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_minimally() {
        assert_eq!(align_up(0, 8).unwrap(), 0);
        assert_eq!(align_up(1, 8).unwrap(), 8);
        assert_eq!(align_up(8, 8).unwrap(), 8);
        assert_eq!(align_up(9, 8).unwrap(), 16);
        assert_eq!(align_up(63, 64).unwrap(), 64);
        assert_eq!(align_up(65, 64).unwrap(), 128);
    }

    #[test]
    fn already_aligned_is_identity() {
        for align in [1usize, 2, 4, 8, 16, 64, 4096] {
            let addr = align * 7;
            assert_eq!(align_up(addr, align).unwrap(), addr);
        }
    }

    #[test]
    fn rejects_zero_alignment() {
        assert_eq!(align_up(16, 0), Err(PoolError::invalid_alignment(0)));
    }

    #[test]
    fn rejects_non_power_of_two() {
        for align in [3usize, 5, 6, 7, 12, 100] {
            assert!(align_up(16, align).unwrap_err().is_invalid_alignment());
        }
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            align_up(usize::MAX, 64),
            Err(PoolError::size_overflow("align_up"))
        );
    }

    #[test]
    fn alignment_predicate() {
        assert!(is_aligned(128, 64));
        assert!(!is_aligned(129, 64));
        assert!(!is_aligned(128, 0));
        assert!(!is_aligned(128, 3));
    }
}
