//! Centralized Constants
//!
//! This module provides a single source of truth for the timeouts,
//! capacities and naming limits used throughout the crate.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Timing**: SCA busy waits and lock acquisition
//! - **Lock naming**: OS socket name limits
//! - **DMA**: FIFO depth, page size and queue capacities
//!
//! # Note
//!
//! SCA register offsets and command words remain in `sca::registers` as they
//! are specific to that hardware block.

use std::time::Duration;

// =============================================================================
// Timing Constants
// =============================================================================

/// Deadline for the SCA busy flag (READ_BUSY bit 31) to clear
pub const SCA_BUSY_TIMEOUT: Duration = Duration::from_millis(10);

/// Deadline for the SCA channel-busy code to clear during a read
pub const SCA_CHANNEL_BUSY_TIMEOUT: Duration = Duration::from_millis(10);

/// How long a waiting lock acquisition keeps retrying
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Back-off between two bind attempts while waiting on a lock
pub const LOCK_RETRY_INTERVAL_US: u32 = 1_000;

// =============================================================================
// Lock Naming
// =============================================================================

/// Names at or above this length are hashed (104 on macOS, 108 on most Unixes)
pub const MAX_SOCKET_NAME_LENGTH: usize = 104;

/// Characters of the original name kept in front of a hashed name
pub const LOCK_CLASS_PREFIX_LENGTH: usize = 17;

/// Suffix appended to hashed lock names
pub const LOCK_NAME_SUFFIX: &str = "_lock";

/// Prefix of DMA channel lock names
pub const DMA_LOCK_PREFIX: &str = "ReadoutCard_DMA_";

// =============================================================================
// DMA
// =============================================================================

/// Depth of the hardware completion FIFO
pub const DMA_FIFO_CAPACITY: usize = 128;

/// Default size of a single DMA page (8 KiB)
pub const DEFAULT_DMA_PAGE_SIZE: usize = 8 * 1024;

/// Default number of superpages that may wait for transfer
pub const DEFAULT_TRANSFER_QUEUE_CAPACITY: usize = 16;

/// Default number of completed superpages held for the caller
pub const DEFAULT_READY_QUEUE_CAPACITY: usize = 32;

/// Required alignment of superpage offsets
pub const SUPERPAGE_OFFSET_ALIGNMENT: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_names_fit_under_limit() {
        // prefix + u64 decimal + suffix
        let longest = LOCK_CLASS_PREFIX_LENGTH + 20 + LOCK_NAME_SUFFIX.len();
        assert!(longest < MAX_SOCKET_NAME_LENGTH);
    }

    #[test]
    fn sca_timeouts_are_short() {
        assert!(SCA_BUSY_TIMEOUT <= Duration::from_millis(10));
        assert!(SCA_CHANNEL_BUSY_TIMEOUT <= Duration::from_millis(10));
    }

    #[test]
    fn default_page_size_is_aligned() {
        assert_eq!(DEFAULT_DMA_PAGE_SIZE % SUPERPAGE_OFFSET_ALIGNMENT, 0);
    }
}
