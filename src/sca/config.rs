//! SCA register block placement and timeouts

use std::time::Duration;

use crate::card::CardType;
use crate::constants::{SCA_BUSY_TIMEOUT, SCA_CHANNEL_BUSY_TIMEOUT};
use crate::error::{ScaError, ScaResult};

/// Where the SCA block of each link sits in the BAR, and how long to wait
/// on it.
///
/// The link-0 block starts at `base_index`; link `n` is `n * link_stride`
/// words further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaConfig {
    /// Word index of the link-0 SCA block
    pub base_index: usize,
    /// Words between consecutive links
    pub link_stride: usize,
    /// Number of links with an SCA block
    pub max_links: u32,
    /// Deadline for the busy flag to clear
    pub busy_timeout: Duration,
    /// Deadline for the channel-busy code to clear
    pub channel_busy_timeout: Duration,
}

impl ScaConfig {
    /// CRU layout: 7 links, 128 KiB apart
    pub const CRU: Self = Self::layout(0x422_4000 / 4, 0x2_0000 / 4, 7);

    /// C-RORC layout: 2 links
    pub const CRORC: Self = Self::layout(0x30 / 4, 0x50 / 4, 2);

    /// Dummy layout: a single link at index 0
    pub const DUMMY: Self = Self::layout(0, 0x100, 1);

    const fn layout(base_index: usize, link_stride: usize, max_links: u32) -> Self {
        Self {
            base_index,
            link_stride,
            max_links,
            busy_timeout: SCA_BUSY_TIMEOUT,
            channel_busy_timeout: SCA_CHANNEL_BUSY_TIMEOUT,
        }
    }

    /// Layout of the given card family with default timeouts
    #[must_use]
    pub const fn for_card(card_type: CardType) -> Self {
        match card_type {
            CardType::Cru => Self::CRU,
            CardType::Crorc => Self::CRORC,
            CardType::Dummy => Self::DUMMY,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the busy-flag timeout
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the channel-busy timeout
    #[must_use]
    pub const fn with_channel_busy_timeout(mut self, timeout: Duration) -> Self {
        self.channel_busy_timeout = timeout;
        self
    }

    /// Word index of the SCA block for `link`.
    ///
    /// # Errors
    /// [`ScaError::LinkOutOfRange`] if `link >= max_links`.
    pub const fn offset(&self, link: u32) -> ScaResult<usize> {
        if link >= self.max_links {
            return Err(ScaError::LinkOutOfRange {
                link,
                max_links: self.max_links,
            });
        }
        Ok(self.base_index + link as usize * self.link_stride)
    }
}
