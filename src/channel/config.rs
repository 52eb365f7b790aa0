//! Channel session configuration

use crate::card::CardType;
use crate::constants::{
    DEFAULT_DMA_PAGE_SIZE, DEFAULT_READY_QUEUE_CAPACITY, DEFAULT_TRANSFER_QUEUE_CAPACITY,
    DMA_LOCK_PREFIX, LOCK_NAME_SUFFIX, SUPERPAGE_OFFSET_ALIGNMENT,
};
use crate::dma::BufferParameters;
use crate::error::ConfigError;
use crate::lock::LockMode;

/// Everything needed to open a [`ChannelSession`](super::ChannelSession)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Card family
    pub card_type: CardType,
    /// Card identity used in the lock name, typically the PCI address
    pub card_id: String,
    /// DMA channel number
    pub channel: u32,
    /// Registered DMA buffer
    pub buffer: BufferParameters,
    /// DMA page size in bytes
    pub dma_page_size: usize,
    /// Superpages that may wait for transfer
    pub transfer_queue_capacity: usize,
    /// Completed superpages held for the caller
    pub ready_queue_capacity: usize,
    /// Behaviour when the channel lock is held elsewhere
    pub lock_mode: LockMode,
}

impl ChannelConfig {
    /// Configuration with default page size and queue capacities, no
    /// buffer, failing at once if the channel is locked
    pub fn new(card_type: CardType, card_id: impl Into<String>, channel: u32) -> Self {
        Self {
            card_type,
            card_id: card_id.into(),
            channel,
            buffer: BufferParameters::Null,
            dma_page_size: DEFAULT_DMA_PAGE_SIZE,
            transfer_queue_capacity: DEFAULT_TRANSFER_QUEUE_CAPACITY,
            ready_queue_capacity: DEFAULT_READY_QUEUE_CAPACITY,
            lock_mode: LockMode::Immediate,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the DMA buffer
    #[must_use]
    pub fn with_buffer(mut self, buffer: BufferParameters) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the DMA page size
    #[must_use]
    pub fn with_dma_page_size(mut self, page_size: usize) -> Self {
        self.dma_page_size = page_size;
        self
    }

    /// Set the transfer queue capacity
    #[must_use]
    pub fn with_transfer_queue_capacity(mut self, capacity: usize) -> Self {
        self.transfer_queue_capacity = capacity;
        self
    }

    /// Set the ready queue capacity
    #[must_use]
    pub fn with_ready_queue_capacity(mut self, capacity: usize) -> Self {
        self.ready_queue_capacity = capacity;
        self
    }

    /// Set the lock mode
    #[must_use]
    pub fn with_lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }

    /// Wait (with the default timeout) or fail at once on a held lock
    #[must_use]
    pub fn with_wait_on_lock(self, wait_on_lock: bool) -> Self {
        self.with_lock_mode(LockMode::from_wait_flag(wait_on_lock))
    }

    /// Name of the interprocess lock guarding this channel.
    ///
    /// C-RORC channels are locked individually; other cards have a single
    /// DMA engine and one lock for the whole card.
    pub fn lock_name(&self) -> String {
        if self.card_type.has_per_channel_lock() {
            format!(
                "{DMA_LOCK_PREFIX}{}_chan{}{LOCK_NAME_SUFFIX}",
                self.card_id, self.channel
            )
        } else {
            format!("{DMA_LOCK_PREFIX}{}{LOCK_NAME_SUFFIX}", self.card_id)
        }
    }

    /// Number of DMA pages the buffer holds
    pub fn buffer_pages(&self) -> usize {
        self.buffer
            .size()
            .checked_div(self.dma_page_size)
            .unwrap_or(0)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidChannel`] if the card has no such channel
    /// - [`ConfigError::InvalidPageSize`] for a zero or unaligned page size
    /// - [`ConfigError::ZeroQueueCapacity`]
    /// - [`ConfigError::InvalidBuffer`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.card_type.is_channel_allowed(self.channel) {
            return Err(ConfigError::InvalidChannel {
                channel: self.channel,
            });
        }
        if self.dma_page_size == 0 || self.dma_page_size % SUPERPAGE_OFFSET_ALIGNMENT != 0 {
            return Err(ConfigError::InvalidPageSize {
                page_size: self.dma_page_size,
            });
        }
        if self.transfer_queue_capacity == 0 || self.ready_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        self.buffer.validate()
    }
}
