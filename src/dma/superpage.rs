//! Superpage: a caller-owned region of the DMA buffer

use crate::error::{DmaError, DmaResult};

/// A contiguous region of the DMA buffer tracked as one completion unit.
///
/// `offset` is fixed for the superpage's lifetime and identifies it; no two
/// live superpages on a channel share one. `received` only grows and `ready`
/// only goes from false to true.
///
/// A superpage may be ready without being filled, when DMA stops early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Superpage {
    offset: usize,
    size: usize,
    received: usize,
    ready: bool,
    user_data: u64,
}

impl Superpage {
    /// Superpage of `size` bytes at `offset` into the DMA buffer
    #[must_use]
    pub const fn new(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            received: 0,
            ready: false,
            user_data: 0,
        }
    }

    /// Attach an opaque tag, returned unchanged when the superpage is popped
    #[must_use]
    pub const fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Byte offset from the start of the DMA buffer
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Bytes confirmed transferred
    #[inline]
    pub const fn received(&self) -> usize {
        self.received
    }

    /// Caller tag
    #[inline]
    pub const fn user_data(&self) -> u64 {
        self.user_data
    }

    /// True when every byte has been transferred
    #[inline]
    pub const fn is_filled(&self) -> bool {
        self.received == self.size
    }

    /// True once the transfer is over, filled or not
    #[inline]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Record the number of bytes transferred so far.
    ///
    /// # Errors
    /// [`DmaError::ReceivedRollback`] if `received` is below the current
    /// count, [`DmaError::ReceivedOverflow`] if it exceeds the size.
    pub fn set_received(&mut self, received: usize) -> DmaResult<()> {
        if received < self.received {
            return Err(DmaError::ReceivedRollback {
                current: self.received,
                requested: received,
            });
        }
        if received > self.size {
            return Err(DmaError::ReceivedOverflow {
                requested: received,
                size: self.size,
            });
        }
        self.received = received;
        Ok(())
    }

    /// Set the ready flag.
    ///
    /// Setting the current value again is a no-op.
    ///
    /// # Errors
    /// [`DmaError::ReadyRollback`] when clearing a ready superpage.
    pub fn set_ready(&mut self, ready: bool) -> DmaResult<()> {
        if self.ready && !ready {
            return Err(DmaError::ReadyRollback {
                offset: self.offset,
            });
        }
        self.ready = ready;
        Ok(())
    }

    #[inline]
    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
    }
}
