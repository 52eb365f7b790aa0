//! Buffer and completion FIFO ring bookkeeping
//!
//! Two circular counters move in lockstep: every page handed to hardware
//! occupies one slot in the buffer ring (pages not yet retired) and one slot
//! in the completion FIFO (whose depth is fixed by the hardware). Admission is
//! bounded by whichever ring has less room.
//!
//! Nothing here touches memory; slots are indices only.

/// One circular counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Ring {
    tail: usize,
    size: usize,
}

impl Ring {
    #[inline(always)]
    const fn head(&self, capacity: usize) -> usize {
        if capacity == 0 {
            0
        } else {
            (self.tail + self.size) % capacity
        }
    }

    #[inline(always)]
    fn push(&mut self) {
        self.size += 1;
    }

    #[inline(always)]
    fn pop(&mut self, capacity: usize) {
        self.tail = (self.tail + 1) % capacity;
        self.size -= 1;
    }
}

/// Head/tail tracker over the page buffer and the hardware completion FIFO.
///
/// `FIFO_CAPACITY` is the hardware's completion ring depth. The buffer ring
/// capacity is set at runtime once the DMA buffer is known.
///
/// # Panics
///
/// Advancing without room, retiring from an empty ring, or resizing a
/// non-empty buffer ring are logic errors and panic.
///
/// # Example
///
/// ```
/// use readout_card::dma::RingTracker;
///
/// let mut ring: RingTracker<4> = RingTracker::new();
/// ring.set_buffer_capacity(10);
/// while ring.free() > 0 {
///     ring.advance_head();
/// }
/// assert_eq!(ring.fifo_size(), 4);
/// assert_eq!(ring.buffer_free(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RingTracker<const FIFO_CAPACITY: usize> {
    buffer: Ring,
    buffer_capacity: usize,
    fifo: Ring,
}

impl<const FIFO_CAPACITY: usize> RingTracker<FIFO_CAPACITY> {
    /// Tracker with an empty buffer ring of capacity zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Ring { tail: 0, size: 0 },
            buffer_capacity: 0,
            fifo: Ring { tail: 0, size: 0 },
        }
    }

    /// Tracker with the buffer ring sized to `capacity` pages
    #[must_use]
    pub const fn with_buffer_capacity(capacity: usize) -> Self {
        let mut tracker = Self::new();
        tracker.buffer_capacity = capacity;
        tracker
    }

    /// Set the number of pages the buffer ring holds.
    ///
    /// # Panics
    /// If the buffer ring is not empty.
    pub fn set_buffer_capacity(&mut self, capacity: usize) {
        assert!(
            self.buffer.size == 0,
            "buffer capacity changed with {} pages outstanding",
            self.buffer.size
        );
        self.buffer_capacity = capacity;
        self.buffer.tail = 0;
    }

    /// Empty both rings, keeping the buffer capacity
    pub fn reset(&mut self) {
        self.buffer = Ring::default();
        self.fifo = Ring::default();
    }

    /// Claim one slot in both rings.
    ///
    /// # Panics
    /// If either ring is full. Check [`free`](Self::free) first.
    pub fn advance_head(&mut self) {
        assert!(
            self.buffer_free() > 0,
            "buffer ring full ({} pages)",
            self.buffer_capacity
        );
        assert!(self.fifo_free() > 0, "FIFO full ({FIFO_CAPACITY} entries)");
        self.buffer.push();
        self.fifo.push();
    }

    /// Retire the oldest slot of both rings.
    ///
    /// # Panics
    /// If either ring is empty.
    pub fn advance_tail(&mut self) {
        assert!(self.buffer.size > 0, "buffer ring empty");
        assert!(self.fifo.size > 0, "FIFO empty");
        self.buffer.pop(self.buffer_capacity);
        self.fifo.pop(FIFO_CAPACITY);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Pages that may still be pushed: the smaller of both free counts
    #[inline]
    pub fn free(&self) -> usize {
        self.buffer_free().min(self.fifo_free())
    }

    /// Outstanding pages in the buffer ring
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer.size
    }

    /// Buffer ring capacity in pages
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Free slots in the buffer ring
    #[inline]
    pub fn buffer_free(&self) -> usize {
        self.buffer_capacity - self.buffer.size
    }

    /// Next buffer slot to be claimed
    #[inline]
    pub fn buffer_head(&self) -> usize {
        self.buffer.head(self.buffer_capacity)
    }

    /// Oldest outstanding buffer slot
    #[inline]
    pub fn buffer_tail(&self) -> usize {
        self.buffer.tail
    }

    /// Outstanding FIFO entries
    #[inline]
    pub fn fifo_size(&self) -> usize {
        self.fifo.size
    }

    /// FIFO depth
    #[inline]
    pub const fn fifo_capacity(&self) -> usize {
        FIFO_CAPACITY
    }

    /// Free FIFO entries
    #[inline]
    pub fn fifo_free(&self) -> usize {
        FIFO_CAPACITY - self.fifo.size
    }

    /// Next FIFO slot to be claimed
    #[inline]
    pub fn fifo_head(&self) -> usize {
        self.fifo.head(FIFO_CAPACITY)
    }

    /// Oldest outstanding FIFO slot
    #[inline]
    pub fn fifo_tail(&self) -> usize {
        self.fifo.tail
    }

    /// True if no buffer page is outstanding
    #[inline]
    pub fn is_buffer_empty(&self) -> bool {
        self.buffer.size == 0
    }

    /// True if no FIFO entry is outstanding
    #[inline]
    pub fn is_fifo_empty(&self) -> bool {
        self.fifo.size == 0
    }

    /// True once the buffer tail page has dropped out of the FIFO window
    #[inline]
    pub fn is_buffer_tail_out_of_fifo(&self) -> bool {
        self.buffer.size > FIFO_CAPACITY
    }
}

// =============================================================================
// Tests
// =============================================================================
