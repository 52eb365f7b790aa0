//! Superpage transfer and ready queues
//!
//! Superpages move through two bounded queues:
//!
//! ```text
//! push() ──► transfer queue ──(all pages arrived)──► ready queue ──► pop()
//!              │ pages handed out in order                ▲
//!              └────────────── reclaim() on stop ─────────┘
//! ```
//!
//! Pages of the oldest superpage are handed to hardware first, and page
//! acknowledgements always credit the oldest superpage with pages in
//! flight, so both queues stay in push order.

use std::collections::{HashSet, VecDeque};

use super::superpage::Superpage;
use crate::error::{DmaError, DmaResult};

/// Superpage in the transfer queue with its page counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    superpage: Superpage,
    /// Total DMA pages in the superpage
    pages: usize,
    /// Pages handed to hardware
    pushed_pages: usize,
    /// Pages acknowledged by hardware
    arrived_pages: usize,
}

impl Entry {
    fn is_complete(&self) -> bool {
        self.arrived_pages == self.pages
    }
}

/// Bookkeeping of superpages between push and pop.
#[derive(Debug)]
pub struct SuperpageTracker {
    page_size: usize,
    transfer: VecDeque<Entry>,
    transfer_capacity: usize,
    ready: VecDeque<Superpage>,
    ready_capacity: usize,
    live_offsets: HashSet<usize>,
}

impl SuperpageTracker {
    /// Tracker splitting superpages into `page_size`-byte DMA pages.
    ///
    /// Capacities are validated by the channel configuration; a zero page
    /// size makes every push fail.
    #[must_use]
    pub fn new(page_size: usize, transfer_capacity: usize, ready_capacity: usize) -> Self {
        Self {
            page_size,
            transfer: VecDeque::with_capacity(transfer_capacity),
            transfer_capacity,
            ready: VecDeque::with_capacity(ready_capacity),
            ready_capacity,
            live_offsets: HashSet::with_capacity(transfer_capacity + ready_capacity),
        }
    }

    /// Queue a superpage for transfer.
    ///
    /// # Errors
    /// - [`DmaError::TransferQueueFull`]
    /// - [`DmaError::EmptySuperpage`] for a zero size
    /// - [`DmaError::SizeNotPageMultiple`]
    /// - [`DmaError::OffsetInUse`] if a live superpage has the same offset
    pub fn push(&mut self, superpage: Superpage) -> DmaResult<()> {
        if self.transfer.len() >= self.transfer_capacity {
            return Err(DmaError::TransferQueueFull);
        }
        if superpage.size() == 0 {
            return Err(DmaError::EmptySuperpage);
        }
        if self.page_size == 0 || superpage.size() % self.page_size != 0 {
            return Err(DmaError::SizeNotPageMultiple {
                size: superpage.size(),
                page_size: self.page_size,
            });
        }
        if !self.live_offsets.insert(superpage.offset()) {
            return Err(DmaError::OffsetInUse {
                offset: superpage.offset(),
            });
        }
        self.transfer.push_back(Entry {
            superpage,
            pages: superpage.size() / self.page_size,
            pushed_pages: 0,
            arrived_pages: 0,
        });
        Ok(())
    }

    /// Buffer offset of the next page to hand to hardware, if any.
    ///
    /// Does not consume the page; call [`page_pushed`](Self::page_pushed)
    /// once the hardware accepted it.
    pub fn next_page(&self) -> Option<usize> {
        self.transfer
            .iter()
            .find(|entry| entry.pushed_pages < entry.pages)
            .map(|entry| entry.superpage.offset() + entry.pushed_pages * self.page_size)
    }

    /// Mark the page returned by [`next_page`](Self::next_page) as pushed
    pub fn page_pushed(&mut self) {
        if let Some(entry) = self
            .transfer
            .iter_mut()
            .find(|entry| entry.pushed_pages < entry.pages)
        {
            entry.pushed_pages += 1;
        }
    }

    /// Credit `bytes` to the oldest superpage with a page in flight.
    ///
    /// An oversized report still retires the page, with nothing credited,
    /// so the superpage can complete with `received < size`.
    ///
    /// # Errors
    /// [`DmaError::UnexpectedArrival`] if no page is in flight,
    /// [`DmaError::PageOverrun`] if `bytes` exceeds the page size.
    pub fn page_arrived(&mut self, bytes: usize) -> DmaResult<()> {
        let page_size = self.page_size;
        let entry = self
            .transfer
            .iter_mut()
            .find(|entry| entry.arrived_pages < entry.pushed_pages)
            .ok_or(DmaError::UnexpectedArrival)?;
        entry.arrived_pages += 1;
        if bytes > page_size {
            return Err(DmaError::PageOverrun {
                length: bytes,
                page_size,
            });
        }
        let received = entry.superpage.received() + bytes;
        entry.superpage.set_received(received)
    }

    /// Move completed superpages to the ready queue while it has room.
    ///
    /// Returns how many superpages were moved.
    pub fn promote_completed(&mut self) -> usize {
        let mut moved = 0;
        while self.ready.len() < self.ready_capacity
            && self.transfer.front().is_some_and(Entry::is_complete)
        {
            if let Some(mut entry) = self.transfer.pop_front() {
                entry.superpage.mark_ready();
                self.ready.push_back(entry.superpage);
                moved += 1;
            }
        }
        moved
    }

    /// Move every superpage still in the transfer queue to the ready queue.
    ///
    /// Completed superpages are marked ready; the rest keep `ready == false`
    /// with whatever bytes had arrived. The ready queue may grow past its
    /// capacity so that no superpage is lost.
    ///
    /// Returns how many superpages were moved.
    pub fn reclaim(&mut self) -> usize {
        let moved = self.transfer.len();
        for mut entry in self.transfer.drain(..) {
            if entry.is_complete() {
                entry.superpage.mark_ready();
            }
            self.ready.push_back(entry.superpage);
        }
        moved
    }

    /// Oldest superpage in the ready queue
    pub fn front(&self) -> Option<&Superpage> {
        self.ready.front()
    }

    /// Take the oldest superpage from the ready queue, releasing its offset.
    ///
    /// # Errors
    /// [`DmaError::ReadyQueueEmpty`]
    pub fn pop(&mut self) -> DmaResult<Superpage> {
        let superpage = self.ready.pop_front().ok_or(DmaError::ReadyQueueEmpty)?;
        self.live_offsets.remove(&superpage.offset());
        Ok(superpage)
    }

    /// Forget every superpage and release all offsets
    pub fn clear(&mut self) {
        self.transfer.clear();
        self.ready.clear();
        self.live_offsets.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// DMA page size in bytes
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True if `offset` belongs to a superpage not yet popped
    pub fn is_live(&self, offset: usize) -> bool {
        self.live_offsets.contains(&offset)
    }

    /// Superpages waiting for transfer
    #[inline]
    pub fn transfer_queue_len(&self) -> usize {
        self.transfer.len()
    }

    /// Transfer queue capacity
    #[inline]
    pub fn transfer_queue_capacity(&self) -> usize {
        self.transfer_capacity
    }

    /// Free slots in the transfer queue
    #[inline]
    pub fn transfer_queue_available(&self) -> usize {
        self.transfer_capacity.saturating_sub(self.transfer.len())
    }

    /// True if no superpage is waiting for transfer
    #[inline]
    pub fn is_transfer_queue_empty(&self) -> bool {
        self.transfer.is_empty()
    }

    /// Superpages waiting to be popped
    #[inline]
    pub fn ready_queue_len(&self) -> usize {
        self.ready.len()
    }

    /// Ready queue capacity
    #[inline]
    pub fn ready_queue_capacity(&self) -> usize {
        self.ready_capacity
    }

    /// True if the ready queue is at or above capacity
    #[inline]
    pub fn is_ready_queue_full(&self) -> bool {
        self.ready.len() >= self.ready_capacity
    }

    /// Pages handed to hardware and not yet acknowledged
    pub fn pages_in_flight(&self) -> usize {
        self.transfer
            .iter()
            .map(|entry| entry.pushed_pages - entry.arrived_pages)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: usize = 1024;

    fn tracker() -> SuperpageTracker {
        SuperpageTracker::new(PAGE, 4, 2)
    }

    /// Push and acknowledge every page currently available
    fn run_all_pages(tracker: &mut SuperpageTracker) {
        while tracker.next_page().is_some() {
            tracker.page_pushed();
            tracker.page_arrived(PAGE).unwrap();
        }
    }

    // =========================================================================
    // Push Validation Tests
    // =========================================================================

    #[test]
    fn push_rejects_zero_size() {
        let mut t = tracker();
        assert_eq!(t.push(Superpage::new(0, 0)), Err(DmaError::EmptySuperpage));
        assert!(!t.is_live(0));
    }

    #[test]
    fn push_rejects_partial_pages() {
        let mut t = tracker();
        assert_eq!(
            t.push(Superpage::new(0, PAGE + 4)),
            Err(DmaError::SizeNotPageMultiple {
                size: PAGE + 4,
                page_size: PAGE
            })
        );
    }

    #[test]
    fn push_rejects_live_offset_until_popped() {
        let mut t = tracker();
        t.push(Superpage::new(0, PAGE)).unwrap();
        assert_eq!(
            t.push(Superpage::new(0, 2 * PAGE)),
            Err(DmaError::OffsetInUse { offset: 0 })
        );

        run_all_pages(&mut t);
        t.promote_completed();
        assert_eq!(
            t.push(Superpage::new(0, PAGE)),
            Err(DmaError::OffsetInUse { offset: 0 })
        );

        t.pop().unwrap();
        assert!(!t.is_live(0));
        t.push(Superpage::new(0, PAGE)).unwrap();
    }

    #[test]
    fn push_rejects_when_transfer_queue_full() {
        let mut t = tracker();
        for i in 0..4 {
            t.push(Superpage::new(i * PAGE, PAGE)).unwrap();
        }
        assert_eq!(t.transfer_queue_available(), 0);
        assert_eq!(
            t.push(Superpage::new(8 * PAGE, PAGE)),
            Err(DmaError::TransferQueueFull)
        );
    }

    // =========================================================================
    // Page Flow Tests
    // =========================================================================

    #[test]
    fn pages_handed_out_in_order() {
        let mut t = tracker();
        t.push(Superpage::new(0x10000, 2 * PAGE)).unwrap();
        t.push(Superpage::new(0x40000, PAGE)).unwrap();

        let mut offsets = Vec::new();
        while let Some(offset) = t.next_page() {
            offsets.push(offset);
            t.page_pushed();
        }
        assert_eq!(offsets, vec![0x10000, 0x10000 + PAGE, 0x40000]);
        assert_eq!(t.pages_in_flight(), 3);
    }

    #[test]
    fn next_page_is_idempotent_until_pushed() {
        let mut t = tracker();
        t.push(Superpage::new(0, 2 * PAGE)).unwrap();
        assert_eq!(t.next_page(), Some(0));
        assert_eq!(t.next_page(), Some(0));
        t.page_pushed();
        assert_eq!(t.next_page(), Some(PAGE));
    }

    #[test]
    fn arrival_without_push_is_rejected() {
        let mut t = tracker();
        t.push(Superpage::new(0, PAGE)).unwrap();
        assert_eq!(t.page_arrived(PAGE), Err(DmaError::UnexpectedArrival));
    }

    #[test]
    fn arrival_larger_than_page_is_rejected() {
        let mut t = tracker();
        t.push(Superpage::new(0, PAGE)).unwrap();
        t.page_pushed();
        assert_eq!(
            t.page_arrived(PAGE + 1),
            Err(DmaError::PageOverrun {
                length: PAGE + 1,
                page_size: PAGE
            })
        );
        // Page retired with nothing credited
        assert_eq!(t.promote_completed(), 1);
        let sp = t.pop().unwrap();
        assert!(sp.is_ready());
        assert_eq!(sp.received(), 0);
    }

    #[test]
    fn completed_superpage_becomes_ready_and_filled() {
        let mut t = tracker();
        t.push(Superpage::new(0, 2 * PAGE).with_user_data(7)).unwrap();
        t.page_pushed();
        t.page_arrived(PAGE).unwrap();
        assert_eq!(t.promote_completed(), 0);
        assert!(t.front().is_none());

        t.page_pushed();
        t.page_arrived(PAGE).unwrap();
        assert_eq!(t.promote_completed(), 1);

        let sp = t.pop().unwrap();
        assert!(sp.is_ready());
        assert!(sp.is_filled());
        assert_eq!(sp.user_data(), 7);
    }

    #[test]
    fn short_pages_leave_superpage_ready_but_not_filled() {
        let mut t = tracker();
        t.push(Superpage::new(0, 2 * PAGE)).unwrap();
        t.page_pushed();
        t.page_pushed();
        t.page_arrived(PAGE).unwrap();
        t.page_arrived(100).unwrap();
        t.promote_completed();

        let sp = t.pop().unwrap();
        assert!(sp.is_ready());
        assert!(!sp.is_filled());
        assert_eq!(sp.received(), PAGE + 100);
    }

    #[test]
    fn promotion_stops_at_ready_capacity() {
        let mut t = tracker();
        for i in 0..3 {
            t.push(Superpage::new(i * PAGE, PAGE)).unwrap();
        }
        run_all_pages(&mut t);
        assert_eq!(t.promote_completed(), 2);
        assert!(t.is_ready_queue_full());
        assert_eq!(t.transfer_queue_len(), 1);

        t.pop().unwrap();
        assert_eq!(t.promote_completed(), 1);
        assert!(t.is_transfer_queue_empty());
    }

    // =========================================================================
    // Reclaim Tests
    // =========================================================================

    #[test]
    fn reclaim_moves_unfinished_as_not_ready() {
        let mut t = tracker();
        t.push(Superpage::new(0, 2 * PAGE)).unwrap();
        t.push(Superpage::new(4 * PAGE, PAGE)).unwrap();
        t.page_pushed();
        t.page_arrived(PAGE).unwrap();

        assert_eq!(t.reclaim(), 2);
        assert!(t.is_transfer_queue_empty());

        let first = t.pop().unwrap();
        assert!(!first.is_ready());
        assert_eq!(first.received(), PAGE);
        let second = t.pop().unwrap();
        assert!(!second.is_ready());
        assert_eq!(second.received(), 0);
        assert_eq!(t.pop(), Err(DmaError::ReadyQueueEmpty));
    }

    #[test]
    fn reclaim_may_exceed_ready_capacity() {
        let mut t = tracker();
        for i in 0..4 {
            t.push(Superpage::new(i * PAGE, PAGE)).unwrap();
        }
        t.reclaim();
        assert_eq!(t.ready_queue_len(), 4);
        assert!(t.is_ready_queue_full());
    }

    #[test]
    fn clear_releases_everything() {
        let mut t = tracker();
        t.push(Superpage::new(0, PAGE)).unwrap();
        t.clear();
        assert!(!t.is_live(0));
        assert_eq!(t.transfer_queue_len(), 0);
        assert_eq!(t.ready_queue_len(), 0);
    }
}
