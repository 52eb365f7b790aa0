//! Page hand-off to the DMA engine

use std::collections::VecDeque;

use crate::error::Result;

/// One DMA page as handed to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageDescriptor {
    /// Completion FIFO slot the hardware reports this page in
    pub fifo_index: usize,
    /// Buffer ring slot
    pub buffer_index: usize,
    /// Byte offset into the DMA buffer
    pub offset: usize,
    /// Page size in bytes
    pub size: usize,
}

/// Card-specific DMA page queueing.
///
/// The session decides which page goes where; a transport only tells the
/// hardware about it and reports when it has landed. Pages are pushed and
/// polled in the same order.
pub trait PageTransport {
    /// Prepare the engine before the first page of a run
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Halt the engine at the end of a run
    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Hand one page to the hardware
    fn push_page(&mut self, page: &PageDescriptor) -> Result<()>;

    /// Bytes written into `page`, or `None` while it is still in flight
    fn poll_page(&mut self, page: &PageDescriptor) -> Result<Option<usize>>;
}

/// Transport that completes every page in full as soon as it is pushed.
///
/// This is what the Dummy card does.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    pending: VecDeque<PageDescriptor>,
    running: bool,
}

impl LoopbackTransport {
    /// Create an idle loopback transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages pushed and not yet polled
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl PageTransport for LoopbackTransport {
    fn start(&mut self) -> Result<()> {
        self.pending.clear();
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn push_page(&mut self, page: &PageDescriptor) -> Result<()> {
        self.pending.push_back(*page);
        Ok(())
    }

    fn poll_page(&mut self, page: &PageDescriptor) -> Result<Option<usize>> {
        match self.pending.front() {
            Some(front) if front == page => {
                self.pending.pop_front();
                Ok(Some(page.size))
            }
            _ => Ok(None),
        }
    }
}
