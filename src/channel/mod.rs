//! DMA Channel Session
//!
//! [`ChannelSession`] ties the pieces together for one (card, channel) pair:
//! it holds the channel lock for its whole lifetime, owns the ring and
//! superpage bookkeeping, and drives a [`PageTransport`] with the pages of
//! pushed superpages.
//!
//! # Lifecycle
//!
//! ```text
//! open() ──► Stopped ──start_dma()──► Started ──stop_dma()──► Stopped
//!                                       │  push_superpage()
//!                                       │  fill_superpages()
//!                                       │  pop_superpage()
//! ```
//!
//! Superpages still in transfer at `stop_dma()` are moved to the ready
//! queue with `ready == false`, so the caller gets every superpage back.

pub mod config;
pub mod transport;

pub use config::ChannelConfig;
pub use transport::{LoopbackTransport, PageDescriptor, PageTransport};

use std::collections::VecDeque;

use crate::card::CardType;
use crate::constants::{DMA_FIFO_CAPACITY, SUPERPAGE_OFFSET_ALIGNMENT};
use crate::dma::{RingTracker, Superpage, SuperpageTracker};
use crate::error::{DmaError, Result, ScaResult};
use crate::hal::StdDelay;
use crate::lock::ChannelLock;
use crate::register::RegisterPort;
use crate::sca::ScaEngine;

/// DMA run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaState {
    /// No run in progress
    #[default]
    Stopped,
    /// Pages are being handed to hardware
    Started,
}

/// Exclusive session on one DMA channel.
pub struct ChannelSession<R: RegisterPort, T: PageTransport> {
    config: ChannelConfig,
    bar: R,
    transport: T,
    ring: RingTracker<DMA_FIFO_CAPACITY>,
    tracker: SuperpageTracker,
    /// Pages handed to the transport, oldest first
    in_flight: VecDeque<PageDescriptor>,
    state: DmaState,
    // Last field: released after everything above is torn down.
    lock: ChannelLock,
}

impl<R: RegisterPort, T: PageTransport> ChannelSession<R, T> {
    /// Validate `config`, take the channel lock and set up bookkeeping.
    ///
    /// The session starts with DMA stopped.
    ///
    /// # Errors
    /// [`Error::Config`](crate::error::Error::Config) for an invalid
    /// configuration, [`Error::Lock`](crate::error::Error::Lock) if the
    /// channel is held by another session.
    pub fn open(config: ChannelConfig, bar: R, transport: T) -> Result<Self> {
        config.validate()?;

        let lock_name = config.lock_name();
        log::info!(
            "Acquiring DMA channel lock for {} channel {}",
            config.card_type,
            config.channel
        );
        let lock = ChannelLock::acquire_with(&lock_name, config.lock_mode, &mut StdDelay)?;

        let ring = RingTracker::with_buffer_capacity(config.buffer_pages());
        let tracker = SuperpageTracker::new(
            config.dma_page_size,
            config.transfer_queue_capacity,
            config.ready_queue_capacity,
        );

        Ok(Self {
            config,
            bar,
            transport,
            ring,
            tracker,
            in_flight: VecDeque::with_capacity(DMA_FIFO_CAPACITY),
            state: DmaState::Stopped,
            lock,
        })
    }

    // =========================================================================
    // DMA Control
    // =========================================================================

    /// Begin a run. Queues and rings start empty.
    ///
    /// Starting a started channel is ignored.
    ///
    /// # Errors
    /// Whatever the transport reports while starting.
    pub fn start_dma(&mut self) -> Result<()> {
        if self.state == DmaState::Started {
            log::warn!("DMA already started. Ignoring start_dma() call");
            return Ok(());
        }
        log::info!("Starting DMA on channel {}", self.config.channel);
        self.ring.reset();
        self.in_flight.clear();
        self.tracker.clear();
        self.transport.start()?;
        self.state = DmaState::Started;
        Ok(())
    }

    /// End the run.
    ///
    /// Pages that already landed are credited, then every superpage still
    /// in transfer is moved to the ready queue. Stopping a stopped channel
    /// is ignored.
    ///
    /// Teardown always completes; the first error met on the way is
    /// returned afterwards.
    ///
    /// # Errors
    /// Page accounting errors, or whatever the transport reports while
    /// polling or stopping.
    pub fn stop_dma(&mut self) -> Result<()> {
        if self.state == DmaState::Stopped {
            log::warn!("DMA already stopped. Ignoring stop_dma() call");
            return Ok(());
        }
        log::info!("Stopping DMA on channel {}", self.config.channel);

        let collected = self.collect_arrivals();
        self.tracker.promote_completed();
        let stopped = self.transport.stop();

        let reclaimed = self.tracker.reclaim();
        if reclaimed > 0 {
            log::warn!("{reclaimed} superpage(s) still in transfer moved to the ready queue");
        }
        self.in_flight.clear();
        self.ring.reset();
        self.state = DmaState::Stopped;
        collected.and(stopped)
    }

    /// Current run state
    pub fn dma_state(&self) -> DmaState {
        self.state
    }

    // =========================================================================
    // Superpages
    // =========================================================================

    /// Queue a superpage and hand as many of its pages to hardware as the
    /// rings allow.
    ///
    /// # Errors
    /// - [`DmaError::NotStarted`]
    /// - [`DmaError::OutOfRange`] if it extends past the buffer
    /// - [`DmaError::MisalignedOffset`] if the offset is not 32-bit aligned
    /// - any [`SuperpageTracker::push`] error
    ///
    /// Once queued the superpage is accepted. A transport failure while
    /// handing out its pages is logged and surfaces from the next
    /// [`fill_superpages`](Self::fill_superpages), which retries them.
    pub fn push_superpage(&mut self, superpage: Superpage) -> Result<()> {
        if self.state != DmaState::Started {
            return Err(DmaError::NotStarted.into());
        }
        let buffer_size = self.config.buffer.size();
        let end = superpage.offset().checked_add(superpage.size());
        if end.is_none_or(|end| end > buffer_size) {
            return Err(DmaError::OutOfRange {
                offset: superpage.offset(),
                size: superpage.size(),
                buffer_size,
            }
            .into());
        }
        if superpage.offset() % SUPERPAGE_OFFSET_ALIGNMENT != 0 {
            return Err(DmaError::MisalignedOffset {
                offset: superpage.offset(),
            }
            .into());
        }
        self.tracker.push(superpage)?;
        if let Err(error) = self.push_pages() {
            log::warn!("Page push deferred to the next fill: {error}");
        }
        Ok(())
    }

    /// Credit landed pages, move completed superpages to the ready queue
    /// and refill the hardware with pending pages.
    ///
    /// Returns how many superpages became ready.
    ///
    /// # Errors
    /// [`DmaError::NotStarted`], page accounting errors, transport errors.
    pub fn fill_superpages(&mut self) -> Result<usize> {
        if self.state != DmaState::Started {
            return Err(DmaError::NotStarted.into());
        }
        self.collect_arrivals()?;
        let promoted = self.tracker.promote_completed();
        self.push_pages()?;
        Ok(promoted)
    }

    /// Oldest superpage in the ready queue
    pub fn front_superpage(&self) -> Option<&Superpage> {
        self.tracker.front()
    }

    /// Take the oldest ready superpage, freeing its offset for reuse.
    ///
    /// # Errors
    /// [`DmaError::ReadyQueueEmpty`]
    pub fn pop_superpage(&mut self) -> Result<Superpage> {
        Ok(self.tracker.pop()?)
    }

    /// Free slots in the transfer queue
    pub fn transfer_queue_available(&self) -> usize {
        self.tracker.transfer_queue_available()
    }

    /// Superpages in the ready queue
    pub fn ready_queue_size(&self) -> usize {
        self.tracker.ready_queue_len()
    }

    /// True if no superpage waits for transfer
    pub fn is_transfer_queue_empty(&self) -> bool {
        self.tracker.is_transfer_queue_empty()
    }

    /// True if the ready queue is at capacity
    pub fn is_ready_queue_full(&self) -> bool {
        self.tracker.is_ready_queue_full()
    }

    /// Page ring bookkeeping
    pub fn ring(&self) -> &RingTracker<DMA_FIFO_CAPACITY> {
        &self.ring
    }

    fn push_pages(&mut self) -> Result<()> {
        while self.ring.free() > 0 {
            let Some(offset) = self.tracker.next_page() else {
                break;
            };
            let page = PageDescriptor {
                fifo_index: self.ring.fifo_head(),
                buffer_index: self.ring.buffer_head(),
                offset,
                size: self.tracker.page_size(),
            };
            self.transport.push_page(&page)?;
            self.tracker.page_pushed();
            self.ring.advance_head();
            self.in_flight.push_back(page);
        }
        Ok(())
    }

    fn collect_arrivals(&mut self) -> Result<()> {
        while let Some(page) = self.in_flight.front().copied() {
            let Some(length) = self.transport.poll_page(&page)? else {
                break;
            };
            debug_assert_eq!(page.fifo_index, self.ring.fifo_tail());
            // The page leaves the FIFO whether or not its report is accepted.
            let credited = self.tracker.page_arrived(length);
            self.ring.advance_tail();
            self.in_flight.pop_front();
            credited?;
        }
        Ok(())
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Read a BAR register
    ///
    /// # Errors
    /// [`Error::Register`](crate::error::Error::Register)
    pub fn read_register(&mut self, index: usize) -> Result<u32> {
        Ok(self.bar.read_register(index)?)
    }

    /// Write a BAR register
    ///
    /// # Errors
    /// [`Error::Register`](crate::error::Error::Register)
    pub fn write_register(&mut self, index: usize, value: u32) -> Result<()> {
        Ok(self.bar.write_register(index, value)?)
    }

    /// Read-modify-write a field of a BAR register
    ///
    /// # Errors
    /// [`Error::Register`](crate::error::Error::Register)
    pub fn modify_register(
        &mut self,
        index: usize,
        position: u32,
        width: u32,
        value: u32,
    ) -> Result<()> {
        Ok(self.bar.modify_register(index, position, width, value)?)
    }

    /// SCA engine for `link`, borrowing this session's BAR
    ///
    /// # Errors
    /// [`ScaError::LinkOutOfRange`](crate::error::ScaError::LinkOutOfRange)
    pub fn sca(&mut self, link: u32) -> ScaResult<ScaEngine<&mut R>> {
        ScaEngine::new(&mut self.bar, self.config.card_type, link)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Session configuration
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Card family
    pub fn card_type(&self) -> CardType {
        self.config.card_type
    }

    /// DMA channel number
    pub fn channel(&self) -> u32 {
        self.config.channel
    }

    /// The held channel lock
    pub fn lock(&self) -> &ChannelLock {
        &self.lock
    }

    /// Page transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable page transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<R: RegisterPort, T: PageTransport> Drop for ChannelSession<R, T> {
    fn drop(&mut self) {
        if self.state == DmaState::Started {
            if let Err(error) = self.transport.stop() {
                log::warn!("Failed to stop DMA on close: {error}");
            }
        }
        let transfer = self.tracker.transfer_queue_len();
        let ready = self.tracker.ready_queue_len();
        if transfer > 0 || ready > 0 {
            log::warn!("Closing with superpages left: {transfer} in transfer, {ready} ready");
        }
        log::info!("Releasing DMA channel lock for channel {}", self.config.channel);
    }
}

impl<R: RegisterPort, T: PageTransport> core::fmt::Debug for ChannelSession<R, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelSession")
            .field("card_type", &self.config.card_type)
            .field("channel", &self.config.channel)
            .field("state", &self.state)
            .field("pages_in_flight", &self.in_flight.len())
            .field("lock", &self.lock.socket_name())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
