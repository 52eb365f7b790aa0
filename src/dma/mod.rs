//! DMA Bookkeeping
//!
//! Process-local accounting of the DMA buffer's consumption. Nothing in this
//! module performs I/O or synchronization: it is owned by whichever process
//! holds the channel lock.
//!
//! # Architecture
//!
//! - [`RingTracker`]: buffer ring and completion FIFO head/tail counters
//! - [`Superpage`]: caller-defined region tracked as one completion unit
//! - [`SuperpageTracker`]: transfer and ready queues over page acknowledgements
//! - [`BufferParameters`]: the registered DMA buffer description
//!
//! # Example
//!
//! ```
//! use readout_card::dma::{Superpage, SuperpageTracker};
//!
//! let mut tracker = SuperpageTracker::new(8192, 16, 32);
//! tracker.push(Superpage::new(0, 2 * 8192)).unwrap();
//!
//! while tracker.next_page().is_some() {
//!     tracker.page_pushed();
//!     tracker.page_arrived(8192).unwrap();
//! }
//! tracker.promote_completed();
//!
//! let superpage = tracker.pop().unwrap();
//! assert!(superpage.is_ready() && superpage.is_filled());
//! ```

pub mod buffer;
pub mod ring;
pub mod superpage;
pub mod tracker;

pub use buffer::BufferParameters;
pub use ring::RingTracker;
pub use superpage::Superpage;
pub use tracker::SuperpageTracker;
