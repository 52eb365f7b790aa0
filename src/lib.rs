//! Readout Card Core
//!
//! Host-side core for CRORC and CRU PCIe readout cards: DMA buffer
//! bookkeeping, the SCA slow-control protocol over BAR registers, and the
//! interprocess lock that gives one process exclusive use of a DMA channel.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! 1. **Session Layer** ([`channel`]): [`ChannelSession`] owns a locked DMA
//!    channel and moves superpages between the caller and the hardware
//! 2. **Protocol Layer** ([`sca`], [`dma`]): SCA command sequencing and the
//!    ring and superpage accounting
//! 3. **Host Layer** ([`register`], [`lock`], [`hal`]): BAR register access,
//!    the abstract-socket channel lock, delays and deadlines
//!
//! Everything that touches hardware goes through [`RegisterPort`] or
//! [`PageTransport`], so every layer can be exercised with mocks.
//!
//! # Supported Cards
//!
//! - [`CardType::Crorc`]: 6 DMA channels, one lock per channel, 2 SCA links
//! - [`CardType::Cru`]: 1 DMA channel, one lock per card, 7 SCA links
//! - [`CardType::Dummy`]: software-only card for tests and dry runs
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for error and plain data types
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade. Lock acquisition and DMA
//! start/stop are `info`, ignored repeated start/stop calls and SCA
//! hardware errors are `warn`, register-level SCA traffic is `debug`. The
//! application picks the backend.
//!
//! # Example
//!
//! ```no_run
//! use readout_card::{
//!     BufferParameters, CardType, ChannelConfig, ChannelSession, LoopbackTransport, Superpage,
//! };
//! use readout_card::register::DummyBar;
//!
//! let config = ChannelConfig::new(CardType::Dummy, "dummy-0", 0)
//!     .with_dma_page_size(8 * 1024)
//!     .with_buffer(BufferParameters::Memory {
//!         address: 0x1000_0000,
//!         size: 1 << 20,
//!     })
//!     .with_wait_on_lock(true);
//!
//! let mut session = ChannelSession::open(config, DummyBar, LoopbackTransport::new())?;
//! session.start_dma()?;
//! session.push_superpage(Superpage::new(0, 64 * 1024))?;
//! session.fill_superpages()?;
//!
//! while let Ok(superpage) = session.pop_superpage() {
//!     println!("{} bytes at {:#x}", superpage.received(), superpage.offset());
//! }
//! session.stop_dma()?;
//! # Ok::<(), readout_card::Error>(())
//! ```

#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live in Cargo.toml; the ones below are crate-specific.
#![warn(
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::uninlined_format_args
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

// =============================================================================
// Modules
// =============================================================================

pub mod card;
pub mod channel;
pub mod constants;
pub mod dma;
pub mod error;
pub mod hal;
pub mod lock;
pub mod register;
pub mod sca;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use card::CardType;
pub use channel::{
    ChannelConfig, ChannelSession, DmaState, LoopbackTransport, PageDescriptor, PageTransport,
};
pub use dma::{BufferParameters, RingTracker, Superpage, SuperpageTracker};
pub use error::{
    ConfigError, DmaError, DmaResult, Error, LockError, LockResult, RegisterError,
    RegisterResult, Result, ScaError, ScaErrorFlag, ScaErrorFlags, ScaResult,
};
pub use lock::{ChannelLock, LockMode};
pub use register::RegisterPort;
pub use sca::{CommandData, ReadResult, ScaConfig, ScaEngine};
