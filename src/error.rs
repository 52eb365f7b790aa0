//! Error types for the readout card core
//!
//! Errors are organized by domain for better diagnostics:
//! - [`RegisterError`]: BAR register access failures
//! - [`ScaError`]: SCA slow-control protocol failures
//! - [`LockError`]: Interprocess channel lock failures
//! - [`DmaError`]: Superpage and transfer queue failures
//! - [`ConfigError`]: Invalid channel configuration
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by [`ChannelSession`](crate::channel::ChannelSession) methods.
//!
//! Ring capacity violations are not represented here: advancing a
//! [`RingTracker`](crate::dma::RingTracker) without room is a logic bug and
//! panics.

use core::fmt;
use std::time::Duration;

use nix::errno::Errno;

// =============================================================================
// Register Errors
// =============================================================================

/// BAR register access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// Index lies outside the mapped BAR window
    #[error("register index {index} is outside the mapped range of {limit} registers")]
    OutOfRange {
        /// Requested 32-bit word index
        index: usize,
        /// Number of registers in the window
        limit: usize,
    },
    /// Index lies inside a range that must not be written
    #[error("register index {index} is protected against writes")]
    Protected {
        /// Requested 32-bit word index
        index: usize,
    },
}

// =============================================================================
// SCA Errors
// =============================================================================

/// Error bits reported in the low byte of an SCA read command word.
///
/// Only bits 0..=6 carry error information; bit 7 is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaErrorFlags(u8);

/// A single SCA error bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ScaErrorFlag {
    /// Bit 0
    Generic = 0,
    /// Bit 1
    InvalidChannel = 1,
    /// Bit 2
    InvalidCommand = 2,
    /// Bit 3
    InvalidTransactionNumber = 3,
    /// Bit 4
    InvalidLength = 4,
    /// Bit 5
    ChannelNotEnabled = 5,
    /// Bit 6
    ChannelBusy = 6,
}

impl ScaErrorFlag {
    /// All decodable flags in bit order
    pub const ALL: [ScaErrorFlag; 7] = [
        ScaErrorFlag::Generic,
        ScaErrorFlag::InvalidChannel,
        ScaErrorFlag::InvalidCommand,
        ScaErrorFlag::InvalidTransactionNumber,
        ScaErrorFlag::InvalidLength,
        ScaErrorFlag::ChannelNotEnabled,
        ScaErrorFlag::ChannelBusy,
    ];

    /// Bit mask of this flag within the error byte
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    /// Returns a human-readable description of the flag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ScaErrorFlag::Generic => "generic error flag",
            ScaErrorFlag::InvalidChannel => "invalid channel request",
            ScaErrorFlag::InvalidCommand => "invalid command request",
            ScaErrorFlag::InvalidTransactionNumber => "invalid transaction number",
            ScaErrorFlag::InvalidLength => "invalid length",
            ScaErrorFlag::ChannelNotEnabled => "channel not enabled",
            ScaErrorFlag::ChannelBusy => "channel busy",
        }
    }
}

impl ScaErrorFlags {
    /// Bits 0..=6 of the command low byte
    pub const MASK: u8 = 0x7F;

    /// Decode the error byte of a read command word.
    ///
    /// Returns `None` when no error bit is set.
    #[must_use]
    pub const fn from_command(command: u32) -> Option<Self> {
        let code = (command & 0xFF) as u8;
        if code & Self::MASK == 0 {
            None
        } else {
            Some(Self(code))
        }
    }

    /// The raw error byte (including bit 7 as read from hardware)
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Check whether a given flag is set
    #[must_use]
    pub const fn contains(self, flag: ScaErrorFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// Iterate over the set flags in bit order
    pub fn iter(self) -> impl Iterator<Item = ScaErrorFlag> {
        ScaErrorFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl fmt::Display for ScaErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error code {:#04x}: ", self.0)?;
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(flag.as_str())?;
        }
        Ok(())
    }
}

/// SCA protocol errors
///
/// All of these are terminal for the in-flight operation. The engine never
/// retries; that is a caller decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScaError {
    /// The SCA busy flag did not clear before the deadline
    #[error("exceeded timeout on busy wait")]
    BusyTimeout,
    /// The channel-busy code did not clear before the deadline
    #[error("exceeded timeout on channel busy wait")]
    ChannelBusyTimeout,
    /// Transaction ID 0x00 and 0xFF are reserved
    #[error("invalid transaction ID {id:#04x}")]
    InvalidTransactionId {
        /// Transaction ID found in the command word
        id: u8,
    },
    /// Hardware reported one or more error bits
    #[error("SCA {flags}")]
    HardwareError {
        /// Decoded error bits
        flags: ScaErrorFlags,
    },
    /// Link number beyond what the card type supports
    #[error("maximum link number exceeded: link {link}, card supports {max_links}")]
    LinkOutOfRange {
        /// Requested link
        link: u32,
        /// Number of links available
        max_links: u32,
    },
    /// Underlying register access failed
    #[error("register access failed: {0}")]
    Register(#[from] RegisterError),
}

// =============================================================================
// Lock Errors
// =============================================================================

/// Interprocess lock errors
///
/// Both bind failures are recoverable: the caller may report, retry, or take
/// a forced-unlock path of its own.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The socket backing the lock could not be created or addressed
    #[error("couldn't create abstract socket {socket_name}: {source}")]
    Socket {
        /// OS-visible socket name
        socket_name: String,
        /// Underlying OS error
        source: Errno,
    },
    /// Waiting mode: the lock stayed held until the deadline
    #[error("bind to socket {socket_name} timed out after {timeout:?}")]
    BindTimeout {
        /// OS-visible socket name
        socket_name: String,
        /// How long we waited
        timeout: Duration,
    },
    /// Non-waiting mode: the lock is held by someone else
    #[error("couldn't bind to socket {socket_name}: {source}")]
    BindImmediateFailure {
        /// OS-visible socket name
        socket_name: String,
        /// Underlying OS error
        source: Errno,
    },
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Superpage and DMA queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// DMA has not been started on the channel
    #[error("DMA is not started")]
    NotStarted,
    /// No room left in the transfer queue
    #[error("could not push superpage, transfer queue was full")]
    TransferQueueFull,
    /// Nothing to take from the ready queue
    #[error("ready queue was empty")]
    ReadyQueueEmpty,
    /// Superpage of size zero
    #[error("could not enqueue superpage, size == 0")]
    EmptySuperpage,
    /// Superpage size not a whole number of DMA pages
    #[error("superpage size {size} is not a multiple of the DMA page size {page_size}")]
    SizeNotPageMultiple {
        /// Superpage size in bytes
        size: usize,
        /// DMA page size in bytes
        page_size: usize,
    },
    /// Superpage extends past the end of the registered buffer
    #[error("superpage {offset:#x}+{size:#x} is outside the buffer of {buffer_size:#x} bytes")]
    OutOfRange {
        /// Superpage offset
        offset: usize,
        /// Superpage size
        size: usize,
        /// Registered buffer size
        buffer_size: usize,
    },
    /// Superpage offset is not 32-bit aligned
    #[error("superpage offset {offset:#x} is not 32-bit aligned")]
    MisalignedOffset {
        /// Superpage offset
        offset: usize,
    },
    /// Another live superpage already uses this offset
    #[error("offset {offset:#x} already in use by another superpage")]
    OffsetInUse {
        /// Superpage offset
        offset: usize,
    },
    /// Received byte count would decrease
    #[error("received bytes cannot go back from {current} to {requested}")]
    ReceivedRollback {
        /// Currently recorded bytes
        current: usize,
        /// Requested value
        requested: usize,
    },
    /// Received byte count exceeds the superpage size
    #[error("received bytes {requested} exceed superpage size {size}")]
    ReceivedOverflow {
        /// Requested value
        requested: usize,
        /// Superpage size
        size: usize,
    },
    /// A ready superpage cannot be made not-ready again
    #[error("superpage {offset:#x} is already ready")]
    ReadyRollback {
        /// Superpage offset
        offset: usize,
    },
    /// A page acknowledgement arrived with no page outstanding
    #[error("page acknowledgement without an outstanding page")]
    UnexpectedArrival,
    /// The transport reported more bytes than one page holds
    #[error("page reported {length} bytes, page size is {page_size}")]
    PageOverrun {
        /// Reported length
        length: usize,
        /// DMA page size
        page_size: usize,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Channel configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel number not supported by the card type
    #[error("channel number {channel} not supported by this card type")]
    InvalidChannel {
        /// Requested channel
        channel: u32,
    },
    /// DMA page size of zero or not 32-bit aligned
    #[error("invalid DMA page size {page_size}")]
    InvalidPageSize {
        /// Requested page size
        page_size: usize,
    },
    /// A queue capacity of zero
    #[error("queue capacity must be non-zero")]
    ZeroQueueCapacity,
    /// Memory buffer registered with a null address
    #[error("buffer parameters describe a null memory region")]
    InvalidBuffer,
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Lock(LockError::BindImmediateFailure { .. })) => { /* ... */ }
///     Err(Error::Sca(ScaError::BusyTimeout)) => { /* ... */ }
///     Err(Error::Dma(DmaError::TransferQueueFull)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Register error
    #[error("register: {0}")]
    Register(#[from] RegisterError),
    /// SCA error
    #[error("sca: {0}")]
    Sca(#[from] ScaError),
    /// Lock error
    #[error("lock: {0}")]
    Lock(#[from] LockError),
    /// DMA error
    #[error("dma: {0}")]
    Dma(#[from] DmaError),
    /// Configuration error
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for channel operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for register operations
pub type RegisterResult<T> = core::result::Result<T, RegisterError>;

/// Result type alias for SCA operations
pub type ScaResult<T> = core::result::Result<T, ScaError>;

/// Result type alias for lock operations
pub type LockResult<T> = core::result::Result<T, LockError>;

/// Result type alias for DMA bookkeeping operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // SCA Error Flag Tests
    // =========================================================================

    #[test]
    fn flags_absent_when_low_seven_bits_clear() {
        assert_eq!(ScaErrorFlags::from_command(0x0205_0000), None);
        assert_eq!(ScaErrorFlags::from_command(0x0205_0080), None);
    }

    #[test]
    fn flags_decode_invalid_command() {
        let flags = ScaErrorFlags::from_command(0x0001_0004).unwrap();
        assert!(flags.contains(ScaErrorFlag::InvalidCommand));
        assert_eq!(flags.iter().count(), 1);
        assert_eq!(flags.to_string(), "error code 0x04: invalid command request");
    }

    #[test]
    fn flags_message_names_every_set_bit() {
        let flags = ScaErrorFlags::from_command(0x23).unwrap();
        let message = flags.to_string();
        assert!(message.starts_with("error code 0x23: "));
        assert!(message.contains("generic error flag"));
        assert!(message.contains("invalid channel request"));
        assert!(message.contains("channel not enabled"));
        assert!(!message.ends_with(", "));
    }

    #[test]
    fn flag_strings_non_empty() {
        for flag in ScaErrorFlag::ALL {
            assert!(!flag.as_str().is_empty(), "{flag:?} has empty string");
        }
    }

    #[test]
    fn flag_masks_are_distinct_bits() {
        let combined = ScaErrorFlag::ALL.iter().fold(0u8, |acc, f| acc | f.mask());
        assert_eq!(combined, ScaErrorFlags::MASK);
    }

    // =========================================================================
    // Unified Error Tests
    // =========================================================================

    #[test]
    fn error_from_sca_error() {
        let err: Error = ScaError::BusyTimeout.into();
        assert!(matches!(err, Error::Sca(ScaError::BusyTimeout)));
    }

    #[test]
    fn error_from_dma_error() {
        let err: Error = DmaError::TransferQueueFull.into();
        assert!(matches!(err, Error::Dma(DmaError::TransferQueueFull)));
    }

    #[test]
    fn sca_error_from_register_error() {
        let err: ScaError = RegisterError::OutOfRange { index: 9, limit: 4 }.into();
        assert_eq!(
            err,
            ScaError::Register(RegisterError::OutOfRange { index: 9, limit: 4 })
        );
    }

    #[test]
    fn error_display_prefixes_domain() {
        let err = Error::Sca(ScaError::HardwareError {
            flags: ScaErrorFlags::from_command(0x04).unwrap(),
        });
        let display = err.to_string();
        assert!(display.starts_with("sca: "));
        assert!(display.contains("invalid command request"));

        let err = Error::Config(ConfigError::InvalidChannel { channel: 3 });
        assert!(err.to_string().starts_with("config: "));
    }

    #[test]
    fn lock_errors_are_distinct_kinds() {
        let timeout = LockError::BindTimeout {
            socket_name: "a".into(),
            timeout: Duration::from_secs(5),
        };
        let immediate = LockError::BindImmediateFailure {
            socket_name: "a".into(),
            source: Errno::EADDRINUSE,
        };
        assert!(timeout.to_string().contains("timed out"));
        assert!(immediate.to_string().contains("couldn't bind"));
    }
}
