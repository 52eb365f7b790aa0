//! SCA Slow-Control Protocol
//!
//! The SCA (Slow Control Adapter) sits behind a small block of BAR registers
//! per optical link. A transaction loads a data and a command word, strobes
//! the control register, then waits for the busy flag:
//!
//! ```text
//! write():  WRITE_DATA ← data
//!           WRITE_COMMAND ← command
//!           CONTROL ← 0x4, CONTROL ← 0x0
//!           poll READ_BUSY bit 31 until clear        (busy timeout)
//!
//! read():   data ← READ_DATA, command ← READ_COMMAND
//!           poll READ_COMMAND until low byte ≠ 0x40   (channel-busy timeout)
//!           decode bits 0..6 of command's low byte as error flags
//! ```
//!
//! Every wait is bounded by a wall-clock [`Deadline`]. The engine never
//! retries a failed transaction.
//!
//! # Example
//!
//! ```
//! use readout_card::card::CardType;
//! use readout_card::register::DummyBar;
//! use readout_card::sca::ScaEngine;
//!
//! let mut sca = ScaEngine::new(DummyBar, CardType::Dummy, 0).unwrap();
//! sca.write(0x0201_0010, 0xCAFE).unwrap();
//! let reply = sca.read().unwrap();
//! assert_eq!(reply.data, 0);
//! ```

pub mod config;
pub mod registers;

pub use config::ScaConfig;

use crate::card::CardType;
use crate::error::{ScaError, ScaErrorFlags, ScaResult};
use crate::hal::Deadline;
use crate::register::{RegisterPort, get_bit};
use registers::{control, gpio};

/// Command and data words of one SCA reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadResult {
    /// Reply command word
    pub command: u32,
    /// Reply data word
    pub data: u32,
}

/// Command and data words of one SCA request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandData {
    /// Command word: channel, transaction ID and opcode
    pub command: u32,
    /// Data word
    pub data: u32,
}

impl CommandData {
    /// Pair a command with its data word
    #[must_use]
    pub const fn new(command: u32, data: u32) -> Self {
        Self { command, data }
    }
}

/// SCA protocol driver over a register port.
///
/// Holds no state between transactions besides the register base of its
/// link, fixed at construction.
#[derive(Debug)]
pub struct ScaEngine<R> {
    port: R,
    offset: usize,
    config: ScaConfig,
}

impl<R: RegisterPort> ScaEngine<R> {
    /// Engine for `link` of a card of type `card_type`, with default timeouts.
    ///
    /// # Errors
    /// [`ScaError::LinkOutOfRange`] if the card has no such link.
    pub fn new(port: R, card_type: CardType, link: u32) -> ScaResult<Self> {
        Self::with_config(port, ScaConfig::for_card(card_type), link)
    }

    /// Engine for `link` with an explicit layout and timeouts.
    ///
    /// # Errors
    /// [`ScaError::LinkOutOfRange`] if `link >= config.max_links`.
    pub fn with_config(port: R, config: ScaConfig, link: u32) -> ScaResult<Self> {
        let offset = config.offset(link)?;
        Ok(Self {
            port,
            offset,
            config,
        })
    }

    /// Word index of this link's SCA block
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Layout and timeouts in use
    pub fn config(&self) -> &ScaConfig {
        &self.config
    }

    /// Release the register port
    pub fn into_inner(self) -> R {
        self.port
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Reset the SCA block and enable its GPIO channel.
    ///
    /// # Errors
    /// Any busy-wait timeout, hardware error or register error on the way.
    pub fn initialize(&mut self) -> ScaResult<()> {
        self.reset()?;
        self.gpio_enable()
    }

    /// Send one command.
    ///
    /// Commands carrying the reserved transaction IDs `0x00` or `0xff` are
    /// rejected before any register is touched.
    ///
    /// # Errors
    /// - [`ScaError::InvalidTransactionId`]
    /// - [`ScaError::BusyTimeout`]
    /// - [`ScaError::Register`]
    pub fn write(&mut self, command: u32, data: u32) -> ScaResult<()> {
        let id = registers::transaction_id(command);
        if registers::is_reserved_transaction_id(id) {
            return Err(ScaError::InvalidTransactionId { id });
        }

        log::debug!("SCA write: command={command:#010x} data={data:#010x}");
        self.bar_write(registers::WRITE_DATA, data)?;
        self.bar_write(registers::WRITE_COMMAND, command)?;
        self.execute()
    }

    /// Send one command given as a [`CommandData`] pair.
    ///
    /// # Errors
    /// See [`write`](Self::write).
    pub fn write_command(&mut self, request: CommandData) -> ScaResult<()> {
        self.write(request.command, request.data)
    }

    /// Fetch the reply to the last command.
    ///
    /// The status byte of the command word as first read is decoded once the
    /// channel is no longer busy.
    ///
    /// # Errors
    /// - [`ScaError::ChannelBusyTimeout`]
    /// - [`ScaError::HardwareError`] if any of status bits 0..6 is set
    /// - [`ScaError::Register`]
    pub fn read(&mut self) -> ScaResult<ReadResult> {
        let data = self.bar_read(registers::READ_DATA)?;
        let command = self.bar_read(registers::READ_COMMAND)?;

        Deadline::after(self.config.channel_busy_timeout)
            .poll(|| {
                let current = self.bar_read(registers::READ_COMMAND)?;
                Ok::<_, ScaError>((!registers::is_channel_busy(current)).then_some(()))
            })?
            .ok_or(ScaError::ChannelBusyTimeout)?;

        if let Some(flags) = ScaErrorFlags::from_command(command) {
            log::warn!("SCA reply {command:#010x} reports {flags}");
            return Err(ScaError::HardwareError { flags });
        }

        log::debug!("SCA read: command={command:#010x} data={data:#010x}");
        Ok(ReadResult { command, data })
    }

    /// Round-trip time of the last command as counted by the firmware.
    ///
    /// # Errors
    /// [`ScaError::Register`]
    pub fn read_time(&mut self) -> ScaResult<u32> {
        self.bar_read(registers::READ_TIME)
    }

    /// Write and read back each pair in order, stopping at the first failure.
    ///
    /// # Errors
    /// The first error encountered; earlier replies are discarded.
    pub fn write_sequence(&mut self, sequence: &[CommandData]) -> ScaResult<Vec<ReadResult>> {
        let mut replies = Vec::with_capacity(sequence.len());
        for request in sequence {
            self.write_command(*request)?;
            replies.push(self.read()?);
        }
        Ok(replies)
    }

    // =========================================================================
    // GPIO
    // =========================================================================

    /// Re-initialize, drive the GPIO outputs to `data` and return the
    /// DATAIN reply.
    ///
    /// # Errors
    /// Any error from [`initialize`](Self::initialize), [`write`](Self::write)
    /// or [`read`](Self::read).
    pub fn gpio_write(&mut self, data: u32) -> ScaResult<ReadResult> {
        self.initialize()?;
        self.write(gpio::WRITE_OUT, data)?;
        self.write(gpio::READ_OUT, 0)?;
        self.read()?;
        self.write(gpio::READ_DATA_IN, 0)?;
        self.read()
    }

    /// Read back the GPIO output register.
    ///
    /// # Errors
    /// Any error from [`write`](Self::write) or [`read`](Self::read).
    pub fn gpio_read(&mut self) -> ScaResult<ReadResult> {
        self.write(gpio::READ_OUT, 0)?;
        self.read()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn reset(&mut self) -> ScaResult<()> {
        log::debug!("SCA reset at offset {:#x}", self.offset);
        let [steps @ .., last] = control::RESET_SEQUENCE;
        for value in steps {
            self.bar_write(registers::CONTROL, value)?;
            self.wait_on_busy_clear()?;
        }
        self.bar_write(registers::CONTROL, last)
    }

    fn gpio_enable(&mut self) -> ScaResult<()> {
        self.write(gpio::WRITE_CONTROL_B, gpio::ENABLE_MASK)?;
        self.read()?;
        self.write(gpio::READ_CONTROL_B, gpio::ENABLE_MASK)?;
        self.read()?;
        self.write(gpio::WRITE_DIRECTION, gpio::ALL_OUTPUTS)?;
        self.write(gpio::READ_DIRECTION, 0)?;
        self.read()?;
        Ok(())
    }

    fn execute(&mut self) -> ScaResult<()> {
        self.bar_write(registers::CONTROL, control::EXECUTE)?;
        self.bar_write(registers::CONTROL, control::IDLE)?;
        self.wait_on_busy_clear()
    }

    fn wait_on_busy_clear(&mut self) -> ScaResult<()> {
        Deadline::after(self.config.busy_timeout)
            .poll(|| {
                let busy = self.bar_read(registers::READ_BUSY)?;
                Ok::<_, ScaError>((!get_bit(busy, registers::BUSY_BIT)).then_some(()))
            })?
            .ok_or(ScaError::BusyTimeout)
    }

    #[inline]
    fn bar_read(&mut self, index: usize) -> ScaResult<u32> {
        Ok(self.port.read_register(self.offset + index)?)
    }

    #[inline]
    fn bar_write(&mut self, index: usize, value: u32) -> ScaResult<()> {
        Ok(self.port.write_register(self.offset + index, value)?)
    }
}

// =============================================================================
// Tests
// =============================================================================
