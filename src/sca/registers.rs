//! SCA register block layout and command words
//!
//! Register indices are 32-bit word offsets relative to the per-link SCA
//! base computed by [`ScaConfig`](super::ScaConfig).

// =============================================================================
// Register Offsets
// =============================================================================

/// Data word of the next command
pub const WRITE_DATA: usize = 0x20 / 4;
/// Command word of the next command
pub const WRITE_COMMAND: usize = 0x24 / 4;
/// Control register: reset sequence and execute strobe
pub const CONTROL: usize = 0x28 / 4;
/// Data word of the last reply
pub const READ_DATA: usize = 0x30 / 4;
/// Command word of the last reply, low byte carries the status
pub const READ_COMMAND: usize = 0x34 / 4;
/// Busy flag in bit 31
pub const READ_BUSY: usize = 0x38 / 4;
/// Round-trip time of the last command
pub const READ_TIME: usize = 0x3c / 4;

// =============================================================================
// Control Values
// =============================================================================

/// Control register values
pub mod control {
    /// Reset step one / three
    pub const RESET_A: u32 = 0x1;
    /// Reset step two
    pub const RESET_B: u32 = 0x2;
    /// Execute the loaded command
    pub const EXECUTE: u32 = 0x4;
    /// Idle
    pub const IDLE: u32 = 0x0;

    /// Reset sequence; the engine waits for the busy flag between steps
    pub const RESET_SEQUENCE: [u32; 4] = [RESET_A, RESET_B, RESET_A, IDLE];
}

/// Bit 31 of READ_BUSY
pub const BUSY_BIT: u32 = 31;

/// Status byte value while the addressed channel is still busy
pub const CHANNEL_BUSY_CODE: u32 = 0x40;

// =============================================================================
// GPIO Command Words
// =============================================================================

/// GPIO command words
///
/// Layout: channel in bits 31..24, transaction ID in 23..16, opcode in 7..0.
pub mod gpio {
    /// Write control register B
    pub const WRITE_CONTROL_B: u32 = 0x0001_0002;
    /// Read control register B
    pub const READ_CONTROL_B: u32 = 0x0002_0003;
    /// Write GPIO direction
    pub const WRITE_DIRECTION: u32 = 0x0203_0020;
    /// Read GPIO direction
    pub const READ_DIRECTION: u32 = 0x0204_0021;
    /// Write register OUT
    pub const WRITE_OUT: u32 = 0x0204_0010;
    /// Read register OUT
    pub const READ_OUT: u32 = 0x0205_0011;
    /// Read register DATAIN
    pub const READ_DATA_IN: u32 = 0x0206_0001;

    /// Data word enabling the GPIO channel in control register B
    pub const ENABLE_MASK: u32 = 0xff00_0000;
    /// Data word configuring all GPIO lines as outputs
    pub const ALL_OUTPUTS: u32 = 0xffff_ffff;
}

// =============================================================================
// Command Word Fields
// =============================================================================

/// Transaction ID carried in bits 23..16 of a command word
#[inline(always)]
pub const fn transaction_id(command: u32) -> u8 {
    ((command >> 16) & 0xff) as u8
}

/// Whether a transaction ID is reserved by the protocol
#[inline(always)]
pub const fn is_reserved_transaction_id(id: u8) -> bool {
    id == 0x00 || id == 0xff
}

/// Whether a reply command word reports the channel as still busy
#[inline(always)]
pub const fn is_channel_busy(command: u32) -> bool {
    (command & 0xff) == CHANNEL_BUSY_CODE
}
