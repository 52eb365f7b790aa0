//! BAR register access
//!
//! Everything above this module talks to the card through [`RegisterPort`]:
//! two primitives addressing 32-bit registers by word index from the start of
//! a PCI BAR. Backends differ only in where the words live.
//!
//! - [`MappedBar`]: volatile access to a BAR mapping owned by the caller
//! - [`DummyBar`]: reads return zero, writes are dropped
//! - `&mut R` for any port `R`, so engines can borrow a port they don't own

pub mod bar;
pub mod dummy;

pub use bar::MappedBar;
pub use dummy::DummyBar;

use crate::error::RegisterResult;

/// Capability to read and write 32-bit BAR registers.
///
/// Indices count 32-bit words from the BAR base. Out-of-range or protected
/// indices fail with a [`RegisterError`](crate::error::RegisterError).
pub trait RegisterPort {
    /// Read the register at `index`
    fn read_register(&mut self, index: usize) -> RegisterResult<u32>;

    /// Write `value` to the register at `index`
    fn write_register(&mut self, index: usize, value: u32) -> RegisterResult<()>;

    /// Replace the `width`-bit field at bit `position` with `value`.
    ///
    /// Performed as read-modify-write; bits of `value` above `width` are
    /// discarded.
    fn modify_register(
        &mut self,
        index: usize,
        position: u32,
        width: u32,
        value: u32,
    ) -> RegisterResult<()> {
        let current = self.read_register(index)?;
        self.write_register(index, insert_field(current, position, width, value))
    }
}

impl<R: RegisterPort + ?Sized> RegisterPort for &mut R {
    #[inline]
    fn read_register(&mut self, index: usize) -> RegisterResult<u32> {
        (**self).read_register(index)
    }

    #[inline]
    fn write_register(&mut self, index: usize, value: u32) -> RegisterResult<()> {
        (**self).write_register(index, value)
    }

    #[inline]
    fn modify_register(
        &mut self,
        index: usize,
        position: u32,
        width: u32,
        value: u32,
    ) -> RegisterResult<()> {
        (**self).modify_register(index, position, width, value)
    }
}

// =============================================================================
// Bit helpers
// =============================================================================

/// Mask covering `width` bits starting at `position`
#[inline(always)]
pub const fn field_mask(position: u32, width: u32) -> u32 {
    if width == 0 || position >= 32 {
        0
    } else if width >= 32 {
        u32::MAX << position
    } else {
        ((1u32 << width) - 1).wrapping_shl(position)
    }
}

/// Return `word` with the field at `position`/`width` replaced by `value`
#[inline(always)]
pub const fn insert_field(word: u32, position: u32, width: u32, value: u32) -> u32 {
    let mask = field_mask(position, width);
    (word & !mask) | (value.wrapping_shl(position) & mask)
}

/// Single bit of `word`
#[inline(always)]
pub const fn get_bit(word: u32, bit: u32) -> bool {
    bit < 32 && (word >> bit) & 1 == 1
}

/// Read a 32-bit register through a raw pointer
///
/// # Safety
/// The caller must ensure the pointer is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(ptr: *const u32) -> u32 {
    unsafe { core::ptr::read_volatile(ptr) }
}

/// Write a 32-bit register through a raw pointer
///
/// # Safety
/// The caller must ensure the pointer is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(ptr: *mut u32, value: u32) {
    unsafe { core::ptr::write_volatile(ptr, value) }
}
