//! Volatile access to a mapped PCI BAR

use core::ops::Range;
use core::ptr::NonNull;

use super::{RegisterPort, read_reg, write_reg};
use crate::error::{RegisterError, RegisterResult};

/// Register window over a BAR mapping owned by the caller.
///
/// Every access is bounds checked against the window length. Writes into the
/// optional protected range are refused without touching the mapping.
#[derive(Debug)]
pub struct MappedBar {
    base: NonNull<u32>,
    registers: usize,
    protected: Option<Range<usize>>,
}

impl MappedBar {
    /// Wrap `length_bytes` of mapped BAR memory starting at `base`.
    ///
    /// Trailing bytes that do not fill a whole register are not addressable.
    ///
    /// # Safety
    /// `base` must be 4-byte aligned and valid for volatile reads and writes
    /// of `length_bytes` bytes for as long as the returned value lives.
    pub unsafe fn new(base: NonNull<u32>, length_bytes: usize) -> Self {
        Self {
            base,
            registers: length_bytes / core::mem::size_of::<u32>(),
            protected: None,
        }
    }

    /// Refuse writes to register indices within `range`
    #[must_use]
    pub fn with_protected_range(mut self, range: Range<usize>) -> Self {
        self.protected = Some(range);
        self
    }

    /// Number of addressable 32-bit registers
    #[inline]
    pub fn len(&self) -> usize {
        self.registers
    }

    /// True if the window holds no whole register
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registers == 0
    }

    /// The protected index range, if any
    pub fn protected_range(&self) -> Option<&Range<usize>> {
        self.protected.as_ref()
    }

    fn slot(&self, index: usize) -> RegisterResult<*mut u32> {
        if index >= self.registers {
            return Err(RegisterError::OutOfRange {
                index,
                limit: self.registers,
            });
        }
        // SAFETY: index is within the window validated at construction.
        Ok(unsafe { self.base.as_ptr().add(index) })
    }
}

impl RegisterPort for MappedBar {
    fn read_register(&mut self, index: usize) -> RegisterResult<u32> {
        let ptr = self.slot(index)?;
        // SAFETY: slot() bounds-checked the index against a valid mapping.
        Ok(unsafe { read_reg(ptr) })
    }

    fn write_register(&mut self, index: usize, value: u32) -> RegisterResult<()> {
        if self
            .protected
            .as_ref()
            .is_some_and(|range| range.contains(&index))
        {
            return Err(RegisterError::Protected { index });
        }
        let ptr = self.slot(index)?;
        // SAFETY: slot() bounds-checked the index against a valid mapping.
        unsafe { write_reg(ptr, value) };
        Ok(())
    }
}
