//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the protocol
//! engines and the channel session on the host without a card.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::channel::transport::{PageDescriptor, PageTransport};
use crate::error::{RegisterError, RegisterResult, Result};
use crate::register::RegisterPort;

// =============================================================================
// Mock Register Port
// =============================================================================

/// Mock BAR for testing register protocols without hardware
///
/// Reads come from a scripted per-index sequence first, then from the
/// register map (default 0). Writes update the map and are logged.
///
/// # Example
///
/// ```ignore
/// let mut port = MockRegisterPort::new();
/// port.push_reads(14, [1 << 31, 0]); // busy once, then idle
///
/// let mut sca = ScaEngine::new(&mut port, CardType::Crorc, 0)?;
/// sca.write(0x0201_0000, 0)?;
/// assert_eq!(port.reads_of(14), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockRegisterPort {
    /// Register values: index -> value
    registers: HashMap<usize, u32>,
    /// Values returned by the next reads of an index, before the map
    scripted: HashMap<usize, VecDeque<u32>>,
    /// Record of writes: (index, value)
    write_log: Vec<(usize, u32)>,
    /// Record of reads: index
    read_log: Vec<usize>,
    /// Indices at or above this fail with `OutOfRange`
    limit: Option<usize>,
}

impl MockRegisterPort {
    /// Create a new mock port with an unbounded register window
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock port rejecting indices `>= limit`
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Set a register value
    pub fn set_register(&mut self, index: usize, value: u32) {
        self.registers.insert(index, value);
    }

    /// Get the current value of a register (for test verification)
    pub fn get_register(&self, index: usize) -> Option<u32> {
        self.registers.get(&index).copied()
    }

    /// Queue values returned by the next reads of `index`
    pub fn push_reads(&mut self, index: usize, values: impl IntoIterator<Item = u32>) {
        self.scripted.entry(index).or_default().extend(values);
    }

    /// Get all writes that have been made
    pub fn get_writes(&self) -> Vec<(usize, u32)> {
        self.write_log.clone()
    }

    /// Get all reads that have been made
    pub fn get_reads(&self) -> Vec<usize> {
        self.read_log.clone()
    }

    /// Number of reads of one index
    pub fn reads_of(&self, index: usize) -> usize {
        self.read_log.iter().filter(|i| **i == index).count()
    }

    /// Total register accesses
    pub fn call_count(&self) -> usize {
        self.read_log.len() + self.write_log.len()
    }

    /// Clear the write and read logs
    pub fn clear_logs(&mut self) {
        self.write_log.clear();
        self.read_log.clear();
    }

    fn check(&self, index: usize) -> RegisterResult<()> {
        match self.limit {
            Some(limit) if index >= limit => Err(RegisterError::OutOfRange { index, limit }),
            _ => Ok(()),
        }
    }
}

impl RegisterPort for MockRegisterPort {
    fn read_register(&mut self, index: usize) -> RegisterResult<u32> {
        self.check(index)?;
        self.read_log.push(index);
        if let Some(value) = self.scripted.get_mut(&index).and_then(VecDeque::pop_front) {
            return Ok(value);
        }
        Ok(self.registers.get(&index).copied().unwrap_or(0))
    }

    fn write_register(&mut self, index: usize, value: u32) -> RegisterResult<()> {
        self.check(index)?;
        self.write_log.push((index, value));
        self.registers.insert(index, value);
        Ok(())
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

// =============================================================================
// Scripted Transport
// =============================================================================

/// Page transport whose completions are released by the test
///
/// Pushed pages are recorded. A page completes once the test calls
/// [`complete_next`](Self::complete_next) for it, with the given length.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    /// Pages handed over, in push order
    pushed: Vec<PageDescriptor>,
    /// Completion lengths keyed by FIFO slot
    completions: HashMap<usize, VecDeque<usize>>,
    /// Number of completions released so far
    released: usize,
    /// Refuse pushes once this many pages were pushed
    push_limit: Option<usize>,
    /// Between `start` and `stop`
    running: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail pushes beyond `limit` pages
    pub fn with_push_limit(limit: usize) -> Self {
        Self {
            push_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Complete the oldest page not yet completed with `length` bytes
    pub fn complete_next(&mut self, length: usize) {
        if let Some(page) = self.pushed.get(self.released) {
            self.completions
                .entry(page.fifo_index)
                .or_default()
                .push_back(length);
            self.released += 1;
        }
    }

    /// Complete every outstanding page with `length` bytes
    pub fn complete_all(&mut self, length: usize) {
        while self.released < self.pushed.len() {
            self.complete_next(length);
        }
    }

    /// Change or lift the push limit
    pub fn set_push_limit(&mut self, limit: Option<usize>) {
        self.push_limit = limit;
    }

    /// Pages pushed so far
    pub fn pushed(&self) -> &[PageDescriptor] {
        &self.pushed
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl PageTransport for ScriptedTransport {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn push_page(&mut self, page: &PageDescriptor) -> Result<()> {
        if self.push_limit.is_some_and(|limit| self.pushed.len() >= limit) {
            return Err(RegisterError::Protected {
                index: page.fifo_index,
            }
            .into());
        }
        self.pushed.push(*page);
        Ok(())
    }

    fn poll_page(&mut self, page: &PageDescriptor) -> Result<Option<usize>> {
        Ok(self
            .completions
            .get_mut(&page.fifo_index)
            .and_then(VecDeque::pop_front))
    }
}

// =============================================================================
// Test Assertions
// =============================================================================

/// Assert that a register was written with a specific value
#[macro_export]
macro_rules! assert_reg_written {
    ($port:expr, $index:expr, $value:expr) => {
        let writes = $port.get_writes();
        assert!(
            writes.iter().any(|w| w.0 == $index && w.1 == $value),
            "Expected write to register {} with value 0x{:08X}, but got: {:?}",
            $index,
            $value,
            writes
        );
    };
}
