//! Register port for the Dummy card type

use super::RegisterPort;
use crate::error::RegisterResult;

/// Stand-in BAR: every read returns zero and writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyBar;

impl RegisterPort for DummyBar {
    fn read_register(&mut self, _index: usize) -> RegisterResult<u32> {
        Ok(0)
    }

    fn write_register(&mut self, _index: usize, _value: u32) -> RegisterResult<()> {
        Ok(())
    }
}
