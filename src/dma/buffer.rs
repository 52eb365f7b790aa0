//! DMA buffer registration

use std::path::PathBuf;

use crate::error::ConfigError;

/// Description of the DMA buffer handed to a channel.
///
/// The core never maps or dereferences the buffer; it only needs the size to
/// bound superpage offsets. Mapping is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BufferParameters {
    /// Buffer already mapped in this process
    Memory {
        /// Start of the buffer, as an address
        address: usize,
        /// Size in bytes
        size: usize,
    },
    /// Shared memory file to be mapped by the caller
    File {
        /// Path of the file
        path: PathBuf,
        /// Size in bytes
        size: usize,
    },
    /// No buffer; only superpage-free operation is possible
    #[default]
    Null,
}

impl BufferParameters {
    /// Buffer size in bytes (zero for [`BufferParameters::Null`])
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            BufferParameters::Memory { size, .. } | BufferParameters::File { size, .. } => *size,
            BufferParameters::Null => 0,
        }
    }

    /// Check the parameters describe a usable region.
    ///
    /// # Errors
    /// [`ConfigError::InvalidBuffer`] for a memory buffer at address zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            BufferParameters::Memory { address: 0, .. } => Err(ConfigError::InvalidBuffer),
            _ => Ok(()),
        }
    }
}
