//! Host Abstraction Layer
//!
//! Timing helpers shared by the register protocol and the channel lock.
//!
//! # Modules
//!
//! - [`delay`]: `DelayNs` provider backed by the OS scheduler
//! - [`deadline`]: Wall-clock deadlines for bounded busy waits
//!
//! # Delay Integration
//!
//! Types that back off between polls use `embedded_hal::delay::DelayNs`
//! directly. Pass [`StdDelay`] on a host, or any other implementation.

pub mod deadline;
pub mod delay;

// Re-export commonly used types
pub use deadline::Deadline;
pub use delay::StdDelay;
