//! Interprocess Channel Lock
//!
//! A channel is owned by at most one process at a time. Ownership is an
//! abstract-namespace Unix datagram socket bound to a name derived from the
//! lock name: `bind` either claims the name atomically or fails with
//! `EADDRINUSE`. The kernel releases the name when the socket closes,
//! including when the owner crashes, so a dead holder never leaves the
//! channel stuck.
//!
//! Abstract sockets are Linux-only.
//!
//! # Example
//!
//! ```no_run
//! use readout_card::lock::ChannelLock;
//!
//! let lock = ChannelLock::acquire("ReadoutCard_DMA_0000:3b:00.0_lock", false)?;
//! // ... drive the channel ...
//! drop(lock);
//! # Ok::<(), readout_card::error::LockError>(())
//! ```

pub mod name;

use std::os::fd::{AsRawFd, OwnedFd};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use nix::errno::Errno;
use nix::sys::socket::{AddressFamily, SockFlag, SockType, UnixAddr, bind, socket};

use crate::constants::{LOCK_RETRY_INTERVAL_US, LOCK_TIMEOUT};
use crate::error::{LockError, LockResult};
use crate::hal::{Deadline, StdDelay};

pub use name::socket_name;

/// What to do when the lock is already held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Fail at once with [`LockError::BindImmediateFailure`]
    #[default]
    Immediate,
    /// Retry until the timeout, then fail with [`LockError::BindTimeout`]
    Wait(Duration),
}

impl LockMode {
    /// Mode matching a `wait_on_lock` flag, with the default timeout
    #[must_use]
    pub const fn from_wait_flag(wait_on_lock: bool) -> Self {
        if wait_on_lock {
            LockMode::Wait(LOCK_TIMEOUT)
        } else {
            LockMode::Immediate
        }
    }
}

/// Held interprocess lock; released on drop.
#[derive(Debug)]
pub struct ChannelLock {
    socket: OwnedFd,
    socket_name: String,
    lock_name: String,
}

impl ChannelLock {
    /// Acquire the lock called `lock_name`.
    ///
    /// With `wait_on_lock` the bind is retried for 5 s; otherwise a held lock
    /// fails at once.
    ///
    /// # Errors
    /// - [`LockError::Socket`] if the socket cannot be created
    /// - [`LockError::BindImmediateFailure`] when not waiting
    /// - [`LockError::BindTimeout`] when waiting
    pub fn acquire(lock_name: &str, wait_on_lock: bool) -> LockResult<Self> {
        Self::acquire_with(lock_name, LockMode::from_wait_flag(wait_on_lock), &mut StdDelay)
    }

    /// Acquire the lock with an explicit mode, backing off with `delay`
    /// between bind attempts while waiting.
    ///
    /// # Errors
    /// See [`acquire`](Self::acquire).
    pub fn acquire_with<D: DelayNs>(
        lock_name: &str,
        mode: LockMode,
        delay: &mut D,
    ) -> LockResult<Self> {
        let socket_name = name::socket_name(lock_name).into_owned();
        let socket_error = |source| LockError::Socket {
            socket_name: socket_name.clone(),
            source,
        };

        let socket = socket(
            AddressFamily::Unix,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(socket_error)?;
        let address = UnixAddr::new_abstract(socket_name.as_bytes()).map_err(socket_error)?;
        let try_bind = || bind(socket.as_raw_fd(), &address);

        match mode {
            LockMode::Immediate => {
                try_bind().map_err(|source| {
                    log::debug!("Lock {socket_name} is held: {source}");
                    LockError::BindImmediateFailure {
                        socket_name: socket_name.clone(),
                        source,
                    }
                })?;
            }
            LockMode::Wait(timeout) => {
                let deadline = Deadline::after(timeout);
                let bound = deadline.poll(|| match try_bind() {
                    Ok(()) => Ok(Some(())),
                    Err(Errno::EADDRINUSE) => {
                        delay.delay_us(LOCK_RETRY_INTERVAL_US);
                        Ok(None)
                    }
                    Err(source) => Err(socket_error(source)),
                })?;
                if bound.is_none() {
                    return Err(LockError::BindTimeout {
                        socket_name,
                        timeout,
                    });
                }
            }
        }

        log::info!("Acquired lock {lock_name}");
        Ok(Self {
            socket,
            socket_name,
            lock_name: lock_name.to_owned(),
        })
    }

    /// Name the lock was requested with
    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }

    /// Name actually bound in the abstract namespace
    pub fn socket_name(&self) -> &str {
        &self.socket_name
    }
}

impl AsRawFd for ChannelLock {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.socket.as_raw_fd()
    }
}

impl Drop for ChannelLock {
    fn drop(&mut self) {
        log::info!("Releasing lock {}", self.lock_name);
    }
}
