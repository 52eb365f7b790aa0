//! Wall-clock deadlines
//!
//! Every busy wait in the crate is bounded by a [`Deadline`] rather than an
//! iteration count, so a timeout means the same thing on any CPU.

use std::time::{Duration, Instant};

/// A point in monotonic time after which a wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    end: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            end: start + timeout,
        }
    }

    /// Whether the deadline has passed
    #[inline]
    pub fn has_expired(&self) -> bool {
        Instant::now() >= self.end
    }

    /// Time since the deadline was armed
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left, zero once expired
    pub fn remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }

    /// Poll `done` until it yields `Some` or the deadline passes.
    ///
    /// `done` is always evaluated at least once. Errors from `done` are
    /// returned immediately.
    pub fn poll<T, E, F>(&self, mut done: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Result<Option<T>, E>,
    {
        loop {
            if let Some(value) = done()? {
                return Ok(Some(value));
            }
            if self.has_expired() {
                return Ok(None);
            }
        }
    }
}
