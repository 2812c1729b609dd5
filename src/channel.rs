//! Single-slot blocking handoff between threads.
//!
//! A [`Channel`] holds at most one undelivered value. Sending overwrites
//! whatever is pending ("latest wins"), and each delivered value is taken by
//! exactly one receiver. Receivers block on a condition variable until the
//! slot is filled.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Single-slot, latest-wins blocking channel.
///
/// Safe for one sender and any number of receivers. Receivers compete for
/// each value: at most one `receive` call obtains a given `send`.
pub struct Channel<T> {
    /// Pending value, if any
    slot: Mutex<Option<T>>,
    /// Signalled once per `send`
    available: Condvar,
}

impl<T> Channel<T> {
    /// Creates an empty channel.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            available: Condvar::new(),
        }
    }

    /// Stores `value` in the slot and wakes one blocked receiver.
    ///
    /// Any value still pending from an earlier send is dropped. Never blocks
    /// beyond acquiring the internal lock.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn send(&self, value: T) {
        let mut slot = self.lock();
        *slot = Some(value);
        drop(slot);
        self.available.notify_one();
    }

    /// Blocks until a value is available, then takes it.
    ///
    /// Returns immediately if the slot is already filled. The slot is
    /// re-checked after every wake, so spurious wakeups and losing a race to
    /// another receiver simply put this caller back to sleep.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn receive(&self) -> T {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self
                .available
                .wait(slot)
                .expect("channel slot lock poisoned");
        }
    }

    /// Like [`receive`](Self::receive), but gives up after `timeout`.
    ///
    /// Returns `None` if no value was taken before the deadline.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return Some(value);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.checked_duration_since(Instant::now())?,
                // Deadline overflowed Instant; treat as unbounded.
                None => Duration::MAX,
            };
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(slot, remaining)
                .expect("channel slot lock poisoned");
            slot = guard;
        }
    }

    /// Takes the pending value without blocking.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn try_receive(&self) -> Option<T> {
        self.lock().take()
    }

    /// Returns whether a value is waiting to be received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().expect("channel slot lock poisoned")
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.slot.lock().map(|s| s.is_some()).unwrap_or(false);
        f.debug_struct("Channel")
            .field("pending", &pending)
            .finish_non_exhaustive()
    }
}
