//! Debounced values
//!
//! A [`Debounced`] holds a settled value and at most one pending value with a
//! deadline. Every [`Debounced::set`] replaces the pending value and restarts
//! the countdown, so a burst of updates collapses into the last one.
//!
//! Time is read from [`tokio::time::Instant`]; outside a runtime with a paused
//! clock this is the ordinary monotonic clock.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Quiet period used when the caller does not pick one.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Pending<T> {
    fn elapsed(&self, now: Instant) -> bool {
        self.deadline <= now
    }
}

/// A value that only follows its input after the input has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    settled: T,
    pending: Option<Pending<T>>,
    delay: Duration,
}

impl<T> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record `value` and restart the countdown, discarding any pending value.
    pub fn set(&mut self, value: T) {
        let deadline = Instant::now() + self.delay;
        if self.pending.replace(Pending { value, deadline }).is_some() {
            trace!("debounce countdown restarted");
        }
    }

    /// The debounced value as of now.
    ///
    /// A pending value whose deadline has passed counts as settled even before
    /// [`poll`](Self::poll) commits it.
    pub fn get(&self) -> &T {
        self.ready().unwrap_or(&self.settled)
    }

    /// The last committed value, ignoring any elapsed-but-uncommitted countdown.
    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// A pending value whose countdown has elapsed but which has not been committed yet.
    pub fn ready(&self) -> Option<&T> {
        self.pending
            .as_ref()
            .filter(|pending| pending.elapsed(Instant::now()))
            .map(|pending| &pending.value)
    }

    /// The most recent input, pending or not.
    pub fn latest(&self) -> &T {
        self.pending
            .as_ref()
            .map_or(&self.settled, |pending| &pending.value)
    }

    /// Whether a countdown is armed and has not elapsed yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.elapsed(Instant::now()))
    }

    /// When the armed countdown elapses.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// Commit the pending value if its countdown has elapsed.
    ///
    /// Returns the newly settled value, or `None` when nothing was committed.
    pub fn poll(&mut self) -> Option<&T> {
        let now = Instant::now();
        if self.pending.as_ref().is_some_and(|pending| pending.elapsed(now)) {
            self.flush()
        } else {
            None
        }
    }

    /// Commit the pending value immediately, elapsed or not.
    pub fn flush(&mut self) -> Option<&T> {
        let pending = self.pending.take()?;
        self.settled = pending.value;
        debug!("debounced value settled");
        Some(&self.settled)
    }

    /// Drop the pending countdown and return its value.
    ///
    /// A countdown that has already elapsed is committed first, so it is not lost.
    pub fn cancel(&mut self) -> Option<T> {
        self.poll();
        let pending = self.pending.take()?;
        debug!("debounce countdown canceled");
        Some(pending.value)
    }

    /// Change the quiet period. An armed countdown restarts from now.
    pub fn set_delay(&mut self, delay: Duration) {
        self.poll();
        self.delay = delay;
        if let Some(pending) = &mut self.pending {
            pending.deadline = Instant::now() + delay;
            trace!(?delay, "debounce countdown re-armed with new delay");
        }
    }
}

impl<T: Default> Default for Debounced<T> {
    fn default() -> Self {
        Self::new(T::default(), DEFAULT_DELAY)
    }
}
