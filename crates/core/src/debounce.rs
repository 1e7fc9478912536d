//! Last-write-wins debouncing driven by the host's event loop.
//!
//! The debouncer does not own a timer. Hosts report the current time when
//! they schedule work and when they poll, which keeps the same logic usable
//! from a native poll loop, a browser `setTimeout`, and tests.

use std::time::Duration;

use web_time::Instant;

/// Holds at most one pending action and releases it after a quiet period.
#[derive(Debug)]
pub struct Debouncer<A> {
    delay: Duration,
    pending: Option<Pending<A>>,
}

#[derive(Debug)]
struct Pending<A> {
    action: A,
    deadline: Instant,
}

impl<A> Debouncer<A> {
    /// Create a debouncer with a fixed `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm `action` to fire `delay` after `now`, discarding any earlier
    /// pending action.
    ///
    /// Returns `true` if a pending action was replaced.
    pub fn schedule(&mut self, action: A, now: Instant) -> bool {
        let deadline = now + self.delay;
        self.pending.replace(Pending { action, deadline }).is_some()
    }

    /// Take the pending action if its deadline has passed.
    ///
    /// Fires at most once per [`Debouncer::schedule`].
    pub fn take_due(&mut self, now: Instant) -> Option<A> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        self.pending.take().map(|p| p.action)
    }

    /// Whether an action is armed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the armed action becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Time left until the armed action is due; zero if already due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Drop the armed action without running it.
    pub fn cancel(&mut self) -> Option<A> {
        self.pending.take().map(|p| p.action)
    }
}
