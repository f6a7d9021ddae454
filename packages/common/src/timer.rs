//! # One-Slot Timers
//!
//! Every debounced concern owns exactly one `TimerSlot`. Scheduling replaces
//! whatever was pending in that slot, so at most one deadline per concern is
//! ever live. Each scheduled run gets a fresh `TimerToken`; a host timer that
//! fires with an outdated token is ignored.
//!
//! Time is passed in explicitly. Callers drive the slot with `poll(now)`
//! from their event loop, or with `fire(token)` when an external timer
//! facility reports that a specific run elapsed.

use std::time::{Duration, Instant};

/// Upper bound on any single delay; longer ones are shortened to this
const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Handle for one scheduled run of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    token: TimerToken,
    deadline: Instant,
    payload: T,
}

/// Single cancellable timer carrying the payload to deliver when it fires
#[derive(Debug, Clone)]
pub struct TimerSlot<T> {
    delay: Duration,
    next_token: u64,
    pending: Option<Pending<T>>,
}

impl<T> TimerSlot<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_token: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule with the slot's default delay, cancelling any pending run
    pub fn schedule(&mut self, now: Instant, payload: T) -> TimerToken {
        self.schedule_after(now, self.delay, payload)
    }

    /// Schedule with an explicit delay, cancelling any pending run
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, payload: T) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending = Some(Pending {
            token,
            deadline: now + delay.min(MAX_DELAY),
            payload,
        });
        token
    }

    /// Drop the pending run, returning its payload
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.pending.as_ref().map(|pending| pending.token)
    }

    pub fn payload(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.payload)
    }

    /// Take the payload if the deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.cancel(),
            _ => None,
        }
    }

    /// Take the payload if `token` is the live run
    pub fn fire(&mut self, token: TimerToken) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.token == token => self.cancel(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_poll_before_deadline_yields_nothing() {
        let start = Instant::now();
        let mut slot = TimerSlot::new(DELAY);
        slot.schedule(start, "a");

        assert_eq!(slot.poll(start + Duration::from_millis(299)), None);
        assert_eq!(slot.poll(start + DELAY), Some("a"));
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_reschedule_replaces_pending_run() {
        let start = Instant::now();
        let mut slot = TimerSlot::new(DELAY);
        slot.schedule(start, 1);
        slot.schedule(start + Duration::from_millis(100), 2);
        slot.schedule(start + Duration::from_millis(200), 3);

        // First deadline would have been start+300; it was cancelled
        assert_eq!(slot.poll(start + Duration::from_millis(350)), None);
        assert_eq!(slot.poll(start + Duration::from_millis(500)), Some(3));
        assert_eq!(slot.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let start = Instant::now();
        let mut slot = TimerSlot::new(DELAY);
        let first = slot.schedule(start, "first");
        let second = slot.schedule(start, "second");

        assert_ne!(first, second);
        assert_eq!(slot.fire(first), None);
        assert_eq!(slot.fire(second), Some("second"));
    }

    #[test]
    fn test_huge_delay_is_clamped() {
        let start = Instant::now();
        let mut slot = TimerSlot::new(Duration::MAX);
        slot.schedule(start, ());
        assert_eq!(slot.deadline(), Some(start + MAX_DELAY));
    }

    #[test]
    fn test_cancel_clears_slot() {
        let start = Instant::now();
        let mut slot = TimerSlot::new(DELAY);
        slot.schedule(start, 5);
        assert_eq!(slot.cancel(), Some(5));
        assert_eq!(slot.poll(start + DELAY * 2), None);
    }
}
