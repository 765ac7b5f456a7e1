//! Nullable clock: deterministic time for testing and script replay.

use elect_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock.
///
/// Time only advances when you tell it to. Thread-safe, so one instance can be
/// shared (behind an `Arc`) between a node and the test driving it.
#[derive(Debug, Default)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(secs))
            });
    }

    /// Advance time by whole minutes.
    pub fn advance_minutes(&self, minutes: u64) {
        self.advance(minutes.saturating_mul(60));
    }

    /// Move time forward to `secs`. Earlier values are ignored, keeping the
    /// clock monotonic.
    pub fn set(&self, secs: u64) {
        self.current.fetch_max(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_when_told() {
        let clock = NullClock::new(1_000);
        assert_eq!(clock.now(), Timestamp::new(1_000));
        clock.advance(30);
        clock.advance_minutes(2);
        assert_eq!(clock.now(), Timestamp::new(1_150));
    }

    #[test]
    fn set_never_moves_backwards() {
        let clock = NullClock::new(500);
        clock.set(100);
        assert_eq!(clock.now(), Timestamp::new(500));
        clock.set(900);
        assert_eq!(clock.now(), Timestamp::new(900));
    }
}
