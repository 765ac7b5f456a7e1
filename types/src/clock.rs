//! Time sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Timestamp;

/// A shared source of the current time.
///
/// Implementations must be monotonic: successive calls never go backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, clamped so it never moves backwards.
///
/// If the host clock is stepped back (NTP correction, manual change), the last
/// observed value is returned until real time catches up again.
#[derive(Debug, Default)]
pub struct SystemClock {
    high_water: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let previous = self.high_water.fetch_max(wall, Ordering::SeqCst);
        Timestamp::new(previous.max(wall))
    }
}
