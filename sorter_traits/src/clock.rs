use std::thread;
use std::time::{Duration, Instant};

/// Time source for loop pacing, flap step delays and the arming windows.
///
/// Every wait in the sorter goes through `sleep`, so a fake clock can run a
/// whole flap cycle or cooldown without real time passing.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Whole milliseconds from `since` to now; 0 if `since` lies ahead.
    fn ms_since(&self, since: Instant) -> u64 {
        u64::try_from(self.now().saturating_duration_since(since).as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock implementation over `Instant::now` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        // zero-length steps are common with instant motion configs
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_since_is_zero_for_future_instants() {
        let clock = MonotonicClock::new();
        let later = clock.now() + Duration::from_secs(60);
        assert_eq!(clock.ms_since(later), 0);
    }

    #[test]
    fn ms_since_counts_past_instants() {
        let clock = MonotonicClock::new();
        let Some(earlier) = clock.now().checked_sub(Duration::from_millis(250)) else {
            return;
        };
        assert!(clock.ms_since(earlier) >= 250);
    }
}
