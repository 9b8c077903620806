use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time for the rate limiters.
pub trait MonotonicClock: Send + Sync {
    /// Returns current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClockImpl {}

impl MonotonicClockImpl {
    /// Creates new system clock.
    pub fn new() -> Self {
        Self {}
    }
}

impl MonotonicClock for MonotonicClockImpl {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that moves only when told to.
///
/// Clones share the same time, so a test can hand one clone to a rate limiter and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates clock stopped at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Sets the clock to `instant`.
    pub fn set(&self, instant: Instant) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn system_clock_moves_forward() {
        let clock = MonotonicClockImpl::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.now() > t1);
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let start = Instant::now();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        assert_eq!(clock.now(), start);
        other.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), start + Duration::from_secs(3));

        clock.set(start + Duration::from_secs(100));
        assert_eq!(other.now(), start + Duration::from_secs(100));
    }
}
