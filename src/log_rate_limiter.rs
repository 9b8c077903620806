use crate::monotonic_clock::{MonotonicClock, MonotonicClockImpl};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Lets a recurring log line through at most once per window.
///
/// Keep one limiter per log site. Sharing a limiter between unrelated sites lets one of them hide the
/// first occurrence of the other.
pub struct LogRateLimiter {
    window: Duration,
    last_permitted: Mutex<Option<Instant>>,
    clock: Arc<dyn MonotonicClock>,
}

impl LogRateLimiter {
    /// Creates limiter permitting one emission per `window`, measured with the system clock.
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(MonotonicClockImpl::new()))
    }

    /// Creates limiter measuring time with `clock`.
    pub fn with_clock(window: Duration, clock: Arc<dyn MonotonicClock>) -> Self {
        LogRateLimiter {
            window,
            last_permitted: Mutex::new(None),
            clock,
        }
    }

    /// Returns `true` if the caller may emit its log line now.
    ///
    /// The first call always permits. Later calls permit once `window` has passed since the last permitted
    /// one and restart the window from the current time.
    pub fn test(&self) -> bool {
        // the clock is read under the lock so that racing callers see a serialized view of `last_permitted`
        let mut last_permitted = self.last_permitted.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        match *last_permitted {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                *last_permitted = Some(now);
                true
            }
        }
    }

    /// Returns the window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl fmt::Debug for LogRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LogRateLimiter {{ window: {:?} }}", self.window)
    }
}
