//! Time source for tick gating and motion-function time.

use std::time::{Duration, Instant};

/// Source of monotonic time.
///
/// The walker reads `now()` to decide whether a tick is due and to compute the
/// elapsed time fed to motion functions; run loops call `sleep()` while
/// nothing is due.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Whole milliseconds since `epoch`; 0 if `epoch` lies in the future.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let ms = self.now().saturating_duration_since(epoch).as_millis();
        u64::try_from(ms).unwrap_or(u64::MAX)
    }
}

/// Wall-clock time from `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::{Clock, Duration, Instant};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock that only moves when told to.
    ///
    /// Clones share one timeline, so a test can keep a handle while a walker
    /// (or its tick thread) owns another. `sleep` advances the timeline
    /// instead of blocking.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        start: Instant,
        elapsed_us: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed_us: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn advance(&self, d: Duration) {
            let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
            let _ = self
                .elapsed_us
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                    Some(cur.saturating_add(us))
                });
        }

        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.start + Duration::from_micros(self.elapsed_us.load(Ordering::SeqCst))
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}
