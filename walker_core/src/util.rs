//! Common time helpers for walker_core.

use std::time::{Duration, Instant};

/// Guard delay the controller board needs after every received byte.
pub const DEFAULT_GUARD: Duration = Duration::from_micros(50);

/// Busy-wait for `d`.
///
/// Only meant for the microsecond guards between wire bytes, where a
/// scheduler sleep would overshoot by orders of magnitude.
#[inline]
pub fn spin_wait(d: Duration) {
    if d.is_zero() {
        return;
    }
    let start = Instant::now();
    while start.elapsed() < d {
        std::hint::spin_loop();
    }
}

/// Convert a millisecond count into a signed timestamp, saturating.
#[inline]
pub fn ms_to_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
