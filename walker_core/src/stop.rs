//! Cooperative stop request/acknowledge flags.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle over the two stop flags shared between a controller and
/// the ticking side.
///
/// `should_stop` is the request, written by the controller. `is_stop` is the
/// acknowledgement, written by the walker when a cycle has ended.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    should_stop: Arc<AtomicBool>,
    is_stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the walker to finish the current cycle and stop.
    pub fn request_stop(&self) {
        self.should_stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Acquire)
    }

    /// Whether the walker has acknowledged the end of its cycle.
    pub fn is_stop(&self) -> bool {
        self.is_stop.load(Ordering::Acquire)
    }

    pub(crate) fn set_should_stop(&self, v: bool) {
        self.should_stop.store(v, Ordering::Release);
    }

    pub(crate) fn set_is_stop(&self, v: bool) {
        self.is_stop.store(v, Ordering::Release);
    }
}
