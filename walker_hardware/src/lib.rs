#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Byte links to the servo controller board.
//!
//! `SimulatedLink` is always available. `SerialLink` talks to a real serial
//! device and needs the `hardware` feature.

pub mod error;
#[cfg(feature = "hardware")]
pub mod serial;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use walker_traits::ByteLink;

use crate::error::HwError;

#[cfg(feature = "hardware")]
pub use serial::SerialLink;

/// In-memory link: records written bytes and replays scripted replies.
///
/// Clones share their buffers, so a caller can keep one clone for
/// inspection after handing another to the walker.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLink {
    written: Arc<Mutex<Vec<u8>>>,
    replies: Arc<Mutex<VecDeque<u8>>>,
    closed: Arc<AtomicBool>,
}

impl SimulatedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue reply bytes for later `read` calls.
    pub fn script_replies(&self, bytes: &[u8]) {
        if let Ok(mut q) = self.replies.lock() {
            q.extend(bytes.iter().copied());
        }
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Written bytes grouped as two-byte frames; a trailing odd byte is
    /// left out.
    pub fn frames(&self) -> Vec<[u8; 2]> {
        self.written()
            .chunks_exact(2)
            .map(|c| [c[0], c[1]])
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut w) = self.written.lock() {
            w.clear();
        }
    }

    /// Make every further write fail as if the device was unplugged.
    pub fn disconnect(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

impl ByteLink for SimulatedLink {
    fn putc(&mut self, byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(Box::new(HwError::Closed));
        }
        self.written
            .lock()
            .map_err(|_| HwError::Serial("write buffer poisoned".into()))?
            .push(byte);
        tracing::trace!(byte, "simulated write");
        Ok(())
    }

    fn read(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let mut q = self
            .replies
            .lock()
            .map_err(|_| HwError::Serial("reply queue poisoned".into()))?;
        Ok(q.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_buffers() {
        let probe = SimulatedLink::new();
        let mut link = probe.clone();
        link.putc(0x81).unwrap();
        link.putc(0x05).unwrap();
        link.putc(0x90).unwrap();
        assert_eq!(probe.written(), vec![0x81, 0x05, 0x90]);
        assert_eq!(probe.frames(), vec![[0x81, 0x05]]);
        probe.clear();
        assert!(link.written().is_empty());
    }

    #[test]
    fn replies_come_back_in_order() {
        let mut link = SimulatedLink::new();
        link.script_replies(&[1, 2]);
        assert_eq!(link.read().unwrap(), Some(1));
        assert_eq!(link.read().unwrap(), Some(2));
        assert_eq!(link.read().unwrap(), None);
    }
}
