//! Test and helper links for walker_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use walker_traits::ByteLink;

/// A link that swallows every byte; useful for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLink;

impl ByteLink for NullLink {
    fn putc(&mut self, _byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A link that records written bytes in a buffer shared with its creator,
/// and hands out queued replies on `read`.
#[derive(Debug, Default, Clone)]
pub struct RecordingLink {
    written: Arc<Mutex<Vec<u8>>>,
    replies: Arc<Mutex<VecDeque<u8>>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the written bytes.
    pub fn bytes(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }

    /// Queue a byte to be returned by a later `read`.
    pub fn push_reply(&self, byte: u8) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(byte);
        }
    }
}

impl ByteLink for RecordingLink {
    fn putc(&mut self, byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.written
            .lock()
            .map_err(|_| "recording buffer poisoned")?
            .push(byte);
        Ok(())
    }

    fn read(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .replies
            .lock()
            .map_err(|_| "reply queue poisoned")?
            .pop_front())
    }
}

/// A link whose writes always fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingLink;

impl ByteLink for FailingLink {
    fn putc(&mut self, _byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("link down")))
    }
}
