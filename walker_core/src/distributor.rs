//! Two-byte servo command frames.
//!
//! ```text
//! byte0:  7      6   5    4   3    2   1     0
//!         reset  pic      servo    mode      value bit 7
//! byte1:  0      value bits 0..6
//! ```
//!
//! Fields are OR-ed into the buffer, so a frame must start with `reset()`.
//! Every setter checks its domain first and leaves the buffer untouched on
//! failure.

use std::fmt;
use std::time::Duration;

use walker_traits::ByteLink;

use crate::error::WalkerError;
use crate::hw_error::map_link_error;
use crate::util::{DEFAULT_GUARD, spin_wait};

/// Marker bit that opens a frame.
pub const RESET_BIT: u8 = 0x80;
pub const PIC_SHIFT: u8 = 5;
pub const SERVO_SHIFT: u8 = 3;
pub const MODE_SHIFT: u8 = 1;
/// Highest pic, servo and mode number.
pub const FIELD_MAX: i64 = 3;
pub const VALUE_MAX: i64 = 255;
/// Servos handled by one pic board.
pub const SERVOS_PER_PIC: usize = 4;

fn check(field: &'static str, value: i64, max: i64) -> Result<u8, WalkerError> {
    if (0..=max).contains(&value) {
        Ok(value as u8)
    } else {
        tracing::warn!(field, value, "frame field out of range");
        Err(WalkerError::Range { field, value })
    }
}

/// Frame encoder that owns the link to the controller board.
pub struct MotorDistributor<L: ByteLink> {
    link: L,
    frame: [u8; 2],
    guard: Duration,
}

impl<L: ByteLink> MotorDistributor<L> {
    pub fn new(link: L) -> Self {
        Self::with_guard(link, DEFAULT_GUARD)
    }

    /// Use a custom inter-byte guard delay.
    pub fn with_guard(link: L, guard: Duration) -> Self {
        Self {
            link,
            frame: [0, 0],
            guard,
        }
    }

    /// Start a new frame.
    pub fn reset(&mut self) {
        self.frame = [RESET_BIT, 0];
    }

    pub fn set_pic_addr(&mut self, pic: i64) -> Result<(), WalkerError> {
        let v = check("pic", pic, FIELD_MAX)?;
        self.frame[0] |= v << PIC_SHIFT;
        Ok(())
    }

    pub fn set_servo_addr(&mut self, servo: i64) -> Result<(), WalkerError> {
        let v = check("servo", servo, FIELD_MAX)?;
        self.frame[0] |= v << SERVO_SHIFT;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: i64) -> Result<(), WalkerError> {
        let v = check("mode", mode, FIELD_MAX)?;
        self.frame[0] |= v << MODE_SHIFT;
        Ok(())
    }

    pub fn set_servo_val(&mut self, value: i64) -> Result<(), WalkerError> {
        let v = check("value", value, VALUE_MAX)?;
        self.frame[0] |= (v >> 7) & 1;
        self.frame[1] |= v & 0x7f;
        Ok(())
    }

    /// Current frame bytes.
    pub fn data(&self) -> [u8; 2] {
        self.frame
    }

    /// Transmit both bytes, each followed by the guard delay.
    pub fn send(&mut self) -> Result<(), WalkerError> {
        for byte in self.frame {
            self.link.putc(byte).map_err(|e| {
                let err = map_link_error(&*e);
                tracing::error!(error = %err, "link write failed");
                err
            })?;
            spin_wait(self.guard);
        }
        Ok(())
    }

    /// Build and send one complete command.
    ///
    /// Nothing is transmitted when a field is out of range.
    pub fn command(&mut self, pic: i64, servo: i64, mode: i64, value: i64) -> Result<(), WalkerError> {
        self.reset();
        self.set_pic_addr(pic)?;
        self.set_servo_addr(servo)?;
        self.set_mode(mode)?;
        self.set_servo_val(value)?;
        self.send()
    }

    /// Drain one reply byte from the board, if any.
    pub fn read(&mut self) -> Result<Option<u8>, WalkerError> {
        self.link.read().map_err(|e| map_link_error(&*e))
    }

    pub fn guard(&self) -> Duration {
        self.guard
    }
}

impl<L: ByteLink> fmt::Display for MotorDistributor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#04x}, {:#04x}]", self.frame[0], self.frame[1])
    }
}

impl<L: ByteLink> fmt::Debug for MotorDistributor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotorDistributor")
            .field("frame", &self.frame)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
