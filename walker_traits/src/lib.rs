pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Byte-oriented channel to the motor-controller board.
///
/// Implementations wrap a serial device or a simulation; the core only ever
/// pushes single bytes and optionally drains replies.
pub trait ByteLink {
    fn putc(&mut self, byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Return one pending byte from the board, if any. Links without a
    /// receive path keep the default.
    fn read(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

impl<L: ByteLink + ?Sized> ByteLink for Box<L> {
    fn putc(&mut self, byte: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).putc(byte)
    }

    fn read(&mut self) -> Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}
