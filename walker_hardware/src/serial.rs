//! Serial-port link (feature `hardware`).

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use walker_traits::ByteLink;

use crate::error::{HwError, Result};

pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
    device: String,
}

impl SerialLink {
    /// Open `device` at `baud`. `timeout` bounds each reply read.
    pub fn open(device: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(device, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| HwError::Serial(format!("opening {device}: {e}")))?;
        tracing::info!(device, baud, "serial link open");
        Ok(Self {
            port,
            device: device.to_string(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl ByteLink for SerialLink {
    fn putc(&mut self, byte: u8) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.port.write_all(&[byte]).map_err(HwError::from)?;
        self.port.flush().map_err(HwError::from)?;
        Ok(())
    }

    fn read(&mut self) -> std::result::Result<Option<u8>, Box<dyn std::error::Error + Send + Sync>> {
        if self.port.bytes_to_read().map_err(|e| HwError::Serial(e.to_string()))? == 0 {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(Box::new(HwError::Io(e))),
        }
    }
}
