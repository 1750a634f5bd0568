//! Maps `Box<dyn Error>` from the `ByteLink` boundary to typed `WalkerError`.
//!
//! `walker_traits::ByteLink` uses `Box<dyn Error + Send + Sync>` so any
//! transport can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `walker_hardware::HwError`.

use crate::error::WalkerError;

/// Map a link-boundary error to a typed `WalkerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to the error's message.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> WalkerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<walker_hardware::error::HwError>() {
            return match hw {
                walker_hardware::error::HwError::Io(io) => WalkerError::Io(io.to_string()),
                other => WalkerError::Link(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return WalkerError::Io(io.to_string());
    }
    WalkerError::Link(e.to_string())
}
