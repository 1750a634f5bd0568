//! Runtime configuration for the FileWalker.
//!
//! Separate from the TOML schema in `walker_config`; see `conversions` for the
//! bridge.

use std::time::Duration;

use crate::util::DEFAULT_GUARD;

/// What `select_program` does when a Program is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectPolicy {
    /// Switch to the new Program immediately.
    #[default]
    Replace,
    /// Refuse until the running Program has ended or been deselected.
    RejectWhileRunning,
}

/// FileWalker settings.
#[derive(Debug, Clone)]
pub struct WalkerCfg {
    /// Busy-wait after each byte put on the link.
    pub guard: Duration,
    /// Sleep between ticks of a `TickRunner` when no Step is due.
    pub idle_poll: Duration,
    pub select_policy: SelectPolicy,
}

impl Default for WalkerCfg {
    fn default() -> Self {
        Self {
            guard: DEFAULT_GUARD,
            idle_poll: Duration::from_millis(1),
            select_policy: SelectPolicy::Replace,
        }
    }
}

/// Serial link settings. `device: None` means no board is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCfg {
    pub device: Option<String>,
    pub baud: u32,
    /// How long `read` waits for a reply byte.
    pub read_timeout: Duration,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            device: None,
            baud: 9600,
            read_timeout: Duration::from_millis(10),
        }
    }
}
