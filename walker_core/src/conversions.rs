//! `From` implementations bridging `walker_config` types to `walker_core` types.

use std::time::Duration;

use crate::config::{LinkCfg, SelectPolicy, WalkerCfg};

impl From<walker_config::SelectPolicy> for SelectPolicy {
    fn from(p: walker_config::SelectPolicy) -> Self {
        match p {
            walker_config::SelectPolicy::Replace => Self::Replace,
            walker_config::SelectPolicy::RejectWhileRunning => Self::RejectWhileRunning,
        }
    }
}

impl From<&walker_config::WalkerSection> for WalkerCfg {
    fn from(c: &walker_config::WalkerSection) -> Self {
        Self {
            guard: Duration::from_micros(c.guard_us),
            idle_poll: Duration::from_millis(c.idle_poll_ms),
            select_policy: c.select_policy.into(),
        }
    }
}

impl From<&walker_config::Serial> for LinkCfg {
    fn from(s: &walker_config::Serial) -> Self {
        Self {
            device: s.device.clone(),
            baud: s.baud,
            read_timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}
