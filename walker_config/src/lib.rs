#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the walker.
//!
//! `Config` and its sections are deserialized from TOML and checked by
//! [`Config::validate`]. Every section is optional; an empty file is a valid
//! config for a dry run.
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Serial {
    /// Serial device of the controller board, e.g. `/dev/ttyUSB0`.
    pub device: Option<String>,
    pub baud: u32,
    /// Read timeout for reply bytes (ms).
    pub timeout_ms: u64,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            device: None,
            baud: 9600,
            timeout_ms: 10,
        }
    }
}

/// Policy for selecting a program while another one is running.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SelectPolicy {
    #[default]
    Replace,
    RejectWhileRunning,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalkerSection {
    /// Directory scanned for walk files.
    pub walk_dir: PathBuf,
    /// Extension of walk files, without the dot.
    pub extension: String,
    /// Busy-wait after each byte on the link (µs).
    pub guard_us: u64,
    /// Sleep while waiting for the next Step (ms).
    pub idle_poll_ms: u64,
    pub select_policy: SelectPolicy,
}

impl Default for WalkerSection {
    fn default() -> Self {
        Self {
            walk_dir: PathBuf::from("walkfiles"),
            extension: "walk".to_string(),
            guard_us: 50,
            idle_poll_ms: 1,
            select_policy: SelectPolicy::Replace,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: Serial,
    #[serde(default)]
    pub walker: WalkerSection,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("reading config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parsing config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if let Some(dev) = &self.serial.device
            && dev.trim().is_empty()
        {
            eyre::bail!("serial.device must not be empty when set");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.timeout_ms > 60 * 1000 {
            eyre::bail!("serial.timeout_ms is unreasonably large (>60s)");
        }

        // Walker
        if self.walker.extension.is_empty() || self.walker.extension.contains(['.', '/']) {
            eyre::bail!("walker.extension must be a bare extension such as \"walk\"");
        }
        if self.walker.guard_us > 10_000 {
            eyre::bail!("walker.guard_us must be <= 10000");
        }
        if self.walker.idle_poll_ms == 0 {
            eyre::bail!("walker.idle_poll_ms must be >= 1");
        }
        if self.walker.idle_poll_ms > 1000 {
            eyre::bail!("walker.idle_poll_ms must be <= 1000");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
