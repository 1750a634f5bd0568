//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "etc/walker.toml";

#[derive(Parser, Debug)]
#[command(name = "walker", version, about = "Walk-file servo runner")]
pub struct Cli {
    /// Path to config TOML (defaults to etc/walker.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and logs as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate walk files
    Check {
        /// Walk files to check
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Load the configured walk directory and list its programs
    List,
    /// Print the wire frames of one pass of a prg program
    Frames {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Run a program from the walk directory until its cycle ends
    Run {
        /// Program name as given by `Name=` in the walk file
        name: String,
        /// Use a simulated link instead of the serial device
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
        /// Request a graceful stop after this many Steps
        #[arg(long, value_name = "N")]
        steps: Option<u64>,
    },
}
