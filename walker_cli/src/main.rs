#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod commands;
mod error_fmt;
mod logging;

use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %e, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn load_config(path: Option<&Path>) -> Result<walker_config::Config> {
    match path {
        Some(p) => walker_config::load_file(p),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            walker_config::load_file(Path::new(DEFAULT_CONFIG))
        }
        None => Ok(walker_config::Config::default()),
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let _ = color_eyre::install();

    let cfg = load_config(cli.config.as_deref()).wrap_err("loading config")?;
    let level = cli
        .log_level
        .as_deref()
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info");
    logging::init_tracing(level, cli.json, &cfg.logging);
    tracing::debug!(?cfg, "config loaded");

    match cli.cmd {
        Commands::Check { files } => commands::check(&files, cli.json),
        Commands::List => commands::list(&cfg, cli.json),
        Commands::Frames { file } => commands::frames(&file, cli.json),
        Commands::Run {
            name,
            dry_run,
            steps,
        } => commands::run(&cfg, &name, dry_run, steps, cli.json),
    }
}
