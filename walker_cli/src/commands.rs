//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{Result, WrapErr};
use serde_json::json;
use walker_core::parser::parse_file_with_report;
use walker_core::{
    FileWalker, LinkCfg, Program, Step, UseMode, WalkerCfg, WalkerError, run_until_end_of_cycle,
};
use walker_hardware::SimulatedLink;
use walker_traits::{ByteLink, MonotonicClock};

type DynLink = Box<dyn ByteLink + Send>;

fn function_count(p: &Program) -> usize {
    p.motor_functions().iter().map(walker_core::MotorFunctions::len).sum()
}

/// `walker check FILE...`
pub fn check(files: &[PathBuf], json: bool) -> Result<()> {
    let mut failed = 0usize;
    for path in files {
        let outcome = match parse_file_with_report(path) {
            Ok(o) => o,
            Err(e) => {
                failed += 1;
                report_failure(path, &format!("{e:#}"), json);
                continue;
            }
        };
        let p = &outcome.program;
        let skipped: Vec<String> = outcome.skipped.iter().map(ToString::to_string).collect();
        match p.validate() {
            Ok(mode) => {
                if json {
                    println!(
                        "{}",
                        json!({
                            "file": path.display().to_string(),
                            "ok": true,
                            "name": p.name(),
                            "mode": mode.as_str(),
                            "init_steps": p.init_steps().len(),
                            "prg_steps": p.prg_steps().len(),
                            "functions": function_count(p),
                            "skipped": skipped,
                        })
                    );
                } else {
                    println!(
                        "ok   {}: '{}' ({mode}) init={} prg={} functions={}",
                        path.display(),
                        p.name(),
                        p.init_steps().len(),
                        p.prg_steps().len(),
                        function_count(p)
                    );
                    for s in &skipped {
                        println!("     skipped: {s}");
                    }
                }
            }
            Err(e) => {
                failed += 1;
                report_failure(path, &e.to_string(), json);
            }
        }
    }
    if failed > 0 {
        return Err(WalkerError::Validation(format!(
            "{failed} of {} walk files failed",
            files.len()
        )))
        .wrap_err("check failed");
    }
    Ok(())
}

fn report_failure(path: &Path, msg: &str, json: bool) {
    if json {
        println!(
            "{}",
            json!({ "file": path.display().to_string(), "ok": false, "error": msg })
        );
    } else {
        println!("FAIL {}: {msg}", path.display());
    }
}

/// Walk files in `dir` with extension `ext`, sorted by path.
pub fn scan_walk_dir(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("reading walk directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == ext))
        .collect();
    files.sort();
    Ok(files)
}

fn load_dir<L: ByteLink>(walker: &mut FileWalker<L>, cfg: &walker_config::WalkerSection) -> Result<usize> {
    let files = scan_walk_dir(&cfg.walk_dir, &cfg.extension)?;
    let loaded = files.iter().filter(|f| walker.load_program(f)).count();
    tracing::info!(
        dir = %cfg.walk_dir.display(),
        found = files.len(),
        loaded,
        "walk directory loaded"
    );
    Ok(loaded)
}

/// `walker list`
pub fn list(cfg: &walker_config::Config, json: bool) -> Result<()> {
    let mut walker = FileWalker::new(SimulatedLink::new());
    load_dir(&mut walker, &cfg.walker)?;
    for name in walker.program_names() {
        let Some(p) = walker.program(name) else {
            continue;
        };
        let mode = p.mode().map_or("?", UseMode::as_str);
        let path = p.path().map(|p| p.display().to_string()).unwrap_or_default();
        if json {
            println!(
                "{}",
                json!({ "name": name, "mode": mode, "looping": p.looping(), "tick_ms": p.tick_ms(), "path": path })
            );
        } else {
            println!("{name:<24} {mode:<4} tick={:<5} {path}", p.tick_ms());
        }
    }
    Ok(())
}

/// `walker frames FILE`
pub fn frames(file: &Path, json: bool) -> Result<()> {
    let program = Program::load(file)?;
    let mode = program.validate().map_err(eyre::Report::new)?;
    if mode != UseMode::Prg {
        eyre::bail!("frames needs a prg program; '{}' uses {mode}", program.name());
    }
    let total = program.init_steps().len() + program.prg_steps().len();

    let link = SimulatedLink::new();
    let cfg = WalkerCfg {
        guard: Duration::ZERO,
        ..WalkerCfg::default()
    };
    let mut walker = FileWalker::with_config(link.clone(), &cfg, MonotonicClock::new());
    let name = walker.register(program)?;
    walker.try_select_program(Some(&name))?;

    for index in 0..total {
        let Some(step) = walker.get_next_step() else {
            break;
        };
        link.clear();
        let sent = walker.do_step(&step);
        print_frames(index, &step, &link.frames(), json);
        if let Err(e) = sent {
            tracing::warn!(step = index, error = %e, "step not fully encoded");
        }
    }
    Ok(())
}

fn print_frames(index: usize, step: &Step, frames: &[[u8; 2]], json: bool) {
    if json {
        let hex: Vec<String> = frames
            .iter()
            .map(|[a, b]| format!("{a:02x}{b:02x}"))
            .collect();
        println!(
            "{}",
            json!({ "step": index, "delay_ms": step.delay_ms(), "positions": step.positions(), "frames": hex })
        );
        return;
    }
    println!("#{index} {step}");
    for (slot, [a, b]) in frames.iter().enumerate() {
        println!("  servo {slot:>2}: {a:#04x} {b:#04x}");
    }
}

fn open_link(link: &LinkCfg, dry_run: bool) -> Result<DynLink> {
    if dry_run || link.device.is_none() {
        if !dry_run {
            tracing::warn!("no serial.device configured; using a simulated link");
        }
        return Ok(Box::new(SimulatedLink::new()));
    }
    open_serial(link)
}

#[cfg(feature = "hardware")]
fn open_serial(link: &LinkCfg) -> Result<DynLink> {
    let device = link.device.as_deref().unwrap_or_default();
    let serial = walker_hardware::SerialLink::open(device, link.baud, link.read_timeout)
        .map_err(|e| WalkerError::Link(e.to_string()))?;
    Ok(Box::new(serial))
}

#[cfg(not(feature = "hardware"))]
fn open_serial(_link: &LinkCfg) -> Result<DynLink> {
    eyre::bail!("serial.device is set but walker was built without the hardware feature")
}

/// `walker run NAME`
pub fn run(cfg: &walker_config::Config, name: &str, dry_run: bool, steps: Option<u64>, json: bool) -> Result<()> {
    let walker_cfg = WalkerCfg::from(&cfg.walker);
    let link = open_link(&LinkCfg::from(&cfg.serial), dry_run)?;
    let mut walker = FileWalker::with_config(link, &walker_cfg, MonotonicClock::new());
    load_dir(&mut walker, &cfg.walker)?;
    walker.try_select_program(Some(name))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .wrap_err("installing Ctrl-C handler")?;

    let summary = run_until_end_of_cycle(&mut walker, &shutdown, steps, walker_cfg.idle_poll);
    let interrupted = shutdown.load(Ordering::Relaxed);
    if json {
        println!(
            "{}",
            json!({
                "program": name,
                "steps": summary.steps,
                "faults": summary.faults,
                "stop_requested": summary.stop_requested,
                "interrupted": interrupted,
                "is_stop": walker.is_stop(),
                "last_step": walker.step_repr(),
            })
        );
    } else {
        println!(
            "'{name}' finished: {} steps, {} faults{}",
            summary.steps,
            summary.faults,
            if interrupted { " (interrupted)" } else { "" }
        );
        println!("last: {}", walker.step_repr());
    }
    Ok(())
}
