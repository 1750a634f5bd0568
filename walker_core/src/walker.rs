//! The FileWalker execution engine.
//!
//! Holds the registry of loaded Programs, the current selection and its run
//! state (cursor, phase, per-servo anchors), and turns due ticks into frames
//! on the link.
//!
//! ```text
//! Idle --select(name)--> Running{Init} --init done--> Running{Main}
//!   ^                         |                           |
//!   |                   request_stop                request_stop
//!   |                         v                           v
//!   +------end of cycle---- Stopping <--------------------+
//! ```
//!
//! A tick only fires once the delay of the previous Step has elapsed. The end
//! of a cycle (sequence exhausted, functions out of domain, or a stop request
//! honoured) clears the selection and raises `is_stop`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use walker_traits::{ByteLink, Clock, MonotonicClock};

use crate::config::{SelectPolicy, WalkerCfg};
use crate::distributor::{MotorDistributor, SERVOS_PER_PIC};
use crate::error::{Report, Result, WalkerError};
use crate::program::{Program, UseMode};
use crate::status::{Phase, TickStatus, WalkerState};
use crate::step::{SERVO_COUNT, Step, truncate_raw};
use crate::stop::StopHandle;
use crate::util::ms_to_i64;

/// Run state of the selected Program. Keyed by name; the Program itself
/// stays in the registry.
#[derive(Debug, Clone)]
struct Run {
    name: String,
    phase: Phase,
    cursor: usize,
    anchors: [i64; SERVO_COUNT],
}

/// Plays registered walk-file Programs onto the servo boards.
///
/// Owns the name→Program registry, the run state of the current selection
/// and the `MotorDistributor` for the link. Call [`do_tick`](Self::do_tick)
/// repeatedly from one loop; stop requests arrive through the `StopHandle`.
pub struct FileWalker<L: ByteLink> {
    programs: HashMap<String, Program>,
    run: Option<Run>,
    distributor: MotorDistributor<L>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    last_tick_ms: u64,
    target_diff_ms: u64,
    stop: StopHandle,
    policy: SelectPolicy,
    last_step: Option<Step>,
}

impl<L: ByteLink> FileWalker<L> {
    /// Walker on the real clock with default settings.
    pub fn new(link: L) -> Self {
        Self::with_config(link, &WalkerCfg::default(), MonotonicClock::new())
    }

    pub fn with_config<C: Clock + Send + Sync + 'static>(link: L, cfg: &WalkerCfg, clock: C) -> Self {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(clock);
        let epoch = clock.now();
        let stop = StopHandle::new();
        // Nothing is running yet.
        stop.set_is_stop(true);
        Self {
            programs: HashMap::new(),
            run: None,
            distributor: MotorDistributor::with_guard(link, cfg.guard),
            clock,
            epoch,
            last_tick_ms: 0,
            target_diff_ms: 0,
            stop,
            policy: cfg.select_policy,
            last_step: None,
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    // ── registry ────────────────────────────────────────────────────────────

    /// Parse, validate and register a walk file. Returns whether the Program
    /// was registered.
    pub fn load_program(&mut self, path: &Path) -> bool {
        match self.try_load_program(path) {
            Ok(name) => {
                tracing::info!(name = %name, path = %path.display(), "program loaded");
                true
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "program not loaded");
                false
            }
        }
    }

    /// Like [`load_program`](Self::load_program) but reports why a file was
    /// rejected. Returns the registered name.
    pub fn try_load_program(&mut self, path: &Path) -> Result<String> {
        let program = Program::load(path)?;
        self.register(program)
            .map_err(Report::new)
            .wrap_err_with(|| format!("walk file {}", path.display()))
    }

    /// Validate and register a parsed Program under its name, replacing any
    /// Program of the same name.
    pub fn register(&mut self, program: Program) -> std::result::Result<String, WalkerError> {
        program.validate()?;
        let name = program.name().to_string();
        if self.programs.contains_key(&name) {
            if self.selected_name() == Some(name.as_str()) {
                tracing::warn!(name = %name, "replacing the running program");
            } else {
                tracing::debug!(name = %name, "replacing registered program");
            }
        }
        self.programs.insert(name.clone(), program);
        Ok(name)
    }

    /// Registered names, sorted.
    pub fn program_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.programs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn program(&self, name: &str) -> Option<&Program> {
        self.programs.get(name)
    }

    // ── selection ───────────────────────────────────────────────────────────

    /// Select a Program by name, or request a graceful stop with `None`.
    /// Failures are logged and reported as `false`.
    pub fn select_program(&mut self, name: Option<&str>) -> bool {
        match self.try_select_program(name) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "selection refused");
                false
            }
        }
    }

    pub fn try_select_program(&mut self, name: Option<&str>) -> std::result::Result<(), WalkerError> {
        let Some(name) = name else {
            if self.run.is_none() {
                return Err(WalkerError::Selection("nothing is selected".into()));
            }
            self.stop.set_should_stop(true);
            tracing::info!("stop requested");
            return Ok(());
        };
        if !self.programs.contains_key(name) {
            return Err(WalkerError::Selection(format!("unknown program '{name}'")));
        }
        if self.policy == SelectPolicy::RejectWhileRunning
            && let Some(run) = &self.run
        {
            return Err(WalkerError::Selection(format!(
                "'{}' is still running",
                run.name
            )));
        }

        let now = ms_to_i64(self.now_ms());
        self.run = Some(Run {
            name: name.to_string(),
            phase: Phase::Init,
            cursor: 0,
            anchors: [now; SERVO_COUNT],
        });
        self.stop.set_should_stop(false);
        self.stop.set_is_stop(false);
        self.last_tick_ms = self.now_ms();
        self.target_diff_ms = 0;
        tracing::info!(name, "program selected");
        Ok(())
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.name.as_str())
    }

    pub fn selected(&self) -> Option<&Program> {
        self.run.as_ref().and_then(|r| self.programs.get(&r.name))
    }

    pub fn state(&self) -> WalkerState {
        let Some(run) = &self.run else {
            return WalkerState::Idle;
        };
        let Some(mode) = self.programs.get(&run.name).and_then(Program::mode) else {
            return WalkerState::Idle;
        };
        if self.stop.should_stop() {
            WalkerState::Stopping {
                mode,
                phase: run.phase,
            }
        } else {
            WalkerState::Running {
                mode,
                phase: run.phase,
            }
        }
    }

    /// Handle to the stop request/acknowledge flags.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }

    pub fn is_stop(&self) -> bool {
        self.stop.is_stop()
    }

    // ── stepping ────────────────────────────────────────────────────────────

    /// Next Step of the selected Program, or `None` at the end of its cycle.
    pub fn get_next_step(&mut self) -> Option<Step> {
        let now = ms_to_i64(self.now_ms());
        let should_stop = self.stop.should_stop();
        let run = self.run.as_mut()?;
        let program = self.programs.get(&run.name)?;
        let mode = program.mode()?;

        if run.phase == Phase::Init {
            if let Some(step) = program.init_steps().get(run.cursor) {
                run.cursor += 1;
                return Some(*step);
            }
            run.phase = Phase::Main;
            run.cursor = 0;
            run.anchors = [now; SERVO_COUNT];
            tracing::debug!(name = %run.name, "init steps done");
        }

        match mode {
            UseMode::Prg => {
                let steps = program.prg_steps();
                if run.cursor >= steps.len() {
                    if program.looping() && !should_stop && !steps.is_empty() {
                        run.cursor = 0;
                    } else {
                        return None;
                    }
                }
                let step = steps[run.cursor];
                run.cursor += 1;
                Some(step)
            }
            UseMode::Mot => {
                let looping = program.looping() && !should_stop;
                let mut step = Step::new();
                step.set_delay_ms(program.tick_ms());
                for (slot, (fcs, anchor)) in program
                    .motor_functions()
                    .iter()
                    .zip(run.anchors.iter_mut())
                    .enumerate()
                {
                    let value = fcs.next_pos(anchor, now, looping)?;
                    step.set_raw(slot, truncate_raw(value));
                }
                Some(step)
            }
        }
    }

    /// Send every servo setpoint of `step` to its board.
    ///
    /// Servo `i` lives on pic `i / 4 + 1` at local address `i % 4`. The first
    /// out-of-range field or link failure abandons the rest of the Step.
    pub fn do_step(&mut self, step: &Step) -> std::result::Result<(), WalkerError> {
        tracing::debug!(step = %step, "executing step");
        for (i, raw) in step.positions().iter().enumerate() {
            let pic = (i / SERVOS_PER_PIC + 1) as i64;
            let servo = (i % SERVOS_PER_PIC) as i64;
            self.distributor
                .command(pic, servo, 0, i64::from(*raw))
                .inspect_err(|e| tracing::warn!(slot = i, error = %e, "step abandoned"))?;
        }
        Ok(())
    }

    /// Arm the delay before the next tick may fire.
    pub fn set_next_diff(&mut self, ms: u64) {
        self.target_diff_ms = ms;
    }

    /// Run one iteration of the walker.
    pub fn do_tick(&mut self) -> TickStatus {
        match self.distributor.read() {
            Ok(Some(byte)) => tracing::trace!(byte, "controller reply"),
            Ok(None) => {}
            Err(e) => tracing::debug!(error = %e, "link read failed"),
        }

        let Some(tick_ms) = self.selected().map(Program::tick_ms) else {
            return TickStatus::Idle;
        };
        if self.now_ms().saturating_sub(self.last_tick_ms) < self.target_diff_ms {
            return TickStatus::Waiting;
        }

        let started = self.now_ms();
        let status = match self.get_next_step() {
            Some(step) => {
                self.stop.set_is_stop(false);
                self.last_step = Some(step);
                self.set_next_diff(step.delay_ms());
                match self.do_step(&step) {
                    Ok(()) => TickStatus::Stepped,
                    Err(e) => TickStatus::Faulted(e),
                }
            }
            None => {
                self.set_next_diff(tick_ms);
                self.stop.set_is_stop(true);
                if let Some(run) = self.run.take() {
                    tracing::info!(name = %run.name, "end of cycle; program deselected");
                }
                TickStatus::EndOfCycle
            }
        };
        let now = self.now_ms();
        tracing::trace!(exec_ms = now.saturating_sub(started), "tick");
        self.last_tick_ms = now;
        status
    }

    // ── diagnostics ─────────────────────────────────────────────────────────

    /// Last Step handed to the board.
    pub fn last_step(&self) -> Option<&Step> {
        self.last_step.as_ref()
    }

    /// Diagnostic text of the last Step, or `Step[]` before the first one.
    pub fn step_repr(&self) -> String {
        self.last_step
            .map_or_else(|| "Step[]".to_string(), |s| s.to_string())
    }

    /// Shared clock driving tick gating and motion-function time.
    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    pub fn distributor(&self) -> &MotorDistributor<L> {
        &self.distributor
    }
}

impl<L: ByteLink> std::fmt::Debug for FileWalker<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWalker")
            .field("programs", &self.program_names())
            .field("selected", &self.selected_name())
            .field("state", &self.state())
            .field("target_diff_ms", &self.target_diff_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::NullLink;

    fn prg(name: &str, looping: bool) -> Program {
        Program::parse_str(&format!(
            "[info]\nName={name}\nTick=10\nUse=prg\nLooping={looping}\n[end]\n\
             [prg]\n>40\n>50\n[end]\n"
        ))
    }

    #[test]
    fn deselect_with_nothing_selected_fails() {
        let mut w = FileWalker::new(NullLink);
        assert!(!w.select_program(None));
        assert!(matches!(
            w.try_select_program(None),
            Err(WalkerError::Selection(_))
        ));
    }

    #[test]
    fn config_guard_reaches_the_distributor() {
        let cfg = WalkerCfg {
            guard: std::time::Duration::from_micros(120),
            ..WalkerCfg::default()
        };
        let w = FileWalker::with_config(NullLink, &cfg, MonotonicClock::new());
        assert_eq!(w.distributor().guard(), cfg.guard);
        assert!(w.state().is_idle());
        assert!(w.is_stop());
    }

    #[test]
    fn register_rejects_invalid_program() {
        let mut w = FileWalker::new(NullLink);
        let bad = Program::parse_str("[info]\nName=x\n[end]\n");
        assert!(w.register(bad).is_err());
        assert!(w.program_names().is_empty());
    }

    #[test]
    fn register_overwrites_by_name() {
        let mut w = FileWalker::new(NullLink);
        w.register(prg("a", false)).unwrap();
        w.register(prg("a", true)).unwrap();
        assert_eq!(w.program_names(), vec!["a"]);
        assert!(w.program("a").unwrap().looping());
    }

    #[test]
    fn replace_policy_switches_programs() {
        let mut w = FileWalker::new(NullLink);
        w.register(prg("a", true)).unwrap();
        w.register(prg("b", true)).unwrap();
        assert!(w.select_program(Some("a")));
        assert!(w.select_program(Some("b")));
        assert_eq!(w.selected_name(), Some("b"));
    }

    #[test]
    fn reject_policy_keeps_running_program() {
        let cfg = WalkerCfg {
            select_policy: SelectPolicy::RejectWhileRunning,
            ..WalkerCfg::default()
        };
        let mut w = FileWalker::with_config(NullLink, &cfg, MonotonicClock::new());
        w.register(prg("a", true)).unwrap();
        w.register(prg("b", true)).unwrap();
        assert!(w.select_program(Some("a")));
        assert!(!w.select_program(Some("b")));
        assert_eq!(w.selected_name(), Some("a"));
    }

    #[test]
    fn prg_returns_every_step_then_none() {
        let mut w = FileWalker::new(NullLink);
        w.register(prg("a", false)).unwrap();
        w.select_program(Some("a"));
        let first = w.get_next_step().unwrap();
        let second = w.get_next_step().unwrap();
        assert_eq!(first.raw(0), Some(40));
        assert_eq!(second.raw(0), Some(50));
        assert_eq!(second.delay_ms(), 10);
        assert_eq!(w.get_next_step(), None);
    }

    #[test]
    fn step_repr_before_any_step() {
        let w = FileWalker::new(NullLink);
        assert_eq!(w.step_repr(), "Step[]");
        assert!(w.is_stop());
    }
}
