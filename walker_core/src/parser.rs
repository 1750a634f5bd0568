//! Walk-file loader.
//!
//! The file is read line by line through a region state machine:
//!
//! ```text
//! @/            file-info block, closed by /@
//! [info]        key=value program metadata
//! [setup]       init Steps, played once
//! [prg]         main Steps
//! [mN]          motion functions for servo N, as `-` separated
//!               Interval=/Function= pairs
//! [end]         closes any region
//! ```
//!
//! `#` starts a comment and blank lines are ignored. A malformed line is
//! reported and dropped; it never aborts the rest of the file.

use std::path::Path;

use eyre::WrapErr;

use crate::error::{Report, Result, WalkerError};
use crate::function::Function;
use crate::program::Program;
use crate::step::{SERVO_COUNT, Step};

pub const FINFO_START: &str = "@/";
pub const FINFO_STOP: &str = "/@";
pub const TAG_INFO: &str = "[info]";
pub const TAG_SETUP: &str = "[setup]";
pub const TAG_PROG: &str = "[prg]";
pub const TAG_END: &str = "[end]";
/// Line that arms a motion-function region for the next pair.
pub const FC_SEPARATOR: &str = "-";

const LOOPING_TRUE: [&str; 5] = ["True", "true", "Yes", "yes", "1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    None,
    FileInfo,
    Info,
    Setup,
    Prog,
    /// Motion functions for a servo; `None` when the tag named a servo that
    /// does not exist and the region is being discarded.
    MotFunc(Option<usize>),
}

/// Result of parsing a walk file, including every line that was dropped.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub program: Program,
    pub skipped: Vec<WalkerError>,
}

/// Read and parse a walk file from disk.
pub fn parse_file(path: &Path) -> Result<Program> {
    Ok(parse_file_with_report(path)?.program)
}

/// Read and parse a walk file, keeping the list of dropped lines.
pub fn parse_file_with_report(path: &Path) -> Result<ParseOutcome> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Report::new(WalkerError::Io(e.to_string())))
        .wrap_err_with(|| format!("reading walk file {}", path.display()))?;
    let mut outcome = parse_with_report(&text);
    outcome.program.path = Some(path.to_path_buf());
    Ok(outcome)
}

/// Parse walk-file text.
pub fn parse_str(text: &str) -> Program {
    parse_with_report(text).program
}

/// Parse walk-file text, keeping the list of dropped lines.
pub fn parse_with_report(text: &str) -> ParseOutcome {
    let mut loader = Loader::default();
    for (idx, raw) in text.lines().enumerate() {
        loader.feed(idx + 1, raw);
    }
    loader.finish()
}

#[derive(Default)]
struct FcPairing {
    unlocked: bool,
    pending: Option<(usize, String)>,
}

struct Loader {
    program: Program,
    region: Region,
    pairing: FcPairing,
    skipped: Vec<WalkerError>,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            program: Program::default(),
            region: Region::None,
            pairing: FcPairing::default(),
            skipped: Vec::new(),
        }
    }
}

impl Loader {
    fn feed(&mut self, line_no: usize, raw: &str) {
        let line = strip_comment(raw);
        if line.is_empty() {
            return;
        }

        if self.region == Region::None {
            self.region = match line {
                FINFO_START => Region::FileInfo,
                TAG_INFO => Region::Info,
                TAG_SETUP => Region::Setup,
                TAG_PROG => Region::Prog,
                _ => match motor_tag(line) {
                    Some(idx) if idx < SERVO_COUNT => Region::MotFunc(Some(idx)),
                    Some(idx) => {
                        self.skip(line_no, format!("no servo [m{idx}]; region ignored"));
                        Region::MotFunc(None)
                    }
                    None => Region::None,
                },
            };
            return;
        }

        if line == TAG_END || (self.region == Region::FileInfo && line == FINFO_STOP) {
            self.close_region();
            return;
        }

        match self.region {
            Region::None => {}
            Region::FileInfo => {
                if let Some(("version", v)) = key_value(line) {
                    self.program.file_version = v.to_string();
                }
            }
            Region::Info => self.info_line(line_no, line),
            Region::Setup => {
                if let Some(step) = self.step_line(line_no, line) {
                    self.program.init_steps.push(step);
                }
            }
            Region::Prog => {
                if let Some(step) = self.step_line(line_no, line) {
                    self.program.prg_steps.push(step);
                }
            }
            Region::MotFunc(idx) => self.fc_line(line_no, line, idx),
        }
    }

    fn finish(mut self) -> ParseOutcome {
        if self.region != Region::None {
            tracing::debug!("walk file ended inside an open region");
            self.close_region();
        }
        ParseOutcome {
            program: self.program,
            skipped: self.skipped,
        }
    }

    fn close_region(&mut self) {
        if let Some((line_no, _)) = self.pairing.pending.take() {
            tracing::debug!(line = line_no, "unpaired motion-function line discarded");
        }
        self.pairing = FcPairing::default();
        self.region = Region::None;
    }

    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        let err = WalkerError::Parse {
            line,
            reason: reason.into(),
        };
        tracing::warn!(error = %err, "walk file line skipped");
        self.skipped.push(err);
    }

    fn info_line(&mut self, line_no: usize, line: &str) {
        let Some((key, value)) = key_value(line) else {
            self.skip(line_no, "expected key=value");
            return;
        };
        let p = &mut self.program;
        match key {
            "Id" => match value.parse() {
                Ok(v) => p.id = v,
                Err(_) => self.skip(line_no, format!("Id is not an integer: {value}")),
            },
            "Version" => p.prg_version = value.to_string(),
            "Name" => p.name = value.to_string(),
            "Speed" => match value.parse() {
                Ok(v) => p.speed = v,
                Err(_) => self.skip(line_no, format!("Speed is not an integer: {value}")),
            },
            "Looping" => p.looping = LOOPING_TRUE.contains(&value),
            "Tick" => match value.parse() {
                Ok(v) => p.tick_ms = v,
                Err(_) => self.skip(line_no, format!("Tick is not a non-negative integer: {value}")),
            },
            "Use" => p.use_mode = Some(value.to_string()),
            other => tracing::debug!(line = line_no, key = other, "unknown info key ignored"),
        }
    }

    fn step_line(&mut self, line_no: usize, line: &str) -> Option<Step> {
        match parse_step(line, self.program.tick_ms) {
            Ok(step) => Some(step),
            Err(reason) => {
                self.skip(line_no, reason);
                None
            }
        }
    }

    fn fc_line(&mut self, line_no: usize, line: &str, idx: Option<usize>) {
        if !self.pairing.unlocked {
            if line == FC_SEPARATOR {
                self.pairing.unlocked = true;
            } else {
                tracing::debug!(line = line_no, "motion-function line before '-' ignored");
            }
            return;
        }
        let Some((first_no, first)) = self.pairing.pending.take() else {
            self.pairing.pending = Some((line_no, line.to_string()));
            return;
        };
        self.pairing.unlocked = false;

        match parse_fc_pair(&first, line) {
            Ok(fc) => match idx {
                Some(i) => self.program.mot_fcs[i].push(fc),
                None => tracing::debug!(line = line_no, "function for unknown servo dropped"),
            },
            Err(reason) => self.skip(first_no, reason),
        }
    }
}

/// Drop a `#` comment and surrounding whitespace.
fn strip_comment(raw: &str) -> &str {
    raw.split_once('#').map_or(raw, |(code, _)| code).trim()
}

/// Servo index of a `[mN]` tag.
fn motor_tag(line: &str) -> Option<usize> {
    let digits = line.strip_prefix("[m")?.strip_suffix(']')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Absurdly long indexes still name a servo that does not exist.
    Some(digits.parse().unwrap_or(usize::MAX))
}

/// Split `key=value` where the key is alphanumeric starting with a letter and
/// the value is non-empty.
fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let mut chars = key.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric()) || value.is_empty() {
        return None;
    }
    Some((key, value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Raw,
    Deg,
    Millirad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotSpec {
    unit: Unit,
    value: i64,
    count: u64,
}

fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_slot_spec(spec: &str) -> std::result::Result<SlotSpec, String> {
    let (unit, rest) = match spec.as_bytes().first() {
        Some(b'd') => (Unit::Deg, &spec[1..]),
        Some(b'r') => (Unit::Millirad, &spec[1..]),
        _ => (Unit::Raw, spec),
    };
    let (value, count) = match rest.split_once("..") {
        Some((v, n)) => (v, Some(n)),
        None => (rest, None),
    };
    let value = parse_digits(value).ok_or_else(|| format!("bad servo value '{spec}'"))?;
    if unit == Unit::Raw && i32::try_from(value).is_err() {
        return Err(format!("raw value too large '{spec}'"));
    }
    let count = match count {
        Some(n) => parse_digits(n).ok_or_else(|| format!("bad repeat count '{spec}'"))? as u64,
        None => 1,
    };
    Ok(SlotSpec { unit, value, count })
}

/// Parse one step line: `>spec,spec,...:delay`.
///
/// A spec is `[d|r]?digits` (raw, degrees or milliradians) optionally
/// followed by `..count` to fill `count` adjacent servos. Slots past the last
/// servo are ignored. Without `:delay` the Step gets `default_tick`.
pub fn parse_step(line: &str, default_tick: u64) -> std::result::Result<Step, String> {
    let body = line
        .strip_prefix('>')
        .ok_or_else(|| "step line must start with '>'".to_string())?;
    let (specs, delay) = match body.split_once(':') {
        Some((specs, delay)) => {
            let ms = parse_digits(delay).ok_or_else(|| format!("bad delay '{delay}'"))?;
            (specs, ms as u64)
        }
        None => (body, default_tick),
    };

    let mut parsed = Vec::new();
    if !specs.is_empty() {
        // A single trailing comma is accepted.
        let specs = specs.strip_suffix(',').unwrap_or(specs);
        for spec in specs.split(',') {
            parsed.push(parse_slot_spec(spec)?);
        }
    }

    let mut step = Step::new();
    step.set_delay_ms(delay);
    let mut slot = 0;
    'fill: for spec in parsed {
        for _ in 0..spec.count {
            if slot == SERVO_COUNT {
                break 'fill;
            }
            match spec.unit {
                Unit::Raw => step.set_raw(slot, spec.value as i32),
                Unit::Deg => step.set_deg(slot, spec.value),
                Unit::Millirad => step.set_millirad(slot, spec.value),
            }
            slot += 1;
        }
    }
    Ok(step)
}

/// Build a Function from an `Interval=`/`Function=` line pair given in either
/// order.
fn parse_fc_pair(a: &str, b: &str) -> std::result::Result<Function, String> {
    let mut interval = None;
    let mut expr = None;
    for line in [a, b] {
        let (key, value) =
            key_value(line).ok_or_else(|| format!("expected key=value, got '{line}'"))?;
        match key {
            "Interval" => {
                let bounds = value
                    .split(|c: char| !c.is_ascii_digit())
                    .filter(|s| !s.is_empty())
                    .take(2)
                    .map(|run| {
                        run.parse::<i64>()
                            .map_err(|_| format!("Interval bound '{run}' is too large"))
                    })
                    .collect::<std::result::Result<Vec<i64>, String>>()?;
                match bounds[..] {
                    [lo, hi] => interval = Some((lo, hi)),
                    _ => return Err(format!("Interval needs two bounds, got '{value}'")),
                }
            }
            "Function" => expr = Some(value),
            other => tracing::debug!(key = other, "unknown motion-function key ignored"),
        }
    }
    let (lo, hi) = interval.ok_or("function pair has no Interval")?;
    let src = expr.ok_or("function pair has no Function")?;
    Function::parse(src, lo, hi).map_err(|e| format!("bad Function '{src}': {e}"))
}
