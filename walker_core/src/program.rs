//! Parsed, immutable representation of one walk file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::WalkerError;
use crate::function::MotorFunctions;
use crate::step::{SERVO_COUNT, Step};

/// How a Program produces its main-phase Steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseMode {
    /// Steps synthesized each tick from per-servo motion functions.
    Mot,
    /// Pre-authored Step sequence.
    Prg,
}

impl UseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UseMode::Mot => "mot",
            UseMode::Prg => "prg",
        }
    }
}

impl FromStr for UseMode {
    type Err = WalkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mot" => Ok(UseMode::Mot),
            "prg" => Ok(UseMode::Prg),
            other => Err(WalkerError::Validation(format!(
                "unknown use mode '{other}' (expected 'mot' or 'prg')"
            ))),
        }
    }
}

impl fmt::Display for UseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One loaded walk file.
///
/// Built by [`crate::parser`]; all fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) path: Option<PathBuf>,
    pub(crate) file_version: String,
    pub(crate) id: i64,
    pub(crate) prg_version: String,
    pub(crate) name: String,
    pub(crate) speed: i64,
    pub(crate) looping: bool,
    pub(crate) tick_ms: u64,
    pub(crate) use_mode: Option<String>,
    pub(crate) init_steps: Vec<Step>,
    pub(crate) prg_steps: Vec<Step>,
    pub(crate) mot_fcs: [MotorFunctions; SERVO_COUNT],
}

impl Default for Program {
    fn default() -> Self {
        Self {
            path: None,
            file_version: String::new(),
            id: 0,
            prg_version: String::new(),
            name: String::new(),
            speed: 0,
            looping: false,
            tick_ms: 0,
            use_mode: None,
            init_steps: Vec::new(),
            prg_steps: Vec::new(),
            mot_fcs: std::array::from_fn(|_| MotorFunctions::new()),
        }
    }
}

impl Program {
    /// Read and parse a walk file. Only I/O failures are errors here;
    /// malformed lines are skipped by the parser.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        crate::parser::parse_file(path)
    }

    /// Parse walk-file text held in memory.
    pub fn parse_str(text: &str) -> Self {
        crate::parser::parse_str(text)
    }

    /// Check that the Program can be executed and return its mode.
    pub fn validate(&self) -> Result<UseMode, WalkerError> {
        let raw = self
            .use_mode
            .as_deref()
            .ok_or_else(|| WalkerError::Validation("Use is not set".into()))?;
        let mode = raw.parse::<UseMode>()?;
        if mode == UseMode::Mot
            && let Some(idx) = self.mot_fcs.iter().position(MotorFunctions::is_empty)
        {
            return Err(WalkerError::Validation(format!(
                "mot mode needs functions for every servo; [m{idx}] is empty"
            )));
        }
        Ok(mode)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Mode declared by `Use`, if it names a known mode.
    pub fn mode(&self) -> Option<UseMode> {
        self.use_mode.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_version(&self) -> &str {
        &self.file_version
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.prg_version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> i64 {
        self.speed
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Default delay between Steps in milliseconds.
    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn init_steps(&self) -> &[Step] {
        &self.init_steps
    }

    pub fn prg_steps(&self) -> &[Step] {
        &self.prg_steps
    }

    pub fn motor_functions(&self) -> &[MotorFunctions; SERVO_COUNT] {
        &self.mot_fcs
    }
}
