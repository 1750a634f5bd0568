//! Walker state and per-tick status.

use std::fmt;

use crate::error::WalkerError;
use crate::program::UseMode;

/// Which Step sequence the selected Program is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Replaying `init_steps` once.
    Init,
    /// Main sequence (`prg_steps` or synthesized motion-function Steps).
    Main,
}

/// Externally observable state of a FileWalker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    /// Nothing selected.
    Idle,
    /// A Program is selected and ticking.
    Running { mode: UseMode, phase: Phase },
    /// A stop was requested; the current cycle is being finished.
    Stopping { mode: UseMode, phase: Phase },
}

impl WalkerState {
    pub fn is_idle(self) -> bool {
        matches!(self, WalkerState::Idle)
    }
}

impl fmt::Display for WalkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkerState::Idle => f.write_str("idle"),
            WalkerState::Running { mode, phase } => write!(f, "running ({mode}, {phase:?})"),
            WalkerState::Stopping { mode, phase } => write!(f, "stopping ({mode}, {phase:?})"),
        }
    }
}

/// Result of one `do_tick` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    /// No Program selected; nothing to do.
    Idle,
    /// Selected, but the delay of the previous Step has not elapsed.
    Waiting,
    /// A Step was sent to the board.
    Stepped,
    /// The cycle ended; the selection was cleared and `is_stop` raised.
    EndOfCycle,
    /// The Step fired but could not be transmitted.
    Faulted(WalkerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_mode_and_phase() {
        let running = WalkerState::Running {
            mode: UseMode::Prg,
            phase: Phase::Main,
        };
        assert!(!running.is_idle());
        assert_eq!(running.to_string(), "running (prg, Main)");
        assert!(WalkerState::Idle.is_idle());
    }
}
