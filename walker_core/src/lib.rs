#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Walk-file servo engine (hardware-agnostic).
//!
//! Parses walk files into immutable [`Program`]s, plays them tick by tick in a
//! [`FileWalker`] and encodes every servo setpoint as a two-byte frame for
//! the controller boards. All hardware access goes through
//! `walker_traits::ByteLink`; time comes from `walker_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Step**: twelve raw setpoints plus a delay (`step` module)
//! - **Expressions**: sandboxed numeric evaluator over `t` (`expr` module)
//! - **Functions**: interval-selected expressions per servo (`function`)
//! - **Programs**: walk-file parser and validation (`parser`, `program`)
//! - **Wire frames**: `MotorDistributor` (`distributor`)
//! - **Execution**: `FileWalker` state machine and `TickRunner` thread
//!
//! ## Units
//!
//! Setpoints are stored in the servos' raw unit (nominal 35..=157). Walk
//! files may give degrees or milliradians; these are converted and truncated
//! on load. Motion functions produce raw values directly.

pub mod config;
pub mod conversions;
pub mod distributor;
pub mod error;
pub mod expr;
pub mod function;
pub mod hw_error;
pub mod mocks;
pub mod parser;
pub mod program;
pub mod runner;
pub mod status;
pub mod step;
pub mod stop;
pub mod util;
pub mod walker;

pub use config::{LinkCfg, SelectPolicy, WalkerCfg};
pub use distributor::MotorDistributor;
pub use error::{ExprError, WalkerError};
pub use expr::Expr;
pub use function::{Function, MotorFunctions};
pub use program::{Program, UseMode};
pub use runner::{RunSummary, TickRunner, run_until_end_of_cycle};
pub use status::{Phase, TickStatus, WalkerState};
pub use step::{SERVO_COUNT, Step};
pub use stop::StopHandle;
pub use walker::FileWalker;
