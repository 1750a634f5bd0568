use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalkerError {
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{field} out of range: {value}")]
    Range { field: &'static str, value: i64 },
    #[error("selection error: {0}")]
    Selection(String),
    #[error("link error: {0}")]
    Link(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Failure to compile a motion-function expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {at}")]
    UnexpectedChar { ch: char, at: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown name '{0}'")]
    UnknownName(String),
    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("empty expression")]
    Empty,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("expression longer than {0} tokens")]
    TooLong(usize),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
