//! Time-domain motion functions.
//!
//! A `Function` is an expression valid on a closed millisecond interval. A
//! servo's `MotorFunctions` is an ordered list of them; at any moment the
//! first Function whose interval contains the time elapsed since the servo's
//! anchor produces the setpoint.
//!
//! The anchor is run state, not program data: it is owned by the caller (the
//! walker keeps one per servo) and passed in by reference, so a loaded
//! Program stays immutable.

use std::fmt;

use crate::error::ExprError;
use crate::expr::Expr;

/// An expression over `t` valid on `[int_min, int_max]` milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    expr: Expr,
    int_min: i64,
    int_max: i64,
}

impl Function {
    /// Build from a compiled expression and interval bounds given in any
    /// order.
    pub fn new(expr: Expr, a: i64, b: i64) -> Self {
        Self {
            expr,
            int_min: a.min(b),
            int_max: a.max(b),
        }
    }

    /// Compile `src` and build the Function.
    pub fn parse(src: &str, a: i64, b: i64) -> Result<Self, ExprError> {
        Ok(Self::new(Expr::compile(src)?, a, b))
    }

    pub fn int_min(&self) -> i64 {
        self.int_min
    }

    pub fn int_max(&self) -> i64 {
        self.int_max
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    #[inline]
    pub fn contains(&self, elapsed_ms: i64) -> bool {
        (self.int_min..=self.int_max).contains(&elapsed_ms)
    }

    /// Value at `elapsed_ms` since the anchor.
    #[inline]
    pub fn value_at(&self, elapsed_ms: i64) -> f64 {
        self.expr.eval(elapsed_ms as f64)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..={}] {}", self.int_min, self.int_max, self.expr)
    }
}

/// Ordered motion functions for one servo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotorFunctions {
    fcs: Vec<Function>,
}

impl MotorFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fc: Function) {
        self.fcs.push(fc);
    }

    pub fn is_empty(&self) -> bool {
        self.fcs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fcs.len()
    }

    pub fn functions(&self) -> &[Function] {
        &self.fcs
    }

    /// Value of the first Function covering `elapsed_ms`, if any.
    pub fn value_at(&self, elapsed_ms: i64) -> Option<f64> {
        self.fcs
            .iter()
            .find(|fc| fc.contains(elapsed_ms))
            .map(|fc| fc.value_at(elapsed_ms))
    }

    /// Next setpoint for the servo at time `now_ms`.
    ///
    /// When no Function covers `now_ms - anchor` and `looping` is set, the
    /// anchor is moved so that the elapsed time equals the first Function's
    /// lower bound and the lookup is retried exactly once. `None` marks the
    /// end of the cycle.
    pub fn next_pos(&self, anchor: &mut i64, now_ms: i64, looping: bool) -> Option<f64> {
        if let Some(v) = self.value_at(now_ms.saturating_sub(*anchor)) {
            return Some(v);
        }
        if !looping {
            return None;
        }
        let first = self.fcs.first()?;
        *anchor = now_ms.saturating_sub(first.int_min);
        tracing::trace!(anchor = *anchor, "motion functions wrapped");
        self.value_at(now_ms.saturating_sub(*anchor))
    }
}
