//! Servo setpoints for one tick of motion.
//!
//! A `Step` holds the raw PWM setpoint of every servo plus the delay before the
//! next Step may fire. Setpoints are stored in the hardware's raw unit; degree
//! and radian inputs are converted on the way in.

use std::f64::consts::PI;
use std::fmt;

/// Number of servos driven by one Step (three controller boards of four).
pub const SERVO_COUNT: usize = 12;

/// Lowest raw value the servos are specified for.
pub const RAW_MIN: i32 = 35;
/// Highest raw value the servos are specified for.
pub const RAW_MAX: i32 = 157;

// Conversion anchors: raw 36 is 0 deg, raw 157 is 191 deg.
const RAW_ZERO: f64 = 36.0;
const RAW_FULL: f64 = 157.0;
const DEG_SPAN: f64 = 191.0;

/// Raw setpoint for an angle in degrees (not truncated).
#[inline]
pub fn raw_from_deg(deg: f64) -> f64 {
    RAW_ZERO + (RAW_FULL - RAW_ZERO) * deg / DEG_SPAN
}

/// Raw setpoint for an angle in radians (not truncated).
#[inline]
pub fn raw_from_rad(rad: f64) -> f64 {
    RAW_ZERO + (RAW_FULL - RAW_ZERO) * rad / (PI * DEG_SPAN / 180.0)
}

/// Raw setpoint for an angle in milliradians (not truncated).
#[inline]
pub fn raw_from_millirad(millirad: f64) -> f64 {
    raw_from_rad(millirad / 1000.0)
}

/// Angle in degrees represented by a raw setpoint.
#[inline]
pub fn deg_from_raw(raw: i32) -> f64 {
    (f64::from(raw) - RAW_ZERO) * DEG_SPAN / (RAW_FULL - RAW_ZERO)
}

/// Angle in radians represented by a raw setpoint.
#[inline]
pub fn rad_from_raw(raw: i32) -> f64 {
    deg_from_raw(raw).to_radians()
}

/// Truncate a computed setpoint toward zero. Non-finite inputs map to 0 and
/// huge values saturate.
#[inline]
pub fn truncate_raw(v: f64) -> i32 {
    v as i32
}

/// Whether a raw value lies inside the servos' nominal range.
#[inline]
pub fn in_hw_range(raw: i32) -> bool {
    (RAW_MIN..=RAW_MAX).contains(&raw)
}

/// Setpoints for all servos plus the delay until the next Step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    pos: [i32; SERVO_COUNT],
    delay_ms: u64,
}

impl Step {
    /// All-zero Step with no delay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a Step from raw setpoints and a delay.
    pub fn from_raw(pos: [i32; SERVO_COUNT], delay_ms: u64) -> Self {
        let mut step = Self::new();
        step.set_all_raw(&pos);
        step.delay_ms = delay_ms;
        step
    }

    pub fn positions(&self) -> &[i32; SERVO_COUNT] {
        &self.pos
    }

    /// Raw setpoint of one servo, or `None` past the last slot.
    pub fn raw(&self, slot: usize) -> Option<i32> {
        self.pos.get(slot).copied()
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, ms: u64) {
        self.delay_ms = ms;
    }

    pub fn set_delay_s(&mut self, s: u64) {
        self.delay_ms = s.saturating_mul(1000);
    }

    pub fn add_delay_ms(&mut self, ms: u64) {
        self.delay_ms = self.delay_ms.saturating_add(ms);
    }

    pub fn add_delay_s(&mut self, s: u64) {
        self.delay_ms = self.delay_ms.saturating_add(s.saturating_mul(1000));
    }

    /// Store a raw setpoint. Values outside the nominal hardware range are
    /// kept but reported.
    pub fn set_raw(&mut self, slot: usize, raw: i32) {
        let Some(p) = self.pos.get_mut(slot) else {
            tracing::warn!(slot, "servo slot out of range; ignored");
            return;
        };
        if !in_hw_range(raw) {
            tracing::warn!(slot, raw, "motor value out of range");
        }
        *p = raw;
    }

    /// Store a setpoint given in whole degrees.
    pub fn set_deg(&mut self, slot: usize, deg: i64) {
        self.set_raw(slot, truncate_raw(raw_from_deg(deg as f64)));
    }

    /// Store a setpoint given in radians.
    pub fn set_rad(&mut self, slot: usize, rad: f64) {
        self.set_raw(slot, truncate_raw(raw_from_rad(rad)));
    }

    /// Store a setpoint given in whole milliradians.
    pub fn set_millirad(&mut self, slot: usize, millirad: i64) {
        self.set_raw(slot, truncate_raw(raw_from_millirad(millirad as f64)));
    }

    /// Fill slots left to right from raw values, stopping at the last servo.
    pub fn set_all_raw(&mut self, values: &[i32]) {
        for (slot, v) in values.iter().take(SERVO_COUNT).enumerate() {
            self.set_raw(slot, *v);
        }
    }

    /// Fill slots left to right from degree values.
    pub fn set_all_deg(&mut self, values: &[i64]) {
        for (slot, v) in values.iter().take(SERVO_COUNT).enumerate() {
            self.set_deg(slot, *v);
        }
    }

    /// Fill slots left to right from radian values.
    pub fn set_all_rad(&mut self, values: &[f64]) {
        for (slot, v) in values.iter().take(SERVO_COUNT).enumerate() {
            self.set_rad(slot, *v);
        }
    }

    /// Reset every slot to zero, keeping the delay.
    pub fn clear_positions(&mut self) {
        self.pos = [0; SERVO_COUNT];
    }
}

/// Diagnostic form with every slot shown in whole degrees.
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Step[pos=[")?;
        for (i, raw) in self.pos.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", deg_from_raw(*raw) as i64)?;
        }
        write!(f, "], delay={}]", self.delay_ms)
    }
}
