//! DELTA CALCULATOR
//!
//! Percentage change of a value against a baseline:
//!
//!   delta = (current - baseline) / baseline × 100
//!
//! A zero (or non-finite) baseline has no meaningful percentage, so the result
//! is `Delta::Undefined` and renders as the placeholder `-`. Nothing here ever
//! produces NaN or infinity.
//!
//! Display form: `↑ 12.34%` for increases (including exactly 0), `↓ 5.00%` for
//! decreases. The magnitude is the absolute value rounded to 2 decimals.

use crate::utils::format::{fmt_fixed2, round2, PLACEHOLDER};
use serde::Serialize;
use std::fmt;

/// Direction of change relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
        }
    }
}

/// Percentage change against a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Delta {
    /// Baseline was zero or an input was not finite
    Undefined,
    Change {
        direction: Direction,
        /// |percent| rounded to 2 decimals
        magnitude: f64,
        /// Signed, unrounded percentage
        percent: f64,
    },
}

impl Delta {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Delta::Undefined)
    }

    /// Signed, unrounded percentage, if defined
    pub fn percent(&self) -> Option<f64> {
        match self {
            Delta::Undefined => None,
            Delta::Change { percent, .. } => Some(*percent),
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Delta::Undefined => None,
            Delta::Change { direction, .. } => Some(*direction),
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Undefined => f.write_str(PLACEHOLDER),
            Delta::Change { direction, magnitude, .. } => {
                write!(f, "{} {}%", direction.arrow(), fmt_fixed2(*magnitude))
            }
        }
    }
}

/// Percentage change of `current` relative to `baseline`
pub fn percent_delta(current: f64, baseline: f64) -> Delta {
    if baseline == 0.0 || !baseline.is_finite() || !current.is_finite() {
        return Delta::Undefined;
    }

    let percent = (current - baseline) / baseline * 100.0;
    if !percent.is_finite() {
        return Delta::Undefined;
    }
    let direction = if percent >= 0.0 { Direction::Up } else { Direction::Down };

    Delta::Change {
        direction,
        magnitude: round2(percent.abs()),
        percent,
    }
}

/// Deltas of a predicted (min, max) range against one baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeDelta {
    pub min: Delta,
    pub max: Delta,
}

impl RangeDelta {
    pub fn is_undefined(&self) -> bool {
        self.min.is_undefined() && self.max.is_undefined()
    }
}

impl fmt::Display for RangeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            return f.write_str(PLACEHOLDER);
        }
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Both ends of a range against the same baseline, each with its own direction
pub fn range_delta(min: f64, max: f64, baseline: f64) -> RangeDelta {
    RangeDelta {
        min: percent_delta(min, baseline),
        max: percent_delta(max, baseline),
    }
}
