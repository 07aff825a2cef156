use serde::Serialize;

use crate::analysis::ReturnSeries;

/// Directional gate over the large moves of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollapseTrigger {
    /// Returns strictly above `+threshold`, including rises off a zero level.
    pub jumps: usize,
    /// Returns strictly below `-threshold`.
    pub reversals: usize,
    pub open: bool,
}

impl CollapseTrigger {
    /// Opens when `jumps / reversals > 1`, or, with no reversals, when there is
    /// at least one jump. Both branches reduce to `jumps > reversals`, which
    /// keeps the ratio boundary (`J == R`) closed without dividing.
    pub const fn from_counts(jumps: usize, reversals: usize) -> Self {
        Self {
            jumps,
            reversals,
            open: jumps > reversals,
        }
    }

    pub fn evaluate(returns: &ReturnSeries, step_threshold: f64) -> Self {
        let jumps = returns
            .values()
            .iter()
            .filter(|value| **value > step_threshold)
            .count();
        let reversals = returns
            .values()
            .iter()
            .filter(|value| **value < -step_threshold)
            .count();
        Self::from_counts(jumps, reversals)
    }

    pub const fn gate(&self) -> f64 {
        if self.open {
            1.0
        } else {
            0.0
        }
    }
}
