use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::analysis::Correlation;
use crate::ValidationError;

/// Lower bounds (exclusive) of the three upper classification buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    pub insider_echo: f64,
    pub likely_pump: f64,
    pub weak_signal: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            insider_echo: 0.8,
            likely_pump: 0.5,
            weak_signal: 0.2,
        }
    }
}

impl ScoreThresholds {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = [self.insider_echo, self.likely_pump, self.weak_signal]
            .iter()
            .all(|value| value.is_finite());
        if !finite || self.insider_echo <= self.likely_pump || self.likely_pump <= self.weak_signal
        {
            return Err(ValidationError::InvalidThresholds);
        }
        Ok(())
    }
}

/// Ordered score buckets, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    InsiderEcho,
    LikelyPump,
    WeakSignal,
    DecaySignature,
}

impl Classification {
    pub const ALL: [Self; 4] = [
        Self::InsiderEcho,
        Self::LikelyPump,
        Self::WeakSignal,
        Self::DecaySignature,
    ];

    /// Evaluated high to low; the first bucket whose bound the score exceeds wins.
    pub fn from_score(score: f64, thresholds: &ScoreThresholds) -> Self {
        if score > thresholds.insider_echo {
            Self::InsiderEcho
        } else if score > thresholds.likely_pump {
            Self::LikelyPump
        } else if score > thresholds.weak_signal {
            Self::WeakSignal
        } else {
            Self::DecaySignature
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InsiderEcho => "Insider Echo Detected",
            Self::LikelyPump => "Likely Pump, Reflector Sync",
            Self::WeakSignal => "Weak Signal, Probationary Phase",
            Self::DecaySignature => "Decay Signature Detected",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// `gate × correlation × ln(1 + memory_strength)`.
///
/// Undefined correlation counts as zero and the result is always finite.
/// Negative zero is folded into zero.
pub fn compose_score(gate: f64, correlation: Correlation, memory_strength: f64) -> f64 {
    let weight = memory_strength.max(0.0).ln_1p();
    let score = gate * correlation.or_zero() * weight;
    if !score.is_finite() || score == 0.0 {
        0.0
    } else {
        score
    }
}
