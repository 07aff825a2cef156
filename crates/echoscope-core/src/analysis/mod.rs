//! # Waveform Analysis
//!
//! Pure, synchronous scoring stages. Every function here is deterministic in
//! its inputs; fetching lives in [`crate::pipeline`].
//!
//! | Stage | Entry point |
//! |-------|-------------|
//! | Normalizer | [`normalize`] |
//! | Reference aggregator | [`aggregate_reference`] |
//! | Alignment and correlation | [`phase_correlation`] |
//! | Collapse trigger | [`CollapseTrigger::evaluate`] |
//! | Memory strength | [`memory_strength`] |
//! | Score composer | [`compose_score`], [`Classification::from_score`] |

mod correlation;
mod memory;
mod normalize;
mod reference;
mod returns;
mod score;
mod trigger;

use serde::{Deserialize, Serialize};

pub use correlation::{pearson, phase_correlation, shift_forward, Correlation, UndefinedReason};
pub use memory::memory_strength;
pub use normalize::{normalize, NormalizedSeries};
pub use reference::{
    aggregate_reference, ReferenceAggregate, ReferenceCandidate, ReferenceWaveform,
    ShortCandidate,
};
pub use returns::ReturnSeries;
pub use score::{compose_score, Classification, ScoreThresholds};
pub use trigger::CollapseTrigger;

use crate::{AssetAddress, EchoError, ValidationError};

/// Tunable constants of the scoring stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Steps the reference waveform lags the target by.
    pub phase_shift: usize,
    /// Absolute return a step must exceed to count as a jump or reversal.
    pub step_threshold: f64,
    pub thresholds: ScoreThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            phase_shift: 1,
            step_threshold: 0.10,
            thresholds: ScoreThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.step_threshold.is_finite() || self.step_threshold <= 0.0 {
            return Err(ValidationError::InvalidConfig {
                field: "analysis.step_threshold",
                reason: format!("must be finite and positive, got {}", self.step_threshold),
            });
        }
        self.thresholds.validate()
    }
}

/// Everything the scoring stages derived from one target and its references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoAnalysis {
    /// Observation count L shared by the target and the reference waveform.
    pub observations: usize,
    pub reference_members: Vec<AssetAddress>,
    pub short_candidates: Vec<ShortCandidate>,
    pub correlation: Correlation,
    pub trigger: CollapseTrigger,
    pub memory_strength: f64,
    pub score: f64,
    pub classification: Classification,
}

/// Runs every scoring stage over already-normalized inputs.
pub fn analyze(
    target: &NormalizedSeries,
    candidates: &[ReferenceCandidate],
    config: &AnalysisConfig,
) -> Result<EchoAnalysis, EchoError> {
    config.validate()?;

    let observations = target.len();
    let aggregate = aggregate_reference(observations, candidates)?;
    let correlation = phase_correlation(
        target.values(),
        aggregate.waveform.values(),
        config.phase_shift,
    );

    let returns = target.returns();
    let trigger = CollapseTrigger::evaluate(&returns, config.step_threshold);
    let memory_strength = memory_strength(&returns);
    let score = compose_score(trigger.gate(), correlation, memory_strength);
    let classification = Classification::from_score(score, &config.thresholds);

    Ok(EchoAnalysis {
        observations,
        reference_members: aggregate.waveform.members().to_vec(),
        short_candidates: aggregate.short,
        correlation,
        trigger,
        memory_strength,
        score,
        classification,
    })
}
