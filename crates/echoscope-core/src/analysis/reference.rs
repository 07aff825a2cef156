use serde::Serialize;

use crate::analysis::NormalizedSeries;
use crate::{AssetAddress, EchoError};

/// Normalized history of one basket member offered to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCandidate {
    pub address: AssetAddress,
    pub label: Option<String>,
    pub series: NormalizedSeries,
}

impl ReferenceCandidate {
    pub fn new(address: AssetAddress, series: NormalizedSeries) -> Self {
        Self {
            address,
            label: None,
            series,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Candidate dropped because its history is shorter than the target's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortCandidate {
    pub address: AssetAddress,
    pub label: Option<String>,
    pub observations: usize,
    pub required: usize,
}

/// Elementwise mean of the retained basket trajectories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceWaveform {
    values: Vec<f64>,
    members: Vec<AssetAddress>,
}

impl ReferenceWaveform {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Addresses that contributed to the mean, in address order.
    pub fn members(&self) -> &[AssetAddress] {
        &self.members
    }
}

/// Aggregation output: the waveform and the candidates left out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceAggregate {
    pub waveform: ReferenceWaveform,
    pub short: Vec<ShortCandidate>,
}

/// Truncates every candidate with at least `required_len` observations to its
/// first `required_len` values and averages them elementwise.
///
/// Shorter candidates are reported in [`ReferenceAggregate::short`], never padded.
/// Retained members are summed in address order, so the result does not depend
/// on the order the candidates arrive in.
pub fn aggregate_reference(
    required_len: usize,
    candidates: &[ReferenceCandidate],
) -> Result<ReferenceAggregate, EchoError> {
    let mut retained: Vec<(&AssetAddress, &[f64])> = Vec::with_capacity(candidates.len());
    let mut short = Vec::new();

    for candidate in candidates {
        match candidate.series.prefix(required_len) {
            Some(prefix) if required_len > 0 => retained.push((&candidate.address, prefix)),
            _ => short.push(ShortCandidate {
                address: candidate.address.clone(),
                label: candidate.label.clone(),
                observations: candidate.series.len(),
                required: required_len,
            }),
        }
    }

    if retained.is_empty() {
        return Err(EchoError::InsufficientReferenceData {
            required: required_len,
            offered: candidates.len(),
        });
    }

    retained.sort_by(|left, right| left.0.cmp(right.0));

    let mut sums = vec![0.0_f64; required_len];
    for (_, prefix) in &retained {
        for (sum, value) in sums.iter_mut().zip(prefix.iter()) {
            *sum += value;
        }
    }

    let count = retained.len() as f64;
    let values = sums.into_iter().map(|sum| sum / count).collect();
    let members = retained
        .into_iter()
        .map(|(address, _)| address.clone())
        .collect();

    Ok(ReferenceAggregate {
        waveform: ReferenceWaveform { values, members },
        short,
    })
}
