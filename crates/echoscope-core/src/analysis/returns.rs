use serde::Serialize;

/// Period-over-period relative changes of a trajectory, one per step.
///
/// A step off a zero level keeps its IEEE quotient: a rise from zero is
/// `+inf` and a flat zero step is NaN. Consumers that need finite statistics
/// read [`ReturnSeries::finite`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReturnSeries(Vec<f64>);

impl ReturnSeries {
    pub fn from_levels(levels: &[f64]) -> Self {
        Self(
            levels
                .windows(2)
                .map(|pair| (pair[1] - pair[0]) / pair[0])
                .collect(),
        )
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Returns with the non-finite steps left out.
    pub fn finite(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied().filter(|value| value.is_finite())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
