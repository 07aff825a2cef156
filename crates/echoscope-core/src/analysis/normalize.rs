use serde::Serialize;

use crate::analysis::returns::ReturnSeries;
use crate::{AssetSeries, EchoError, ValidationError};

/// Price trajectory rescaled so its first observation is exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedSeries(Vec<f64>);

impl NormalizedSeries {
    /// Wraps already-normalized values. The first value must be 1.0 and every
    /// value finite.
    pub fn from_values(values: Vec<f64>) -> Result<Self, EchoError> {
        let first = *values.first().ok_or(EchoError::EmptySeries)?;
        if values.iter().any(|value| !value.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "normalized" }.into());
        }
        if first != 1.0 {
            return Err(ValidationError::UnanchoredSeries { first }.into());
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first `len` values, or `None` when the series is shorter.
    pub fn prefix(&self, len: usize) -> Option<&[f64]> {
        self.0.get(..len)
    }

    pub fn returns(&self) -> ReturnSeries {
        ReturnSeries::from_levels(&self.0)
    }
}

/// Divides every price by the first one.
pub fn normalize(series: &AssetSeries) -> Result<NormalizedSeries, EchoError> {
    let base = series
        .points()
        .first()
        .map(|point| point.value)
        .ok_or(EchoError::EmptySeries)?;

    if base == 0.0 {
        return Err(EchoError::DivisionUndefined);
    }

    let values = series.prices().map(|price| price / base).collect();
    Ok(NormalizedSeries(values))
}
