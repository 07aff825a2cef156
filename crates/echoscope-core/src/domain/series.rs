use serde::{Deserialize, Serialize};

use crate::{AssetAddress, ValidationError};

/// One observation of an asset's price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub unix_time: i64,
    pub value: f64,
}

impl PricePoint {
    pub fn new(unix_time: i64, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeValue { field: "value" });
        }
        Ok(Self { unix_time, value })
    }
}

/// Time-ordered price history of a single asset.
///
/// Timestamps are strictly increasing and prices are finite and non-negative.
/// An empty series is representable; it is what a provider returns for an asset
/// with no recorded trades in the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeries {
    address: AssetAddress,
    points: Vec<PricePoint>,
}

impl AssetSeries {
    pub fn new(address: AssetAddress, points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        for point in &points {
            PricePoint::new(point.unix_time, point.value)?;
        }

        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].unix_time <= pair[0].unix_time {
                return Err(ValidationError::NonIncreasingTimestamp {
                    index: index + 1,
                    previous: pair[0].unix_time,
                    current: pair[1].unix_time,
                });
            }
        }

        Ok(Self { address, points })
    }

    pub fn address(&self) -> &AssetAddress {
        &self.address
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.value)
    }
}
