use thiserror::Error;

use crate::data_source::SourceError;

/// Validation and contract errors exposed by `echoscope-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("address cannot be empty")]
    EmptyAddress,
    #[error("address length {len} outside allowed range {min}..={max}")]
    AddressLength { len: usize, min: usize, max: usize },
    #[error("address contains non-base58 character '{ch}' at index {index}")]
    AddressInvalidChar { ch: char, index: usize },

    #[error(
        "invalid granularity '{value}', expected one of 1m, 3m, 5m, 15m, 30m, 1H, 2H, 4H, 6H, 8H, 12H, 1D, 3D, 1W"
    )]
    InvalidGranularity { value: String },

    #[error("timestamps must be strictly increasing (index {index}: {previous} -> {current})")]
    NonIncreasingTimestamp {
        index: usize,
        previous: i64,
        current: i64,
    },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("normalized series must start at 1.0, found {first}")]
    UnanchoredSeries { first: f64 },

    #[error("time window start {from} is after end {to}")]
    InvalidWindow { from: i64, to: i64 },
    #[error("signature page limit {value} outside allowed range 1..={max}")]
    InvalidPageLimit { value: usize, max: usize },
    #[error("signature cannot be empty")]
    EmptySignature,

    #[error("basket must contain at least one reference asset")]
    EmptyBasket,
    #[error("score thresholds must be finite and strictly descending")]
    InvalidThresholds,
    #[error("configuration field '{field}' is invalid: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Failure kinds surfaced by the scoring pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EchoError {
    #[error("no transactions found for address '{address}'")]
    NotFound { address: String },

    #[error("data unavailable for '{address}': {detail}")]
    DataUnavailable { address: String, detail: String },

    #[error("normalization is undefined: first price is zero")]
    DivisionUndefined,

    #[error("cannot normalize an empty price series")]
    EmptySeries,

    #[error(
        "no reference asset has at least {required} observations ({offered} candidate(s) offered)"
    )]
    InsufficientReferenceData { required: usize, offered: usize },

    #[error("upstream fetch failed for '{address}': {source}")]
    UpstreamFetchFailure {
        address: String,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EchoError {
    pub fn upstream(address: impl Into<String>, source: SourceError) -> Self {
        Self::UpstreamFetchFailure {
            address: address.into(),
            source,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "echo.not_found",
            Self::DataUnavailable { .. } => "echo.data_unavailable",
            Self::DivisionUndefined => "echo.division_undefined",
            Self::EmptySeries => "echo.empty_series",
            Self::InsufficientReferenceData { .. } => "echo.insufficient_reference_data",
            Self::UpstreamFetchFailure { .. } => "echo.upstream_fetch_failure",
            Self::Validation(_) => "echo.validation",
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::UpstreamFetchFailure { source, .. } => source.retryable(),
            _ => false,
        }
    }
}
