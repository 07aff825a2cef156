//! Collaborator contracts consumed by the scoring pipeline.
//!
//! Two upstream collaborators feed the core:
//!
//! | Trait | Operation | Response | Description |
//! |-------|-----------|----------|-------------|
//! | [`LedgerSource`] | [`SignatureQuery`] | `Vec<`[`SignatureRecord`]`>` | Backward signature pagination |
//! | [`LedgerSource`] | signature | `Option<`[`TransactionRecord`]`>` | Transaction detail lookup |
//! | [`PriceHistorySource`] | [`HistoryRequest`] | [`AssetSeries`] | Windowed price history |
//!
//! Both traits return boxed futures so implementations can be stored as
//! `Arc<dyn ...>` and shared across basket tasks.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{AssetAddress, AssetSeries, Granularity, ProviderId, UnixTime, ValidationError};

/// Largest page the ledger will serve for one signature listing.
pub const MAX_SIGNATURE_PAGE: usize = 1_000;

/// Boxed future returned by collaborator operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    InvalidRequest,
    InvalidResponse,
    Internal,
}

/// Structured error returned by collaborator adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_response(error.to_string())
    }
}

/// Request payload for one page of backward signature pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureQuery {
    pub address: AssetAddress,
    pub before: Option<String>,
    pub limit: usize,
}

impl SignatureQuery {
    pub fn new(
        address: AssetAddress,
        before: Option<String>,
        limit: usize,
    ) -> Result<Self, ValidationError> {
        if limit == 0 || limit > MAX_SIGNATURE_PAGE {
            return Err(ValidationError::InvalidPageLimit {
                value: limit,
                max: MAX_SIGNATURE_PAGE,
            });
        }
        if before.as_deref().is_some_and(|cursor| cursor.trim().is_empty()) {
            return Err(ValidationError::EmptySignature);
        }
        Ok(Self {
            address,
            before,
            limit,
        })
    }
}

/// Signature listing entry, newest first within a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
}

/// Detail record of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
}

/// Request payload for a windowed price history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub address: AssetAddress,
    pub granularity: Granularity,
    pub time_from: UnixTime,
    pub time_to: UnixTime,
}

impl HistoryRequest {
    pub fn new(
        address: AssetAddress,
        granularity: Granularity,
        time_from: UnixTime,
        time_to: UnixTime,
    ) -> Result<Self, ValidationError> {
        if time_from > time_to {
            return Err(ValidationError::InvalidWindow {
                from: time_from.as_secs(),
                to: time_to.as_secs(),
            });
        }
        Ok(Self {
            address,
            granularity,
            time_from,
            time_to,
        })
    }
}

/// On-chain transaction history collaborator.
///
/// Implementations must be idempotent and support cursor-based backward
/// pagination that ends in an empty page.
pub trait LedgerSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Lists signatures for an address, newest first, strictly older than
    /// `query.before` when a cursor is given.
    fn list_signatures<'a>(&'a self, query: SignatureQuery)
        -> SourceFuture<'a, Vec<SignatureRecord>>;

    /// Fetches a transaction detail record. `Ok(None)` means the ledger has no
    /// detail for this signature.
    fn transaction<'a>(&'a self, signature: &'a str) -> SourceFuture<'a, Option<TransactionRecord>>;
}

/// Market data collaborator serving price histories ordered ascending by time.
pub trait PriceHistorySource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches the price history of `req.address` inside `[time_from, time_to]`.
    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, AssetSeries>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> AssetAddress {
        AssetAddress::parse("7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr").expect("valid")
    }

    #[test]
    fn signature_query_rejects_oversized_page() {
        let err = SignatureQuery::new(address(), None, 1_001).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPageLimit { value: 1_001, .. }));
    }

    #[test]
    fn history_request_rejects_inverted_window() {
        let err = HistoryRequest::new(
            address(),
            Granularity::OneHour,
            UnixTime::from_secs(20),
            UnixTime::from_secs(10),
        )
        .expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidWindow { from: 20, to: 10 });
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::timeout("slow").code(), "source.timeout");
        assert!(!SourceError::invalid_request("bad").retryable());
        assert!(SourceError::rate_limited("429").retryable());
    }
}
