//! Machine-readable response wrapper shared by every CLI command.

use serde::{Deserialize, Serialize};

use crate::{EchoError, ProviderId, UnixTime, ValidationError};

pub const SCHEMA_VERSION: &str = "v1.0.0";

const MIN_REQUEST_ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn new(
        meta: EnvelopeMeta,
        data: T,
        errors: Vec<EnvelopeError>,
    ) -> Result<Self, ValidationError> {
        meta.validate()?;
        if errors.iter().any(|error| error.code.trim().is_empty()) {
            return Err(ValidationError::EmptyErrorCode);
        }
        if errors.iter().any(|error| error.message.trim().is_empty()) {
            return Err(ValidationError::EmptyErrorMessage);
        }
        Ok(Self { meta, data, errors })
    }

    pub fn is_failure(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub schema_version: String,
    pub generated_at: UnixTime,
    /// Providers consulted, ledger first.
    pub sources: Vec<ProviderId>,
    pub latency_ms: u64,
    /// Basket exclusions and mode notices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(
        request_id: impl Into<String>,
        sources: Vec<ProviderId>,
        latency_ms: u64,
    ) -> Result<Self, ValidationError> {
        let meta = Self {
            request_id: request_id.into(),
            schema_version: SCHEMA_VERSION.to_owned(),
            generated_at: UnixTime::now(),
            sources,
            latency_ms,
            warnings: Vec::new(),
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_id.trim().len() < MIN_REQUEST_ID_LEN {
            return Err(ValidationError::InvalidRequestId);
        }
        if parse_schema_version(&self.schema_version).is_none() {
            return Err(ValidationError::InvalidSchemaVersion {
                value: self.schema_version.clone(),
            });
        }
        Ok(())
    }
}

/// A scoring or resolution failure as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    /// Asset the failure concerns, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<&EchoError> for EnvelopeError {
    fn from(error: &EchoError) -> Self {
        let address = match error {
            EchoError::NotFound { address }
            | EchoError::DataUnavailable { address, .. }
            | EchoError::UpstreamFetchFailure { address, .. } => Some(address.clone()),
            _ => None,
        };

        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            retryable: error.retryable(),
            address,
        }
    }
}

/// `vMAJOR.MINOR.PATCH`
fn parse_schema_version(value: &str) -> Option<[u32; 3]> {
    let mut parts = value.strip_prefix('v')?.split('.');
    let mut version = [0_u32; 3];
    for slot in &mut version {
        let part = parts.next()?;
        if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    parts.next().is_none().then_some(version)
}
