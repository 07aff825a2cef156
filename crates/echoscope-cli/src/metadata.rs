use std::time::Instant;

use echoscope_core::{EnvelopeMeta, ProviderId, ValidationError};
use uuid::Uuid;

/// Meta block for one invocation: a fresh v4 request id and the elapsed
/// wall time since `started`.
pub fn stamp(sources: Vec<ProviderId>, started: Instant) -> Result<EnvelopeMeta, ValidationError> {
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    EnvelopeMeta::new(Uuid::new_v4().hyphenated().to_string(), sources, latency_ms)
}
