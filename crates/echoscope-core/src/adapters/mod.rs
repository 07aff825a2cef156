mod birdeye;
mod memory;
mod solana_rpc;

pub use birdeye::{BirdeyeAdapter, DEFAULT_BIRDEYE_URL};
pub use memory::{synthetic_sources, MemoryLedger, MemoryPriceHistory};
pub use solana_rpc::{SolanaRpcAdapter, DEFAULT_RPC_URL};

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest, HttpResponse};
use crate::retry::{execute_with_retry, RetryConfig};
use crate::ProviderId;

/// Sends `request` through the circuit breaker and the retry policy, mapping
/// transport failures and non-success statuses to `SourceError`.
pub(crate) async fn send_guarded(
    provider: ProviderId,
    http_client: &dyn HttpClient,
    circuit_breaker: &CircuitBreaker,
    retry: &RetryConfig,
    request: HttpRequest,
) -> Result<HttpResponse, SourceError> {
    circuit_breaker.check()?;

    let response = execute_with_retry(http_client, request, retry)
        .await
        .map_err(|error| {
            circuit_breaker.record_failure();
            let message = format!("{provider} transport error: {}", error.message());
            match error.kind() {
                HttpErrorKind::Timeout => SourceError::timeout(message),
                _ if error.retryable() => SourceError::unavailable(message),
                _ => SourceError::internal(message),
            }
        })?;

    match response.status {
        status if (200..300).contains(&status) => {
            circuit_breaker.record_success();
            Ok(response)
        }
        429 => {
            circuit_breaker.record_failure();
            Err(SourceError::rate_limited(format!(
                "{provider} rate limit exceeded (status 429)"
            )))
        }
        401 | 403 => {
            circuit_breaker.record_success();
            Err(SourceError::invalid_request(format!(
                "{provider} rejected credentials (status {})",
                response.status
            )))
        }
        status if (400..500).contains(&status) && status != 408 => {
            circuit_breaker.record_success();
            Err(SourceError::invalid_request(format!(
                "{provider} rejected request (status {status})"
            )))
        }
        status => {
            circuit_breaker.record_failure();
            Err(SourceError::unavailable(format!(
                "{provider} upstream returned status {status}"
            )))
        }
    }
}
