use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::adapters::send_guarded;
use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{
    LedgerSource, SignatureQuery, SignatureRecord, SourceError, SourceFuture, TransactionRecord,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::ProviderId;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

const RATE_LIMITED_CODES: [i64; 2] = [-32005, 429];

/// Ledger source speaking Solana JSON-RPC 2.0 over HTTP POST.
#[derive(Clone)]
pub struct SolanaRpcAdapter {
    http_client: Arc<dyn HttpClient>,
    rpc_url: String,
    timeout_ms: u64,
    retry: RetryConfig,
    circuit_breaker: Arc<CircuitBreaker>,
    next_id: Arc<AtomicU64>,
}

impl SolanaRpcAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, rpc_url: impl Into<String>) -> Self {
        Self {
            http_client,
            rpc_url: rpc_url.into(),
            timeout_ms: 15_000,
            retry: RetryConfig::default(),
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::SolanaRpc)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<P, T>(&self, method: &'static str, params: P) -> Result<Option<T>, SourceError>
    where
        P: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let request = HttpRequest::post_json(&self.rpc_url, &body)
            .map_err(|error| SourceError::internal(error.message().to_owned()))?
            .with_timeout_ms(self.timeout_ms);

        tracing::debug!(method, url = %self.rpc_url, "solana rpc call");
        let response = send_guarded(
            ProviderId::SolanaRpc,
            self.http_client.as_ref(),
            &self.circuit_breaker,
            &self.retry,
            request,
        )
        .await?;

        let envelope: RpcResponse<T> = serde_json::from_str(&response.body).map_err(|error| {
            SourceError::invalid_response(format!("failed to parse {method} response: {error}"))
        })?;

        if let Some(error) = envelope.error {
            return Err(map_rpc_error(method, &error));
        }

        Ok(envelope.result)
    }
}

impl LedgerSource for SolanaRpcAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::SolanaRpc
    }

    fn list_signatures<'a>(
        &'a self,
        query: SignatureQuery,
    ) -> SourceFuture<'a, Vec<SignatureRecord>> {
        Box::pin(async move {
            let options = SignaturesOptions {
                limit: query.limit,
                before: query.before.as_deref(),
            };
            let page: Option<Vec<RpcSignature>> = self
                .call("getSignaturesForAddress", (query.address.as_str(), options))
                .await?;
            let page = page.ok_or_else(|| {
                SourceError::invalid_response("getSignaturesForAddress returned a null result")
            })?;

            Ok(page
                .into_iter()
                .map(|item| SignatureRecord {
                    signature: item.signature,
                    slot: item.slot,
                    block_time: item.block_time,
                })
                .collect())
        })
    }

    fn transaction<'a>(
        &'a self,
        signature: &'a str,
    ) -> SourceFuture<'a, Option<TransactionRecord>> {
        Box::pin(async move {
            let options = TransactionOptions {
                encoding: "json",
                max_supported_transaction_version: 0,
            };
            let detail: Option<RpcTransaction> =
                self.call("getTransaction", (signature, options)).await?;

            Ok(detail.map(|detail| TransactionRecord {
                signature: signature.to_owned(),
                slot: detail.slot,
                block_time: detail.block_time,
            }))
        })
    }
}

fn map_rpc_error(method: &str, error: &RpcErrorObject) -> SourceError {
    let message = format!(
        "{method} failed with rpc error {}: {}",
        error.code, error.message
    );
    if RATE_LIMITED_CODES.contains(&error.code) {
        SourceError::rate_limited(message)
    } else {
        SourceError::unavailable(message)
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Serialize)]
struct SignaturesOptions<'a> {
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    before: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionOptions {
    encoding: &'static str,
    max_supported_transaction_version: u8,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcSignature {
    signature: String,
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
}
