use std::sync::Arc;

use serde::Deserialize;

use crate::adapters::send_guarded;
use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{HistoryRequest, PriceHistorySource, SourceError, SourceFuture};
use crate::http_client::{ApiKey, HttpClient, HttpRequest};
use crate::retry::RetryConfig;
use crate::throttling::RequestThrottle;
use crate::{AssetSeries, PricePoint, ProviderId};

pub const DEFAULT_BIRDEYE_URL: &str = "https://public-api.birdeye.so";

/// Price-history source backed by the Birdeye `history_price` endpoint.
#[derive(Clone)]
pub struct BirdeyeAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: Option<ApiKey>,
    timeout_ms: u64,
    retry: RetryConfig,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: RequestThrottle,
}

impl BirdeyeAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.and_then(ApiKey::new),
            timeout_ms: 15_000,
            retry: RetryConfig::default(),
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::Birdeye)),
            throttle: RequestThrottle::per_second(1),
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

    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    fn endpoint(&self, req: &HistoryRequest) -> String {
        format!(
            "{}/defi/history_price?address={}&address_type=token&type={}&time_from={}&time_to={}",
            self.base_url,
            urlencoding::encode(req.address.as_str()),
            req.granularity.as_str(),
            req.time_from.as_secs(),
            req.time_to.as_secs()
        )
    }
}

impl PriceHistorySource for BirdeyeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Birdeye
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, AssetSeries> {
        Box::pin(async move {
            let api_key = self.api_key.as_ref().ok_or_else(|| {
                SourceError::invalid_request("birdeye requires an API key; none is configured")
            })?;

            let request = HttpRequest::get(self.endpoint(&req))
                .with_api_key("X-API-KEY", api_key)
                .with_header("x-chain", "solana")
                .with_header("accept", "application/json")
                .with_timeout_ms(self.timeout_ms);

            self.throttle.acquire().await;
            tracing::debug!(
                address = %req.address,
                granularity = req.granularity.as_str(),
                from = req.time_from.as_secs(),
                to = req.time_to.as_secs(),
                "fetching birdeye price history"
            );

            let response = send_guarded(
                ProviderId::Birdeye,
                self.http_client.as_ref(),
                &self.circuit_breaker,
                &self.retry,
                request,
            )
            .await?;

            let payload: BirdeyeHistoryResponse =
                serde_json::from_str(&response.body).map_err(|error| {
                    SourceError::invalid_response(format!(
                        "failed to parse birdeye history: {error}"
                    ))
                })?;

            if !payload.success {
                return Err(SourceError::unavailable(format!(
                    "birdeye reported failure: {}",
                    payload.message.as_deref().unwrap_or("no message")
                )));
            }

            let items = payload.data.map(|data| data.items).unwrap_or_default();
            let points = collapse_items(items)?;
            Ok(AssetSeries::new(req.address.clone(), points)?)
        })
    }
}

/// Sorts by time and keeps the last item seen for each timestamp.
fn collapse_items(mut items: Vec<BirdeyeItem>) -> Result<Vec<PricePoint>, SourceError> {
    items.sort_by_key(|item| item.unix_time);

    let mut points: Vec<PricePoint> = Vec::with_capacity(items.len());
    for item in items {
        let point = PricePoint::new(item.unix_time, item.value)?;
        match points.last_mut() {
            Some(last) if last.unix_time == point.unix_time => *last = point,
            _ => points.push(point),
        }
    }
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct BirdeyeHistoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<BirdeyeHistoryData>,
}

#[derive(Debug, Deserialize)]
struct BirdeyeHistoryData {
    #[serde(default)]
    items: Vec<BirdeyeItem>,
}

#[derive(Debug, Deserialize)]
struct BirdeyeItem {
    #[serde(rename = "unixTime")]
    unix_time: i64,
    value: f64,
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::{AssetAddress, Granularity, UnixTime};

    struct RecordingHttpClient {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                self.requests.lock().expect("lock").push(request);
                Ok(self.response.clone())
            })
        }
    }

    fn client(response: HttpResponse) -> Arc<RecordingHttpClient> {
        Arc::new(RecordingHttpClient {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request() -> HistoryRequest {
        HistoryRequest::new(
            AssetAddress::parse("7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr").expect("valid"),
            Granularity::OneHour,
            UnixTime::from_secs(1_700_000_000),
            UnixTime::from_secs(1_700_010_800),
        )
        .expect("valid window")
    }

    fn adapter(client: Arc<RecordingHttpClient>, key: Option<&str>) -> BirdeyeAdapter {
        BirdeyeAdapter::new(client, "https://birdeye.test/", key.map(String::from))
            .with_retry(RetryConfig::no_retry())
            .with_throttle(RequestThrottle::per_second(1_000))
    }

    #[tokio::test]
    async fn builds_history_request_and_sorts_items() {
        let http = client(HttpResponse::ok_json(
            r#"{"success":true,"data":{"items":[
                {"unixTime":1700003600,"value":2.0,"address":"x"},
                {"unixTime":1700000000,"value":1.0},
                {"unixTime":1700003600,"value":2.5}
            ]}}"#,
        ));

        let series = adapter(http.clone(), Some("secret"))
            .history(request())
            .await
            .expect("history");

        assert_eq!(series.len(), 2);
        assert_eq!(series.prices().collect::<Vec<_>>(), vec![1.0, 2.5]);

        let requests = http.requests.lock().expect("lock");
        let sent = &requests[0];
        assert_eq!(
            sent.url,
            "https://birdeye.test/defi/history_price?address=7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr&address_type=token&type=1H&time_from=1700000000&time_to=1700010800"
        );
        assert_eq!(sent.headers.get("x-api-key").map(String::as_str), Some("secret"));
        assert_eq!(sent.headers.get("x-chain").map(String::as_str), Some("solana"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let http = client(HttpResponse::ok_json("{}"));

        let err = adapter(http.clone(), None)
            .history(request())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "source.invalid_request");
        assert!(http.requests.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn unsuccessful_payload_is_unavailable() {
        let http = client(HttpResponse::ok_json(
            r#"{"success":false,"message":"Not found"}"#,
        ));

        let err = adapter(http, Some("secret"))
            .history(request())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "source.unavailable");
    }

    #[tokio::test]
    async fn forbidden_status_is_not_retryable() {
        let http = client(HttpResponse::with_status(403, "{}"));

        let err = adapter(http, Some("bad"))
            .history(request())
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "source.invalid_request");
        assert!(!err.retryable());
    }
}
