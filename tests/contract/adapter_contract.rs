//! Wire contracts for the Solana RPC and Birdeye adapters against a scripted
//! HTTP client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use echoscope_core::{
    AssetAddress, BirdeyeAdapter, BirthTimeResolver, CircuitBreaker, CircuitBreakerConfig,
    CircuitState, Granularity, HistoryRequest, HttpClient, HttpError, HttpFuture, HttpMethod,
    HttpRequest, HttpResponse, LedgerSource, PriceHistorySource, ProviderId, RequestThrottle,
    RetryConfig, SignatureQuery, SolanaRpcAdapter, SourceErrorKind, UnixTime,
};
use serde_json::Value;

use echoscope_tests::{address, POPCAT as TOKEN};

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
struct ScriptedHttpClient {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn replying(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|request| {
                serde_json::from_str(request.body.as_deref().expect("json body"))
                    .expect("valid json")
            })
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            self.requests.lock().expect("lock").push(request);
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| HttpError::rejected("script exhausted"))
        })
    }
}

fn token() -> AssetAddress {
    address(TOKEN)
}

fn rpc(http: Arc<ScriptedHttpClient>) -> SolanaRpcAdapter {
    SolanaRpcAdapter::new(http, "https://rpc.test").with_retry(RetryConfig::no_retry())
}

fn birdeye(http: Arc<ScriptedHttpClient>) -> BirdeyeAdapter {
    BirdeyeAdapter::new(http, "https://birdeye.test", Some("secret".to_owned()))
        .with_retry(RetryConfig::no_retry())
        .with_throttle(RequestThrottle::per_second(1_000))
}

fn history_request() -> HistoryRequest {
    HistoryRequest::new(
        token(),
        Granularity::FifteenMinutes,
        UnixTime::from_secs(1_700_000_000),
        UnixTime::from_secs(1_700_003_600),
    )
    .expect("valid window")
}

#[tokio::test]
async fn signature_listing_posts_jsonrpc_with_cursor_and_limit() {
    // Given: an RPC endpoint returning one page of signatures
    let http = ScriptedHttpClient::replying([HttpResponse::ok_json(
        r#"{"jsonrpc":"2.0","id":1,"result":[
            {"signature":"sig-b","slot":12,"blockTime":1700000100},
            {"signature":"sig-a","slot":11,"blockTime":null}
        ]}"#,
    )]);

    // When: a page before a cursor is requested
    let query = SignatureQuery::new(token(), Some("sig-c".to_owned()), 2).expect("valid query");
    let page = rpc(http.clone())
        .list_signatures(query)
        .await
        .expect("page");

    // Then: the body follows JSON-RPC 2.0 and the page keeps ledger order
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].signature, "sig-b");
    assert_eq!(page[1].block_time, None);

    let requests = http.requests();
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].url, "https://rpc.test");

    let body = &http.bodies()[0];
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["method"], "getSignaturesForAddress");
    assert_eq!(body["params"][0], TOKEN);
    assert_eq!(body["params"][1]["limit"], 2);
    assert_eq!(body["params"][1]["before"], "sig-c");
}

#[tokio::test]
async fn first_page_omits_the_cursor() {
    let http = ScriptedHttpClient::replying([HttpResponse::ok_json(r#"{"result":[]}"#)]);

    let query = SignatureQuery::new(token(), None, 1_000).expect("valid query");
    let page = rpc(http.clone()).list_signatures(query).await.expect("page");

    assert!(page.is_empty());
    assert!(http.bodies()[0]["params"][1].get("before").is_none());
}

#[tokio::test]
async fn rpc_rate_limit_error_is_classified_as_rate_limited() {
    let http = ScriptedHttpClient::replying([HttpResponse::ok_json(
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"slow down"}}"#,
    )]);

    let query = SignatureQuery::new(token(), None, 10).expect("valid query");
    let err = rpc(http).list_signatures(query).await.expect_err("must fail");

    assert_eq!(err.kind(), SourceErrorKind::RateLimited);
    assert!(err.message().contains("slow down"));
}

#[tokio::test]
async fn unknown_transaction_is_absent_rather_than_an_error() {
    let http = ScriptedHttpClient::replying([HttpResponse::ok_json(
        r#"{"jsonrpc":"2.0","id":1,"result":null}"#,
    )]);

    let detail = rpc(http.clone()).transaction("sig-x").await.expect("lookup");

    assert_eq!(detail, None);
    let body = &http.bodies()[0];
    assert_eq!(body["method"], "getTransaction");
    assert_eq!(body["params"][0], "sig-x");
    assert_eq!(body["params"][1]["maxSupportedTransactionVersion"], 0);
}

#[tokio::test]
async fn birth_resolution_walks_rpc_pages_to_the_oldest_signature() {
    // Given: two full pages, then an empty page, then the oldest transaction
    let http = ScriptedHttpClient::replying([
        HttpResponse::ok_json(
            r#"{"result":[{"signature":"s4","slot":4},{"signature":"s3","slot":3}]}"#,
        ),
        HttpResponse::ok_json(
            r#"{"result":[{"signature":"s2","slot":2},{"signature":"s1","slot":1}]}"#,
        ),
        HttpResponse::ok_json(r#"{"result":[]}"#),
        HttpResponse::ok_json(r#"{"result":{"slot":1,"blockTime":1690000000}}"#),
    ]);
    let resolver = BirthTimeResolver::new(Arc::new(rpc(http.clone())))
        .with_page_limit(2)
        .expect("valid limit");

    // When: the birth time is resolved
    let birth = resolver.resolve(&token()).await.expect("birth");

    // Then: the cursor advanced page by page and the last signature was inspected
    assert_eq!(birth.signature, "s1");
    assert_eq!(birth.time, UnixTime::from_secs(1_690_000_000));
    assert_eq!(birth.pages, 3);

    let bodies = http.bodies();
    assert_eq!(bodies.len(), 4);
    assert_eq!(bodies[1]["params"][1]["before"], "s3");
    assert_eq!(bodies[2]["params"][1]["before"], "s1");
    assert_eq!(bodies[3]["params"][0], "s1");
}

#[tokio::test]
async fn birdeye_status_codes_map_to_source_error_kinds() {
    let cases = [
        (401, SourceErrorKind::InvalidRequest),
        (404, SourceErrorKind::InvalidRequest),
        (429, SourceErrorKind::RateLimited),
        (503, SourceErrorKind::Unavailable),
    ];

    for (status, expected) in cases {
        let http = ScriptedHttpClient::replying([HttpResponse::with_status(status, "{}")]);
        let err = birdeye(http)
            .history(history_request())
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), expected, "status {status}");
    }
}

#[tokio::test]
async fn birdeye_unsuccessful_payload_is_unavailable() {
    let http = ScriptedHttpClient::replying([HttpResponse::ok_json(
        r#"{"success":false,"message":"bad token"}"#,
    )]);

    let err = birdeye(http)
        .history(history_request())
        .await
        .expect_err("must fail");

    assert_eq!(err.kind(), SourceErrorKind::Unavailable);
}

#[tokio::test]
async fn open_circuit_fails_fast_without_calling_upstream() {
    // Given: a breaker that opens after two consecutive failures
    let breaker = Arc::new(CircuitBreaker::new(
        ProviderId::Birdeye,
        CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
        },
    ));
    let http = ScriptedHttpClient::replying([
        HttpResponse::with_status(503, "down"),
        HttpResponse::with_status(503, "down"),
        HttpResponse::ok_json(r#"{"success":true,"data":{"items":[]}}"#),
    ]);
    let adapter = birdeye(http.clone()).with_circuit_breaker(Arc::clone(&breaker));

    // When: three calls are made
    for _ in 0..2 {
        adapter
            .history(history_request())
            .await
            .expect_err("upstream down");
    }
    let err = adapter
        .history(history_request())
        .await
        .expect_err("breaker open");

    // Then: the third call never reached the transport
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(err.kind(), SourceErrorKind::Unavailable);
    assert!(err.message().contains("circuit breaker is open"));
    assert_eq!(http.requests().len(), 2);
}
