//! Core engine for echoscope.
//!
//! This crate contains:
//! - Validated domain models and the error taxonomy
//! - Ledger and price-history collaborator traits with Solana RPC, Birdeye
//!   and in-memory implementations
//! - Birth-time resolution and the waveform scoring pipeline
//! - Layered configuration and the response envelope

pub mod adapters;
pub mod analysis;
pub mod birth;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod retry;
pub mod source;
pub mod throttling;

pub use adapters::{
    synthetic_sources, BirdeyeAdapter, MemoryLedger, MemoryPriceHistory, SolanaRpcAdapter,
};
pub use analysis::{
    analyze, AnalysisConfig, Classification, CollapseTrigger, Correlation, EchoAnalysis,
    NormalizedSeries, ReferenceCandidate, ReturnSeries, ScoreThresholds,
};
pub use birth::{BirthTime, BirthTimeResolver};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{BasketEntry, ConfigError, EchoConfig, FetchConfig};
pub use data_source::{
    HistoryRequest, LedgerSource, PriceHistorySource, SignatureQuery, SignatureRecord,
    SourceError, SourceErrorKind, TransactionRecord,
};
pub use domain::{AssetAddress, AssetSeries, Granularity, PricePoint, UnixTime};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{EchoError, ValidationError};
pub use http_client::{
    ApiKey, HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpMethod, HttpRequest,
    HttpResponse, ReqwestHttpClient,
};
pub use pipeline::{BasketExclusion, EchoPipeline, EchoReport};
pub use retry::{Backoff, RetryConfig};
pub use source::ProviderId;
pub use throttling::RequestThrottle;
