mod basket;
mod birth;
mod score;

use std::sync::Arc;
use std::time::Instant;

use echoscope_core::{
    synthetic_sources, AssetAddress, BirdeyeAdapter, EchoConfig, EchoPipeline, Envelope,
    EnvelopeError, LedgerSource, PriceHistorySource, ProviderId, ReqwestHttpClient,
    RequestThrottle, SolanaRpcAdapter, UnixTime,
};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub sources: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, sources: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            sources,
        }
    }

    pub fn failed(error: EnvelopeError, sources: Vec<ProviderId>) -> Self {
        Self {
            data: Value::Null,
            warnings: Vec::new(),
            errors: vec![error],
            sources,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let config = load_config(cli)?;

    let command_result = match &cli.command {
        Command::Score(args) => score::run(args, config, cli.offline).await?,
        Command::Birth(args) => birth::run(args, config, cli.offline).await?,
        Command::Basket => basket::run(&config)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        sources,
    } = command_result;

    let mut meta = metadata::stamp(sources, started)?;
    if cli.offline {
        meta.push_warning("offline mode: results are computed from synthetic data");
    }
    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope::new(meta, data, errors).map_err(CliError::from)
}

/// Defaults, config file and environment, then global flags.
fn load_config(cli: &Cli) -> Result<EchoConfig, CliError> {
    let mut config = EchoConfig::load(cli.config.as_deref())?;
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.fetch.timeout_ms = timeout_ms;
    }
    Ok(config)
}

/// Builds the pipeline over live adapters, or over synthetic in-memory
/// sources seeded for `target` and the basket when `offline` is set.
fn build_pipeline(
    config: &EchoConfig,
    target: &AssetAddress,
    offline: bool,
) -> Result<EchoPipeline, CliError> {
    let (ledger, prices): (Arc<dyn LedgerSource>, Arc<dyn PriceHistorySource>) = if offline {
        let (ledger, prices) = synthetic_sources(
            target,
            &config.basket_addresses(),
            config.granularity,
            UnixTime::now(),
        );
        (Arc::new(ledger), Arc::new(prices))
    } else {
        let http_client = Arc::new(ReqwestHttpClient::new());
        let retry = config.fetch.retry_config();
        let ledger = SolanaRpcAdapter::new(http_client.clone(), config.rpc_url.clone())
            .with_timeout_ms(config.fetch.timeout_ms)
            .with_retry(retry.clone());
        let prices = BirdeyeAdapter::new(
            http_client,
            config.birdeye_base_url.clone(),
            config.birdeye_api_key.clone(),
        )
        .with_timeout_ms(config.fetch.timeout_ms)
        .with_retry(retry)
        .with_throttle(RequestThrottle::per_second(config.birdeye_requests_per_second));
        (Arc::new(ledger), Arc::new(prices))
    };

    Ok(EchoPipeline::new(ledger, prices, config)?)
}
