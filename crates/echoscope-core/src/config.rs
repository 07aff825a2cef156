//! Layered runtime configuration: defaults, then an optional JSON file, then
//! environment variables. Command-line overrides are applied by the caller.

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::{DEFAULT_BIRDEYE_URL, DEFAULT_RPC_URL};
use crate::analysis::AnalysisConfig;
use crate::birth::DEFAULT_MAX_SIGNATURE_PAGES;
use crate::data_source::MAX_SIGNATURE_PAGE;
use crate::retry::RetryConfig;
use crate::{AssetAddress, Granularity, ValidationError};

pub const ENV_RPC_URL: &str = "ECHOSCOPE_RPC_URL";
pub const ENV_BIRDEYE_URL: &str = "ECHOSCOPE_BIRDEYE_URL";
pub const ENV_BIRDEYE_API_KEY: &str = "ECHOSCOPE_BIRDEYE_API_KEY";
pub const ENV_BIRDEYE_API_KEY_FALLBACK: &str = "BIRDEYE_API_KEY";

const DEFAULT_BASKET: [(&str, &str); 6] = [
    ("BONK", "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"),
    ("WIF", "EKpQGSJtjMFqQ9caxuEyvokY8m84TxCGKmbu9M2mVLqL"),
    ("POPCAT", "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr"),
    ("MEW", "A8C3xuqvcDx1KuCPsQ7zQ1fZzqUHMCY3r3ofTF4LhStZ"),
    ("BOME", "ukHH6c7mMyiWCf1b9pqqVoBiCwSG5fqqDuKsCmfgrMc6"),
    ("PNUT", "FNkm2sCa5Q7F8cHktur8k1YwvzvwP3V8JLJLfEhbEqG4"),
];

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One historical reference asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketEntry {
    pub label: String,
    pub address: AssetAddress,
}

impl BasketEntry {
    pub fn new(label: impl Into<String>, address: AssetAddress) -> Self {
        Self {
            label: label.into(),
            address,
        }
    }

    /// Entry labelled with the leading characters of its address.
    pub fn unlabeled(address: AssetAddress) -> Self {
        let label = address.as_str().chars().take(6).collect::<String>();
        Self { label, address }
    }
}

/// Network and pagination limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per collaborator call.
    pub timeout_ms: u64,
    /// Whole resolution of one basket member: birth, history and normalization.
    pub member_timeout_ms: u64,
    pub signature_page_limit: usize,
    pub max_signature_pages: usize,
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            member_timeout_ms: 60_000,
            signature_page_limit: MAX_SIGNATURE_PAGE,
            max_signature_pages: DEFAULT_MAX_SIGNATURE_PAGES,
            max_concurrency: 4,
            max_retries: 3,
            retry_base_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn retry_config(&self) -> RetryConfig {
        if self.max_retries == 0 {
            RetryConfig::no_retry()
        } else {
            RetryConfig::exponential(Duration::from_millis(self.retry_base_ms), self.max_retries)
        }
    }

    pub fn member_timeout(&self) -> Duration {
        Duration::from_millis(self.member_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(invalid("fetch.timeout_ms", "must be greater than zero"));
        }
        if self.member_timeout_ms == 0 {
            return Err(invalid("fetch.member_timeout_ms", "must be greater than zero"));
        }
        if self.signature_page_limit == 0 || self.signature_page_limit > MAX_SIGNATURE_PAGE {
            return Err(ValidationError::InvalidPageLimit {
                value: self.signature_page_limit,
                max: MAX_SIGNATURE_PAGE,
            });
        }
        if self.max_signature_pages == 0 {
            return Err(invalid("fetch.max_signature_pages", "must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(invalid("fetch.max_concurrency", "must be at least 1"));
        }
        Ok(())
    }
}

/// Everything an invocation needs, passed explicitly into the pipeline.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    pub rpc_url: String,
    pub birdeye_base_url: String,
    #[serde(skip_serializing)]
    pub birdeye_api_key: Option<String>,
    pub granularity: Granularity,
    pub birdeye_requests_per_second: u32,
    pub basket: Vec<BasketEntry>,
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::from(DEFAULT_RPC_URL),
            birdeye_base_url: String::from(DEFAULT_BIRDEYE_URL),
            birdeye_api_key: None,
            granularity: Granularity::default(),
            birdeye_requests_per_second: 1,
            basket: default_basket(),
            analysis: AnalysisConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Debug for EchoConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoConfig")
            .field("rpc_url", &self.rpc_url)
            .field("birdeye_base_url", &self.birdeye_base_url)
            .field(
                "birdeye_api_key",
                &self.birdeye_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("granularity", &self.granularity)
            .field("birdeye_requests_per_second", &self.birdeye_requests_per_second)
            .field("basket", &self.basket)
            .field("analysis", &self.analysis)
            .field("fetch", &self.fetch)
            .finish()
    }
}

impl EchoConfig {
    /// Reads a JSON file; absent fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Defaults, then `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env())
    }

    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Applies environment overrides read through `lookup`. Blank values are
    /// ignored.
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = read(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(url) = read(ENV_BIRDEYE_URL) {
            self.birdeye_base_url = url;
        }
        if let Some(key) = read(ENV_BIRDEYE_API_KEY).or_else(|| read(ENV_BIRDEYE_API_KEY_FALLBACK))
        {
            self.birdeye_api_key = Some(key);
        }
        self
    }

    pub fn basket_addresses(&self) -> Vec<AssetAddress> {
        self.basket.iter().map(|entry| entry.address.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rpc_url.trim().is_empty() {
            return Err(invalid("rpc_url", "cannot be empty"));
        }
        if self.birdeye_base_url.trim().is_empty() {
            return Err(invalid("birdeye_base_url", "cannot be empty"));
        }
        if self.birdeye_requests_per_second == 0 {
            return Err(invalid("birdeye_requests_per_second", "must be at least 1"));
        }
        if self.basket.is_empty() {
            return Err(ValidationError::EmptyBasket);
        }

        let mut seen = BTreeSet::new();
        for entry in &self.basket {
            if !seen.insert(entry.address.as_str()) {
                return Err(ValidationError::InvalidConfig {
                    field: "basket",
                    reason: format!("duplicate address {}", entry.address),
                });
            }
        }

        self.analysis.validate()?;
        self.fetch.validate()
    }
}

pub fn default_basket() -> Vec<BasketEntry> {
    DEFAULT_BASKET
        .iter()
        .filter_map(|(label, address)| {
            AssetAddress::parse(address)
                .ok()
                .map(|address| BasketEntry::new(*label, address))
        })
        .collect()
}

fn invalid(field: &'static str, reason: &str) -> ValidationError {
    ValidationError::InvalidConfig {
        field,
        reason: reason.to_owned(),
    }
}
