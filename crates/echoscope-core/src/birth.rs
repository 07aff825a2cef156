//! Earliest on-chain activity lookup.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;

use crate::data_source::{LedgerSource, SignatureQuery, SignatureRecord, MAX_SIGNATURE_PAGE};
use crate::{AssetAddress, EchoError, ProviderId, UnixTime, ValidationError};

/// Upper bound on pages walked for one address before giving up on reaching
/// the end of its history.
pub const DEFAULT_MAX_SIGNATURE_PAGES: usize = 100_000;

/// The resolved birth of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BirthTime {
    pub address: AssetAddress,
    /// Block time of the oldest transaction.
    pub time: UnixTime,
    /// Signature of the oldest transaction.
    pub signature: String,
    /// Signature pages requested, including the terminating one.
    pub pages: usize,
}

impl Display for BirthTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} born {}", self.address, self.time)
    }
}

/// Walks signature history backward to the oldest transaction.
#[derive(Clone)]
pub struct BirthTimeResolver {
    ledger: Arc<dyn LedgerSource>,
    page_limit: usize,
    max_pages: usize,
}

impl BirthTimeResolver {
    pub fn new(ledger: Arc<dyn LedgerSource>) -> Self {
        Self {
            ledger,
            page_limit: MAX_SIGNATURE_PAGE,
            max_pages: DEFAULT_MAX_SIGNATURE_PAGES,
        }
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Result<Self, ValidationError> {
        if page_limit == 0 || page_limit > MAX_SIGNATURE_PAGE {
            return Err(ValidationError::InvalidPageLimit {
                value: page_limit,
                max: MAX_SIGNATURE_PAGE,
            });
        }
        self.page_limit = page_limit;
        Ok(self)
    }

    pub fn provider(&self) -> ProviderId {
        self.ledger.id()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Pages until the ledger is exhausted, then reads the oldest transaction's
    /// block time.
    ///
    /// Paging also stops on a page identical to the previous one, on a page
    /// that ends at the current cursor, and after `max_pages` pages.
    pub async fn resolve(&self, address: &AssetAddress) -> Result<BirthTime, EchoError> {
        let mut cursor: Option<String> = None;
        let mut previous: Option<Vec<SignatureRecord>> = None;
        let mut pages = 0_usize;

        loop {
            if pages >= self.max_pages {
                tracing::warn!(
                    address = %address,
                    pages,
                    "signature page cap reached; using oldest signature seen"
                );
                break;
            }

            let query = SignatureQuery::new(address.clone(), cursor.clone(), self.page_limit)?;
            let page = self
                .ledger
                .list_signatures(query)
                .await
                .map_err(|source| EchoError::upstream(address.as_str(), source))?;
            pages += 1;

            tracing::debug!(
                address = %address,
                page = pages,
                signatures = page.len(),
                provider = %self.ledger.id(),
                "fetched signature page"
            );

            let Some(last) = page.last() else {
                break;
            };
            if previous.as_ref() == Some(&page) {
                tracing::debug!(address = %address, "ledger repeated a page; treating as exhausted");
                break;
            }
            if cursor.as_deref() == Some(last.signature.as_str()) {
                break;
            }

            cursor = Some(last.signature.clone());
            previous = Some(page);
        }

        let signature = cursor.ok_or_else(|| EchoError::NotFound {
            address: address.to_string(),
        })?;

        let detail = self
            .ledger
            .transaction(&signature)
            .await
            .map_err(|source| EchoError::upstream(address.as_str(), source))?
            .ok_or_else(|| EchoError::DataUnavailable {
                address: address.to_string(),
                detail: format!("no detail record for transaction {signature}"),
            })?;

        let block_time = detail.block_time.ok_or_else(|| EchoError::DataUnavailable {
            address: address.to_string(),
            detail: format!("transaction {signature} has no block time"),
        })?;

        let birth = BirthTime {
            address: address.clone(),
            time: UnixTime::from_secs(block_time),
            signature,
            pages,
        };
        tracing::info!(address = %address, birth = %birth.time, pages, "resolved birth time");
        Ok(birth)
    }
}
