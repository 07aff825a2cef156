//! End-to-end scoring of one target against the configured basket.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analysis::{
    analyze, normalize, AnalysisConfig, Classification, CollapseTrigger, Correlation,
    NormalizedSeries, ReferenceCandidate,
};
use crate::birth::{BirthTime, BirthTimeResolver};
use crate::config::{BasketEntry, EchoConfig};
use crate::data_source::{HistoryRequest, LedgerSource, PriceHistorySource};
use crate::{AssetAddress, EchoError, Granularity, ProviderId, UnixTime, ValidationError};

/// A basket member left out of the reference waveform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasketExclusion {
    pub address: AssetAddress,
    pub label: String,
    pub reason: String,
}

impl BasketExclusion {
    fn new(entry: &BasketEntry, reason: impl Into<String>) -> Self {
        Self {
            address: entry.address.clone(),
            label: entry.label.clone(),
            reason: reason.into(),
        }
    }

    /// One-line description used for envelope warnings.
    pub fn describe(&self) -> String {
        format!("basket member {} ({}) excluded: {}", self.label, self.address, self.reason)
    }
}

/// Result of scoring one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoReport {
    pub target: AssetAddress,
    pub birth: BirthTime,
    pub granularity: Granularity,
    /// Observations compared (L).
    pub observations: usize,
    pub reference_members: Vec<BasketEntry>,
    pub exclusions: Vec<BasketExclusion>,
    pub correlation: Correlation,
    pub trigger: CollapseTrigger,
    pub memory_strength: f64,
    pub score: f64,
    pub classification: Classification,
    pub label: &'static str,
}

/// Scoring pipeline wired to a ledger and a price-history source.
#[derive(Clone)]
pub struct EchoPipeline {
    resolver: BirthTimeResolver,
    prices: Arc<dyn PriceHistorySource>,
    basket: Vec<BasketEntry>,
    granularity: Granularity,
    analysis: AnalysisConfig,
    member_timeout: Duration,
    max_concurrency: usize,
}

impl EchoPipeline {
    pub fn new(
        ledger: Arc<dyn LedgerSource>,
        prices: Arc<dyn PriceHistorySource>,
        config: &EchoConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let resolver = BirthTimeResolver::new(ledger)
            .with_page_limit(config.fetch.signature_page_limit)?
            .with_max_pages(config.fetch.max_signature_pages);

        Ok(Self {
            resolver,
            prices,
            basket: config.basket.clone(),
            granularity: config.granularity,
            analysis: config.analysis,
            member_timeout: config.fetch.member_timeout(),
            max_concurrency: config.fetch.max_concurrency,
        })
    }

    pub fn basket(&self) -> &[BasketEntry] {
        &self.basket
    }

    /// Ledger then price provider.
    pub fn providers(&self) -> Vec<ProviderId> {
        vec![self.resolver.provider(), self.prices.id()]
    }

    pub async fn resolve_birth(&self, address: &AssetAddress) -> Result<BirthTime, EchoError> {
        self.resolver.resolve(address).await
    }

    /// Scores `target` as of `now`.
    ///
    /// Failures on the target are returned; failures on a basket member only
    /// exclude that member.
    pub async fn run(&self, target: &AssetAddress, now: UnixTime) -> Result<EchoReport, EchoError> {
        let birth = self.resolver.resolve(target).await?;
        let target_series =
            fetch_normalized(self.prices.as_ref(), target, self.granularity, birth.time, now)
                .await?;
        let observations = target_series.len();
        let duration = now.seconds_since(birth.time);

        tracing::info!(
            address = %target,
            observations,
            duration_secs = duration,
            "target trajectory ready"
        );

        let (candidates, mut exclusions) = self.collect_members(duration).await;
        exclusions.extend(self.short_members(&candidates, observations));
        let analysis = analyze(&target_series, &candidates, &self.analysis)?;

        exclusions.sort_by(|left, right| left.address.cmp(&right.address));

        let reference_members = analysis
            .reference_members
            .iter()
            .filter_map(|address| self.entry(address).cloned())
            .collect();

        tracing::info!(
            address = %target,
            score = analysis.score,
            classification = analysis.classification.label(),
            "echo score computed"
        );

        Ok(EchoReport {
            target: target.clone(),
            birth,
            granularity: self.granularity,
            observations,
            reference_members,
            exclusions,
            correlation: analysis.correlation,
            trigger: analysis.trigger,
            memory_strength: analysis.memory_strength,
            score: analysis.score,
            classification: analysis.classification,
            label: analysis.classification.label(),
        })
    }

    /// Exclusions for candidates with fewer than `required` observations,
    /// logged before aggregation so they are reported even when no member
    /// survives.
    fn short_members(
        &self,
        candidates: &[ReferenceCandidate],
        required: usize,
    ) -> Vec<BasketExclusion> {
        candidates
            .iter()
            .filter(|candidate| candidate.series.len() < required)
            .filter_map(|candidate| {
                let entry = self.entry(&candidate.address)?;
                let exclusion = BasketExclusion::new(
                    entry,
                    format!(
                        "insufficient history: {} of {required} observations",
                        candidate.series.len()
                    ),
                );
                tracing::warn!(address = %exclusion.address, reason = %exclusion.reason, "basket member excluded");
                Some(exclusion)
            })
            .collect()
    }

    fn entry(&self, address: &AssetAddress) -> Option<&BasketEntry> {
        self.basket.iter().find(|entry| &entry.address == address)
    }

    /// Resolves every basket member concurrently, bounded by `max_concurrency`.
    async fn collect_members(
        &self,
        duration: i64,
    ) -> (Vec<ReferenceCandidate>, Vec<BasketExclusion>) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for entry in self.basket.iter().cloned() {
            let semaphore = Arc::clone(&semaphore);
            let resolver = self.resolver.clone();
            let prices = Arc::clone(&self.prices);
            let granularity = self.granularity;
            let member_timeout = self.member_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(BasketExclusion::new(&entry, "scheduler closed"));
                };

                let fetch = fetch_member(&resolver, prices.as_ref(), &entry.address, granularity, duration);
                match tokio::time::timeout(member_timeout, fetch).await {
                    Ok(Ok(series)) => Ok(ReferenceCandidate::new(entry.address.clone(), series)
                        .with_label(entry.label.clone())),
                    Ok(Err(error)) => Err(BasketExclusion::new(&entry, error.to_string())),
                    Err(_) => Err(BasketExclusion::new(
                        &entry,
                        format!("timed out after {} ms", member_timeout.as_millis()),
                    )),
                }
            });
        }

        let mut candidates = Vec::new();
        let mut exclusions = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(candidate)) => {
                    tracing::debug!(address = %candidate.address, observations = candidate.series.len(), "basket member ready");
                    candidates.push(candidate);
                }
                Ok(Err(exclusion)) => {
                    tracing::warn!(address = %exclusion.address, reason = %exclusion.reason, "basket member excluded");
                    exclusions.push(exclusion);
                }
                Err(error) => tracing::warn!(%error, "basket member task failed"),
            }
        }

        let settled: BTreeSet<&AssetAddress> = candidates
            .iter()
            .map(|candidate| &candidate.address)
            .chain(exclusions.iter().map(|exclusion| &exclusion.address))
            .collect();
        let lost: Vec<BasketExclusion> = self
            .basket
            .iter()
            .filter(|entry| !settled.contains(&entry.address))
            .map(|entry| BasketExclusion::new(entry, "task failed"))
            .collect();
        exclusions.extend(lost);

        (candidates, exclusions)
    }
}

async fn fetch_member(
    resolver: &BirthTimeResolver,
    prices: &dyn PriceHistorySource,
    address: &AssetAddress,
    granularity: Granularity,
    duration: i64,
) -> Result<NormalizedSeries, EchoError> {
    let birth = resolver.resolve(address).await?;
    let until = birth.time.saturating_add_secs(duration);
    fetch_normalized(prices, address, granularity, birth.time, until).await
}

async fn fetch_normalized(
    prices: &dyn PriceHistorySource,
    address: &AssetAddress,
    granularity: Granularity,
    from: UnixTime,
    to: UnixTime,
) -> Result<NormalizedSeries, EchoError> {
    let request = HistoryRequest::new(address.clone(), granularity, from, to)?;
    let series = prices
        .history(request)
        .await
        .map_err(|source| EchoError::upstream(address.as_str(), source))?;

    tracing::debug!(
        address = %address,
        points = series.len(),
        provider = %prices.id(),
        "fetched price history"
    );

    if series.is_empty() {
        return Err(EchoError::DataUnavailable {
            address: address.to_string(),
            detail: format!("no price history between {from} and {to}"),
        });
    }
    normalize(&series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryLedger, MemoryPriceHistory};
    use crate::data_source::SourceError;

    const TARGET: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr";
    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const WIF: &str = "EKpQGSJtjMFqQ9caxuEyvokY8m84TxCGKmbu9M2mVLqL";

    fn address(raw: &str) -> AssetAddress {
        AssetAddress::parse(raw).expect("valid")
    }

    fn config(members: &[(&str, &str)]) -> EchoConfig {
        EchoConfig {
            basket: members
                .iter()
                .map(|(label, raw)| BasketEntry::new(*label, address(raw)))
                .collect(),
            ..EchoConfig::default()
        }
    }

    #[tokio::test]
    async fn failing_member_is_excluded_not_fatal() {
        let hour = 3_600;
        let ledger = MemoryLedger::new()
            .with_activity(&address(TARGET), &[10 * hour])
            .with_activity(&address(BONK), &[0])
            .with_failure(&address(WIF), SourceError::unavailable("rpc down"));
        let prices = MemoryPriceHistory::new()
            .with_prices(&address(TARGET), 10 * hour, hour, &[1.0, 1.2, 1.1, 1.3])
            .with_prices(&address(BONK), 0, hour, &[2.0, 2.3, 2.1, 2.4]);

        let pipeline = EchoPipeline::new(
            Arc::new(ledger),
            Arc::new(prices),
            &config(&[("BONK", BONK), ("WIF", WIF)]),
        )
        .expect("valid config");

        let report = pipeline
            .run(&address(TARGET), UnixTime::from_secs(13 * hour))
            .await
            .expect("report");

        assert_eq!(report.observations, 4);
        assert_eq!(report.reference_members.len(), 1);
        assert_eq!(report.reference_members[0].label, "BONK");
        assert_eq!(report.exclusions.len(), 1);
        assert_eq!(report.exclusions[0].label, "WIF");
        assert_eq!(report.label, report.classification.label());
    }

    #[tokio::test]
    async fn target_without_history_is_fatal() {
        let ledger = MemoryLedger::new().with_activity(&address(TARGET), &[100]);
        let pipeline = EchoPipeline::new(
            Arc::new(ledger),
            Arc::new(MemoryPriceHistory::new()),
            &config(&[("BONK", BONK)]),
        )
        .expect("valid config");

        let err = pipeline
            .run(&address(TARGET), UnixTime::from_secs(200))
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "echo.data_unavailable");
    }

    #[tokio::test]
    async fn members_all_too_short_are_reported_before_the_failure() {
        let hour = 3_600;
        let ledger = MemoryLedger::new()
            .with_activity(&address(TARGET), &[10 * hour])
            .with_activity(&address(BONK), &[0])
            .with_activity(&address(WIF), &[0]);
        let prices = MemoryPriceHistory::new()
            .with_prices(&address(TARGET), 10 * hour, hour, &[1.0, 1.2, 1.1, 1.3])
            .with_prices(&address(BONK), 0, hour, &[2.0, 2.3])
            .with_prices(&address(WIF), 0, hour, &[0.5]);
        let pipeline = EchoPipeline::new(
            Arc::new(ledger),
            Arc::new(prices),
            &config(&[("BONK", BONK), ("WIF", WIF)]),
        )
        .expect("valid config");

        let (candidates, _) = pipeline.collect_members(3 * hour).await;
        let mut short = pipeline.short_members(&candidates, 4);
        short.sort_by(|left, right| left.label.cmp(&right.label));

        assert_eq!(short.len(), 2);
        assert_eq!(short[0].label, "BONK");
        assert_eq!(short[0].reason, "insufficient history: 2 of 4 observations");
        assert_eq!(short[1].reason, "insufficient history: 1 of 4 observations");

        let err = pipeline
            .run(&address(TARGET), UnixTime::from_secs(13 * hour))
            .await
            .expect_err("no member long enough");

        assert_eq!(err.code(), "echo.insufficient_reference_data");
    }
}
