use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::data_source::{
    HistoryRequest, LedgerSource, PriceHistorySource, SignatureQuery, SignatureRecord,
    SourceError, SourceFuture, TransactionRecord,
};
use crate::{AssetAddress, AssetSeries, Granularity, PricePoint, ProviderId, UnixTime};

/// Deterministic in-memory ledger with real cursor pagination.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    /// Newest first, per address.
    signatures: HashMap<AssetAddress, Vec<SignatureRecord>>,
    transactions: HashMap<String, TransactionRecord>,
    failures: HashMap<AssetAddress, SourceError>,
    page_requests: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one transaction per block time, with detail records, under
    /// signatures derived from the address.
    pub fn with_activity(mut self, address: &AssetAddress, block_times: &[i64]) -> Self {
        let mut sorted = block_times.to_vec();
        sorted.sort_unstable_by(|left, right| right.cmp(left));

        let records: Vec<SignatureRecord> = sorted
            .iter()
            .enumerate()
            .map(|(index, block_time)| SignatureRecord {
                signature: format!("{}-{:06}", address.as_str(), sorted.len() - index),
                slot: u64::try_from(*block_time).unwrap_or_default(),
                block_time: Some(*block_time),
            })
            .collect();

        for record in &records {
            self.transactions.insert(
                record.signature.clone(),
                TransactionRecord {
                    signature: record.signature.clone(),
                    slot: record.slot,
                    block_time: record.block_time,
                },
            );
        }
        self.signatures.insert(address.clone(), records);
        self
    }

    /// Registers raw signature records (newest first) without detail records.
    pub fn with_signatures(mut self, address: &AssetAddress, records: Vec<SignatureRecord>) -> Self {
        self.signatures.insert(address.clone(), records);
        self
    }

    pub fn with_transaction(mut self, record: TransactionRecord) -> Self {
        self.transactions.insert(record.signature.clone(), record);
        self
    }

    /// Every call for `address` fails with `error`.
    pub fn with_failure(mut self, address: &AssetAddress, error: SourceError) -> Self {
        self.failures.insert(address.clone(), error);
        self
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::Relaxed)
    }
}

impl LedgerSource for MemoryLedger {
    fn id(&self) -> ProviderId {
        ProviderId::Memory
    }

    fn list_signatures<'a>(
        &'a self,
        query: SignatureQuery,
    ) -> SourceFuture<'a, Vec<SignatureRecord>> {
        Box::pin(async move {
            self.page_requests.fetch_add(1, Ordering::Relaxed);
            if let Some(error) = self.failures.get(&query.address) {
                return Err(error.clone());
            }

            let Some(records) = self.signatures.get(&query.address) else {
                return Ok(Vec::new());
            };

            let start = match query.before.as_deref() {
                None => 0,
                Some(cursor) => match records.iter().position(|r| r.signature == cursor) {
                    Some(position) => position + 1,
                    None => records.len(),
                },
            };

            Ok(records
                .iter()
                .skip(start)
                .take(query.limit)
                .cloned()
                .collect())
        })
    }

    fn transaction<'a>(
        &'a self,
        signature: &'a str,
    ) -> SourceFuture<'a, Option<TransactionRecord>> {
        Box::pin(async move { Ok(self.transactions.get(signature).cloned()) })
    }
}

/// Deterministic in-memory price histories filtered to the requested window.
#[derive(Debug, Default)]
pub struct MemoryPriceHistory {
    series: HashMap<AssetAddress, Vec<PricePoint>>,
    failures: HashMap<AssetAddress, SourceError>,
}

impl MemoryPriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, address: &AssetAddress, points: Vec<PricePoint>) -> Self {
        self.series.insert(address.clone(), points);
        self
    }

    /// Prices at `start`, `start + step`, ... for each value.
    pub fn with_prices(self, address: &AssetAddress, start: i64, step: i64, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(index, value)| PricePoint {
                unix_time: start + step * index as i64,
                value: *value,
            })
            .collect();
        self.with_series(address, points)
    }

    pub fn with_failure(mut self, address: &AssetAddress, error: SourceError) -> Self {
        self.failures.insert(address.clone(), error);
        self
    }
}

impl PriceHistorySource for MemoryPriceHistory {
    fn id(&self) -> ProviderId {
        ProviderId::Memory
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, AssetSeries> {
        Box::pin(async move {
            if let Some(error) = self.failures.get(&req.address) {
                return Err(error.clone());
            }

            let from = req.time_from.as_secs();
            let to = req.time_to.as_secs();
            let points = self
                .series
                .get(&req.address)
                .map(|points| {
                    points
                        .iter()
                        .filter(|point| point.unix_time >= from && point.unix_time <= to)
                        .copied()
                        .collect()
                })
                .unwrap_or_default();

            Ok(AssetSeries::new(req.address.clone(), points)?)
        })
    }
}

/// Builds offline sources with a synthetic, address-seeded trajectory for the
/// target and every basket member.
///
/// Basket members are always older than the target and trade up to `now`, so
/// each one covers the target's full lifetime from its own birth.
pub fn synthetic_sources(
    target: &AssetAddress,
    basket: &[AssetAddress],
    granularity: Granularity,
    now: UnixTime,
) -> (MemoryLedger, MemoryPriceHistory) {
    let step = granularity.seconds();
    let mut ledger = MemoryLedger::new();
    let mut history = MemoryPriceHistory::new();

    let target_seed = address_seed(target);
    let target_buckets = 24 + (target_seed % 48) as i64;
    (ledger, history) = seed_asset(ledger, history, target, target_buckets, step, now);

    for member in basket.iter().filter(|member| *member != target) {
        let buckets = 120 + (address_seed(member) % 120) as i64;
        (ledger, history) = seed_asset(ledger, history, member, buckets, step, now);
    }

    (ledger, history)
}

fn seed_asset(
    ledger: MemoryLedger,
    history: MemoryPriceHistory,
    address: &AssetAddress,
    buckets: i64,
    step: i64,
    now: UnixTime,
) -> (MemoryLedger, MemoryPriceHistory) {
    let seed = address_seed(address);
    let birth = now.as_secs() - buckets * step;
    let activity = [birth, birth + step / 2, birth + step];

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut price = 0.000_1 * (1 + seed % 100) as f64;
    let mut values = Vec::with_capacity(buckets as usize + 1);
    for _ in 0..=buckets {
        values.push(price);
        price *= 1.0 + (rng.f64() * 0.35 - 0.15);
    }

    (
        ledger.with_activity(address, &activity),
        history.with_prices(address, birth, step, &values),
    )
}

fn address_seed(address: &AssetAddress) -> u64 {
    address.as_str().bytes().fold(13_u64, |acc, byte| {
        acc.wrapping_mul(29).wrapping_add(byte as u64)
    })
}
