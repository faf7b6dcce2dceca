// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::cmp::Ordering;
use std::sync::Arc;

use account_client::{AccountFetcher, FetchError, MemcmpFilter, RawAccount, RetryingFetcher};
use core_types::config::ProjectorConfig;
use core_types::status::{OverallStatus, ServiceStatusHandle, ServiceStatusSnapshot, StatusGauge};
use core_types::{Identity, Participation, PoolListing, PoolRecord, Stage};
use lifecycle::Classification;
use log::{debug, error, info, warn};
use pool_decoder::{CREATOR_OFFSET, OPEN_STAGE_OFFSET, decode_pool_record};
use query_cache::{CacheEntry, QueryCache};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;

const OPEN_STAGE_FILTER_OFFSET: u32 = OPEN_STAGE_OFFSET as u32;
const CREATOR_FILTER_OFFSET: u32 = CREATOR_OFFSET as u32;

const _: () = assert!(OPEN_STAGE_FILTER_OFFSET as usize == OPEN_STAGE_OFFSET);
const _: () = assert!(CREATOR_FILTER_OFFSET as usize == CREATOR_OFFSET);

/// Outcome of decoding one fetched batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub listings: Vec<PoolListing>,
    pub failures: usize,
}

/// Decode every account independently; malformed ones are logged and counted.
pub fn decode_batch<I>(label: &str, accounts: I) -> DecodeReport
where
    I: IntoIterator<Item = RawAccount>,
{
    let mut report = DecodeReport::default();
    for account in accounts {
        match decode_pool_record(&account.data) {
            Ok(record) => report.listings.push(PoolListing::new(account.address, record)),
            Err(err) => {
                warn!("[{}] skipping account {}: {}", label, account.address, err);
                report.failures += 1;
            }
        }
    }
    report
}

/// Server-side filter selecting open records.
///
/// Relies on open records never carrying a winner: with the presence tag
/// absent, the stage byte sits at [`OPEN_STAGE_OFFSET`]. Queries for any other
/// stage cannot use a fixed offset.
pub fn open_stage_filter() -> MemcmpFilter {
    MemcmpFilter::new(OPEN_STAGE_FILTER_OFFSET, vec![Stage::Open.as_byte()])
}

pub fn creator_filter(creator: &Identity) -> MemcmpFilter {
    MemcmpFilter::new(CREATOR_FILTER_OFFSET, creator.as_bytes().to_vec())
}

/// Latest lock time first, then address.
pub fn sort_open_listings(listings: &mut [PoolListing]) {
    listings.sort_by(|a, b| {
        b.record
            .lock_time
            .cmp(&a.record.lock_time)
            .then_with(|| a.address.cmp(&b.address))
    });
}

/// Open pools first, then most participants, then address.
pub fn sort_created_listings(listings: &mut [PoolListing]) {
    listings.sort_by(|a, b| {
        let primary = match (a.record.is_open(), b.record.is_open()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.record.participant_count.cmp(&a.record.participant_count),
        };
        primary.then_with(|| a.address.cmp(&b.address))
    });
}

/// Bulk projection over pool accounts with a TTL cache in front of the open listing.
pub struct PoolProjector {
    config: ProjectorConfig,
    fetcher: Arc<dyn AccountFetcher>,
    cache: QueryCache,
    clock: Arc<dyn Clock>,
    status: ServiceStatusHandle,
}

impl PoolProjector {
    pub fn new(config: ProjectorConfig, fetcher: Arc<dyn AccountFetcher>) -> Self {
        Self::with_clock(config, fetcher, Arc::new(SystemClock))
    }

    /// Wraps `fetcher` so transient failures are retried per `config.retry`.
    pub fn with_retry<F>(config: ProjectorConfig, fetcher: F) -> Self
    where
        F: AccountFetcher + 'static,
    {
        let fetcher = RetryingFetcher::from_settings(fetcher, &config.retry);
        Self::new(config, Arc::new(fetcher))
    }

    pub fn with_clock(
        config: ProjectorConfig,
        fetcher: Arc<dyn AccountFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = QueryCache::new(config.cache_ttl_secs);
        let status = ServiceStatusHandle::new(format!("{}_projector", config.label));
        status.push_warning("no pools loaded yet");
        Self {
            config,
            fetcher,
            cache,
            clock,
            status,
        }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub fn status(&self) -> ServiceStatusSnapshot {
        self.status.snapshot()
    }

    pub fn invalidate_cache(&self) {
        debug!("[{}] open pool cache invalidated", self.config.label);
        self.cache.invalidate();
    }

    /// Open pools, newest lock time first.
    ///
    /// Served from the cache while it is fresh unless `force_refresh` is set. A
    /// failed fetch leaves the cache as it was.
    pub async fn load_open_pools(&self, force_refresh: bool) -> Result<Vec<PoolListing>> {
        let now = self.clock.now();
        if !force_refresh {
            if let Some(entry) = self.cache.get(now) {
                debug!(
                    "[{}] serving {} open pools from cache (age {}s)",
                    self.config.label,
                    entry.records.len(),
                    now - entry.captured_at
                );
                return Ok(entry.records);
            }
        }

        let accounts = self.fetch(&[open_stage_filter()]).await?;
        let fetched = accounts.len();
        let report = decode_batch(
            &self.config.label,
            accounts.into_iter().take(self.config.max_results),
        );
        let decoded = report.listings.len();
        let mut listings: Vec<PoolListing> = report
            .listings
            .into_iter()
            .filter(|listing| listing.record.is_open())
            .collect();
        if listings.len() < decoded {
            debug!(
                "[{}] dropped {} non-open records returned by the open filter",
                self.config.label,
                decoded - listings.len()
            );
        }
        sort_open_listings(&mut listings);

        let captured_at = self.clock.now();
        self.cache.put(CacheEntry::new(listings.clone(), captured_at));
        self.publish_batch(fetched, decoded, report.failures, listings.len());
        info!(
            "[{}] loaded {} open pools ({} fetched, {} undecodable)",
            self.config.label,
            listings.len(),
            fetched,
            report.failures
        );
        Ok(listings)
    }

    /// Every pool created by `creator`, open ones first. Not cached.
    pub async fn load_created_pools(&self, creator: &Identity) -> Result<Vec<PoolListing>> {
        let accounts = self.fetch(&[creator_filter(creator)]).await?;
        let fetched = accounts.len();
        let report = decode_batch(
            &self.config.label,
            accounts.into_iter().take(self.config.max_results),
        );
        let mut listings: Vec<PoolListing> = report
            .listings
            .into_iter()
            .filter(|listing| listing.record.creator == *creator)
            .collect();
        sort_created_listings(&mut listings);
        info!(
            "[{}] loaded {} pools created by {} ({} fetched, {} undecodable)",
            self.config.label,
            listings.len(),
            creator,
            fetched,
            report.failures
        );
        Ok(listings)
    }

    /// Classify a single record for `caller` at the projector's current time.
    pub fn classify(
        &self,
        record: &PoolRecord,
        caller: Option<&Identity>,
        participation: Option<&Participation>,
    ) -> Classification {
        lifecycle::classify(record, caller, participation, self.clock.now())
    }

    async fn fetch(&self, filters: &[MemcmpFilter]) -> Result<Vec<RawAccount>> {
        match self
            .fetcher
            .fetch_accounts(&self.config.program_id, filters)
            .await
        {
            Ok(accounts) => Ok(accounts),
            Err(err) => {
                self.record_fetch_failure(&err);
                Err(err.into())
            }
        }
    }

    fn record_fetch_failure(&self, err: &FetchError) {
        error!("[{}] account fetch failed: {}", self.config.label, err);
        self.status.set_overall(OverallStatus::Crit);
        self.status.push_error(format!("account fetch failed: {}", err));
    }

    fn publish_batch(&self, fetched: usize, decoded: usize, failures: usize, cached: usize) {
        self.status.clear_messages();
        if failures > 0 {
            self.status.set_overall(OverallStatus::Warn);
            self.status
                .push_warning(format!("{} accounts failed to decode", failures));
        } else {
            self.status.set_overall(OverallStatus::Ok);
        }
        self.status.set_gauges(vec![
            StatusGauge::count("fetched", fetched),
            StatusGauge::count("decoded", decoded).with_max(self.config.max_results),
            StatusGauge::count("decode failures", failures),
            StatusGauge::count("cached listings", cached),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ProjectorError;
    use account_client::InMemoryAccounts;
    use async_trait::async_trait;
    use core_types::config::RetrySettings;
    use core_types::{DoorIndex, Pubkey};
    use pool_decoder::{DecodeError, encode_pool_record};

    const PROGRAM: Pubkey = Pubkey::new([0xaa; 32]);
    const CREATOR: Pubkey = Pubkey::new([0x11; 32]);
    const ARBITER: Pubkey = Pubkey::new([0x22; 32]);
    const T0: i64 = 1_700_000_000;

    fn config() -> ProjectorConfig {
        ProjectorConfig {
            label: "test".to_string(),
            program_id: PROGRAM,
            ..ProjectorConfig::default()
        }
    }

    fn record(lock_time: i64) -> PoolRecord {
        PoolRecord {
            creator: CREATOR,
            arbiter: ARBITER,
            min_deposit: 1_000,
            total_pool: 0,
            lock_time,
            winner_selection: None,
            stage: Stage::Open,
            participant_count: 0,
            is_automatic: false,
        }
    }

    fn account(tag: u8, record: &PoolRecord) -> RawAccount {
        RawAccount::new(Pubkey([tag; 32]), encode_pool_record(record, 255))
    }

    fn garbage(tag: u8) -> RawAccount {
        // wrong discriminator; byte 97 stays zero so the open filter still passes it
        let mut data = vec![0u8; 120];
        data[..8].copy_from_slice(b"notapool");
        RawAccount::new(Pubkey([tag; 32]), data)
    }

    fn projector(source: Arc<InMemoryAccounts>, clock: Arc<ManualClock>) -> PoolProjector {
        PoolProjector::with_clock(config(), source, clock)
    }

    /// Source whose every call takes `latency` seconds of the manual clock.
    struct SlowAccounts {
        inner: Arc<InMemoryAccounts>,
        clock: Arc<ManualClock>,
        latency: i64,
    }

    #[async_trait]
    impl AccountFetcher for SlowAccounts {
        async fn fetch_accounts(
            &self,
            program: &Pubkey,
            filters: &[MemcmpFilter],
        ) -> std::result::Result<Vec<RawAccount>, FetchError> {
            self.clock.advance(self.latency);
            self.inner.fetch_accounts(program, filters).await
        }
    }

    #[tokio::test]
    async fn skips_undecodable_and_sorts_by_lock_time() {
        let source = Arc::new(InMemoryAccounts::new(
            PROGRAM,
            vec![
                account(5, &record(T0 + 10)),
                garbage(6),
                account(3, &record(T0 + 30)),
                account(9, &record(T0 + 10)),
                garbage(7),
                account(1, &record(T0 + 10)),
            ],
        ));
        let clock = Arc::new(ManualClock::new(T0));
        let projector = projector(source.clone(), clock);

        let pools = projector.load_open_pools(false).await.unwrap();
        let order: Vec<u8> = pools.iter().map(|p| p.address.0[0]).collect();
        assert_eq!(order, vec![3, 1, 5, 9]);
        assert_eq!(source.calls(), vec![vec![open_stage_filter()]]);

        let status = projector.status();
        assert_eq!(status.overall, OverallStatus::Warn);
        assert_eq!(status.gauges[2].value, 2.0);
    }

    #[tokio::test]
    async fn serves_cache_until_ttl_then_refetches() {
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, vec![account(1, &record(T0))]));
        let clock = Arc::new(ManualClock::new(T0));
        let projector = projector(source.clone(), clock.clone());

        let first = projector.load_open_pools(false).await.unwrap();
        source.replace_accounts(vec![account(1, &record(T0)), account(2, &record(T0 + 1))]);

        clock.advance(29);
        assert_eq!(projector.load_open_pools(false).await.unwrap(), first);
        assert_eq!(source.call_count(), 1);

        clock.advance(1);
        let refreshed = projector.load_open_pools(false).await.unwrap();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(source.call_count(), 2);
        assert_eq!(projector.status().overall, OverallStatus::Ok);
    }

    #[tokio::test]
    async fn forced_refresh_and_invalidation_bypass_cache() {
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, vec![account(1, &record(T0))]));
        let clock = Arc::new(ManualClock::new(T0));
        let projector = projector(source.clone(), clock);

        projector.load_open_pools(false).await.unwrap();
        projector.load_open_pools(true).await.unwrap();
        assert_eq!(source.call_count(), 2);

        projector.invalidate_cache();
        projector.load_open_pools(false).await.unwrap();
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_fresh_cache() {
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, vec![account(1, &record(T0))]));
        let clock = Arc::new(ManualClock::new(T0));
        let projector = projector(source.clone(), clock.clone());

        let cached = projector.load_open_pools(false).await.unwrap();
        source.fail_next(FetchError::Timeout);
        let err = projector.load_open_pools(true).await.unwrap_err();
        assert_eq!(err, ProjectorError::Fetch(FetchError::Timeout));
        assert!(err.is_retryable());
        assert_eq!(projector.status().overall, OverallStatus::Crit);

        clock.advance(5);
        assert_eq!(projector.load_open_pools(false).await.unwrap(), cached);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn cache_age_counts_from_fetch_completion() {
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, vec![account(1, &record(T0))]));
        let clock = Arc::new(ManualClock::new(T0));
        let slow = SlowAccounts {
            inner: source.clone(),
            clock: clock.clone(),
            latency: 20,
        };
        let projector = PoolProjector::with_clock(config(), Arc::new(slow), clock.clone());

        let first = projector.load_open_pools(false).await.unwrap();
        assert_eq!(projector.cache.age(clock.now()), Some(0));

        clock.advance(15);
        assert_eq!(projector.load_open_pools(false).await.unwrap(), first);
        assert_eq!(source.call_count(), 1);

        clock.advance(15);
        projector.load_open_pools(false).await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn retry_settings_wrap_the_fetcher() {
        tokio::time::pause();
        let retry = RetrySettings {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 10,
            jitter_pct: 0.0,
        };
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, vec![account(1, &record(T0))]));
        source.fail_next(FetchError::Timeout);
        source.fail_next(FetchError::RateLimited);
        let projector = PoolProjector::with_retry(
            ProjectorConfig {
                retry: retry.clone(),
                ..config()
            },
            source.clone(),
        );

        let pools = projector.load_open_pools(false).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(source.call_count(), 3);

        // a single configured attempt surfaces the first transient error
        source.fail_next(FetchError::Timeout);
        let single = PoolProjector::with_retry(
            ProjectorConfig {
                retry: RetrySettings {
                    max_attempts: 1,
                    ..retry
                },
                ..config()
            },
            source.clone(),
        );
        let err = single.load_open_pools(false).await.unwrap_err();
        assert_eq!(err, ProjectorError::Fetch(FetchError::Timeout));
        assert_eq!(source.call_count(), 4);
    }

    #[tokio::test]
    async fn caps_batch_at_max_results() {
        let accounts: Vec<RawAccount> = (0..60u8)
            .map(|i| account(i, &record(T0 + i as i64)))
            .collect();
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, accounts));
        let projector = projector(source, Arc::new(ManualClock::new(T0)));

        let pools = projector.load_open_pools(false).await.unwrap();
        assert_eq!(pools.len(), 50);
        // only the first 50 fetched records are considered
        assert_eq!(pools[0].address, Pubkey([49; 32]));
        assert!(pools.iter().all(|p| p.address.0[0] < 50));
    }

    #[tokio::test]
    async fn drops_non_open_records_that_pass_the_filter() {
        // a revealed record whose winner byte happens to be 0 lines up with the open filter
        let revealed = PoolRecord {
            stage: Stage::Revealed,
            winner_selection: Some(DoorIndex(0)),
            ..record(T0)
        };
        let source = Arc::new(InMemoryAccounts::new(
            PROGRAM,
            vec![account(1, &revealed), account(2, &record(T0))],
        ));
        let projector = projector(source, Arc::new(ManualClock::new(T0)));

        let pools = projector.load_open_pools(false).await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].address, Pubkey([2; 32]));
    }

    #[tokio::test]
    async fn created_pools_put_open_first() {
        let other = Pubkey::new([0x33; 32]);
        let busy_revealed = PoolRecord {
            stage: Stage::Revealed,
            winner_selection: Some(DoorIndex(3)),
            participant_count: 9,
            ..record(T0)
        };
        let small_open = PoolRecord {
            participant_count: 1,
            ..record(T0)
        };
        let big_open = PoolRecord {
            participant_count: 4,
            ..record(T0)
        };
        let foreign = PoolRecord {
            creator: other,
            ..record(T0)
        };
        let source = Arc::new(InMemoryAccounts::new(
            PROGRAM,
            vec![
                account(1, &busy_revealed),
                account(2, &small_open),
                account(3, &big_open),
                account(4, &foreign),
            ],
        ));
        let projector = projector(source.clone(), Arc::new(ManualClock::new(T0)));

        let pools = projector.load_created_pools(&CREATOR).await.unwrap();
        let order: Vec<u8> = pools.iter().map(|p| p.address.0[0]).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(source.calls(), vec![vec![creator_filter(&CREATOR)]]);
        // the listing path is untouched
        assert!(projector.cache.is_empty());
    }

    #[tokio::test]
    async fn classify_uses_projector_clock() {
        let source = Arc::new(InMemoryAccounts::new(PROGRAM, Vec::new()));
        let clock = Arc::new(ManualClock::new(T0 - 1));
        let projector = projector(source, clock.clone());
        let pool = PoolRecord {
            is_automatic: true,
            participant_count: 2,
            ..record(T0)
        };

        assert!(!projector.classify(&pool, None, None).can_auto_reveal);
        clock.set(T0);
        assert!(projector.classify(&pool, None, None).can_auto_reveal);
    }

    #[test]
    fn decode_batch_counts_failures() {
        let report = decode_batch(
            "test",
            vec![
                account(1, &record(T0)),
                garbage(2),
                RawAccount::new(Pubkey([3; 32]), Vec::new()),
            ],
        );
        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.failures, 2);
        assert_eq!(open_stage_filter().offset, 97);
        assert_eq!(creator_filter(&CREATOR).offset, 8);
        assert!(open_stage_filter().matches(&garbage(2).data));
        assert!(matches!(
            decode_pool_record(&garbage(2).data),
            Err(DecodeError::DiscriminatorMismatch { .. })
        ));
    }
}
