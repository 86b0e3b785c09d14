//! Layered exchange-rate resolution.
//!
//! [`RateProvider::resolve`] walks [`TIERS`] in order and stops at the first
//! tier that yields a table:
//!
//! 1. fresh cache (younger than the TTL, same base)
//! 2. live primary source, enriched with crypto and metals rates
//! 3. alternate fiat source, unenriched
//! 4. stale cache of any age
//! 5. built-in defaults
//!
//! The last tier cannot fail, so resolution always produces a table.

use crate::core::config::AppConfig;
use crate::core::rates::{CacheEntry, ExchangeRateTable, RateEnrichment, RateSource, default_table};
use crate::core::storage::Storage;
use crate::providers::{CoinbaseCryptoSource, FiatRateSource, StaticMetalsSource};
use anyhow::Result;
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    FreshCache,
    Live,
    Alternate,
    StaleCache,
    Defaults,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tier::FreshCache => "cache",
                Tier::Live => "live",
                Tier::Alternate => "alternate source",
                Tier::StaleCache => "stale cache",
                Tier::Defaults => "built-in defaults",
            }
        )
    }
}

/// Resolution order.
pub const TIERS: [Tier; 5] = [
    Tier::FreshCache,
    Tier::Live,
    Tier::Alternate,
    Tier::StaleCache,
    Tier::Defaults,
];

#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome {
    Ok(ExchangeRateTable),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub table: ExchangeRateTable,
    pub tier: Tier,
}

/// Snapshot taken when a resolution starts, used to veto late cache writes.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    generation: u64,
    started_at_epoch_ms: i64,
}

pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

pub struct RateProvider {
    storage: Storage,
    primary: Arc<dyn RateSource>,
    alternate: Arc<dyn RateSource>,
    enrichments: Vec<Arc<dyn RateEnrichment>>,
    ttl: Duration,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl RateProvider {
    pub fn new(
        storage: Storage,
        primary: Arc<dyn RateSource>,
        alternate: Arc<dyn RateSource>,
        enrichments: Vec<Arc<dyn RateEnrichment>>,
        ttl: Duration,
    ) -> Self {
        RateProvider {
            storage,
            primary,
            alternate,
            enrichments,
            ttl,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &AppConfig, storage: Storage) -> Result<Self> {
        let providers = &config.providers;
        Ok(Self::new(
            storage,
            Arc::new(FiatRateSource::primary(&providers.primary)?),
            Arc::new(FiatRateSource::fallback(&providers.fallback)?),
            vec![
                Arc::new(CoinbaseCryptoSource::new(&providers.crypto)?),
                Arc::new(StaticMetalsSource),
            ],
            config.cache_ttl(),
        ))
    }

    /// Rates for `base`. Never fails.
    pub async fn get_rates(&self, base: &str) -> ExchangeRateTable {
        self.resolve(base).await.table
    }

    /// Like [`RateProvider::get_rates`], also reporting which tier answered.
    #[instrument(name = "ResolveRates", skip(self), fields(base = %base))]
    pub async fn resolve(&self, base: &str) -> Resolved {
        let attempt = Attempt {
            generation: self.generation.load(Ordering::SeqCst),
            started_at_epoch_ms: now_epoch_ms(),
        };

        for tier in TIERS {
            match self.try_tier(tier, base, attempt).await {
                TierOutcome::Ok(table) => {
                    info!(%tier, date = %table.date, "Resolved exchange rates");
                    return Resolved { table, tier };
                }
                TierOutcome::Failed(reason) => match tier {
                    Tier::FreshCache | Tier::StaleCache => debug!(%tier, %reason, "Tier skipped"),
                    _ => warn!(%tier, %reason, "Tier failed, trying next"),
                },
            }
        }

        Resolved {
            table: default_table(&today()),
            tier: Tier::Defaults,
        }
    }

    /// Drops the cached table, then resolves again so the cleared entry cannot
    /// be served back.
    pub async fn refresh(&self, base: &str) -> Resolved {
        self.clear_cache().await;
        self.resolve(base).await
    }

    /// Removes the cache entry. Resolutions already in flight will not write
    /// their result afterwards.
    pub async fn clear_cache(&self) {
        let _guard = self.write_lock.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.storage.clear_cache().await;
        debug!("Cleared rate cache");
    }

    async fn try_tier(&self, tier: Tier, base: &str, attempt: Attempt) -> TierOutcome {
        match tier {
            Tier::FreshCache => self.fresh_cache(base).await,
            Tier::Live => self.live(base, attempt).await,
            Tier::Alternate => self.alternate(base, attempt).await,
            Tier::StaleCache => self.stale_cache().await,
            Tier::Defaults => TierOutcome::Ok(default_table(&today())),
        }
    }

    async fn fresh_cache(&self, base: &str) -> TierOutcome {
        match self.storage.cached_rates().await {
            None => TierOutcome::Failed("no cached rates".to_string()),
            Some(entry) if entry.table.base != base => TierOutcome::Failed(format!(
                "cached rates are for base {}",
                entry.table.base
            )),
            Some(entry) if !entry.is_fresh(now_epoch_ms(), self.ttl) => TierOutcome::Failed(
                format!("cached rates expired {} ms ago", entry.age_ms(now_epoch_ms())),
            ),
            Some(entry) => TierOutcome::Ok(entry.table),
        }
    }

    async fn live(&self, base: &str, attempt: Attempt) -> TierOutcome {
        let table = match self.primary.fetch_rates(base).await {
            Ok(table) => table,
            Err(e) => return TierOutcome::Failed(format!("{}: {e}", self.primary.name())),
        };

        let table = table.merged_with(self.enrich(&table).await);
        self.write_cache(&table, attempt).await;
        TierOutcome::Ok(table)
    }

    async fn alternate(&self, base: &str, attempt: Attempt) -> TierOutcome {
        match self.alternate.fetch_rates(base).await {
            Ok(table) => {
                self.write_cache(&table, attempt).await;
                TierOutcome::Ok(table)
            }
            Err(e) => TierOutcome::Failed(format!("{}: {e}", self.alternate.name())),
        }
    }

    async fn stale_cache(&self) -> TierOutcome {
        match self.storage.cached_rates().await {
            Some(entry) => {
                info!(
                    age_ms = entry.age_ms(now_epoch_ms()),
                    "Using expired cache as fallback"
                );
                TierOutcome::Ok(entry.table)
            }
            None => TierOutcome::Failed("no cached rates".to_string()),
        }
    }

    /// Runs every enrichment concurrently. A failed enrichment contributes its
    /// fallback constants instead.
    async fn enrich(&self, table: &ExchangeRateTable) -> HashMap<String, f64> {
        let fetches = self.enrichments.iter().map(|enrichment| async move {
            match enrichment.fetch_extra(table).await {
                Ok(extra) => extra,
                Err(e) => {
                    warn!(source = enrichment.name(), error = %e, "Enrichment failed, using fallback rates");
                    enrichment.fallback(table)
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    async fn write_cache(&self, table: &ExchangeRateTable, attempt: Attempt) {
        let _guard = self.write_lock.lock().await;

        if self.generation.load(Ordering::SeqCst) != attempt.generation {
            debug!("Cache cleared during fetch, not caching result");
            return;
        }
        if let Some(existing) = self.storage.cached_rates().await
            && existing.fetched_at_epoch_ms > attempt.started_at_epoch_ms
        {
            debug!("Newer cache entry already stored, not caching result");
            return;
        }

        let entry = CacheEntry {
            table: table.clone(),
            fetched_at_epoch_ms: now_epoch_ms(),
        };
        self.storage.cache_rates(&entry).await;
    }
}
