//! Exchange rate tables and the source abstractions that produce them.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Rates expressed as "1 unit of `base` = `rates[code]` units of `code`".
///
/// The base is an implicit unit even when the map has no entry for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    pub base: String,
    pub date: String,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRateTable {
    pub fn new(base: &str, date: &str, rates: HashMap<String, f64>) -> Self {
        ExchangeRateTable {
            base: base.to_string(),
            date: date.to_string(),
            rates,
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if code == self.base => Some(1.0),
            None => None,
        }
    }

    /// Rate for `code`, or `1` when the table has none or it is zero or
    /// non-finite.
    pub fn rate_or_unit(&self, code: &str) -> f64 {
        match self.rate(code) {
            Some(rate) if rate != 0.0 && rate.is_finite() => rate,
            _ => 1.0,
        }
    }

    /// Returns a new table with `extra` layered over the current rates.
    pub fn merged_with(&self, extra: HashMap<String, f64>) -> Self {
        let mut rates = self.rates.clone();
        rates.extend(extra);
        ExchangeRateTable {
            base: self.base.clone(),
            date: self.date.clone(),
            rates,
        }
    }

    /// Converts USD-quoted constants ("1 USD = x") into this table's base.
    pub fn rebase_usd_quoted(&self, per_usd: &[(&str, f64)]) -> HashMap<String, f64> {
        let usd_per_base = self.rate_or_unit("USD");
        per_usd
            .iter()
            .map(|(code, rate)| (code.to_string(), rate * usd_per_base))
            .collect()
    }
}

/// A rate table plus the wall-clock time it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub table: ExchangeRateTable,
    pub fetched_at_epoch_ms: i64,
}

impl CacheEntry {
    pub fn age_ms(&self, now_epoch_ms: i64) -> i64 {
        now_epoch_ms - self.fetched_at_epoch_ms
    }

    pub fn is_fresh(&self, now_epoch_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_epoch_ms) < ttl_ms
    }
}

/// A source of complete fiat rate tables for a base currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_rates(&self, base: &str) -> Result<ExchangeRateTable>;
}

/// A best-effort source of extra codes merged into a primary table.
///
/// When [`RateEnrichment::fetch_extra`] fails, [`RateEnrichment::fallback`]
/// supplies constants so the codes are never omitted.
#[async_trait]
pub trait RateEnrichment: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_extra(&self, table: &ExchangeRateTable) -> Result<HashMap<String, f64>>;

    fn fallback(&self, table: &ExchangeRateTable) -> HashMap<String, f64>;
}

/// 1 USD in BTC when the crypto source is unavailable.
pub const FALLBACK_BTC_PER_USD: f64 = 0.000025;

/// Troy ounces per USD. No live metals source exists.
pub const METALS_PER_USD: &[(&str, f64)] = &[("XAU", 0.0005), ("XAG", 0.04)];

const DEFAULT_FIAT_PER_USD: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.85),
    ("GBP", 0.73),
    ("JPY", 110.0),
    ("CNY", 6.45),
    ("INR", 74.5),
    ("AED", 3.67),
    ("AUD", 1.35),
    ("CAD", 1.25),
    ("CHF", 0.92),
    ("SGD", 1.35),
    ("HKD", 7.78),
];

/// Built-in USD table used when nothing else is available.
pub fn default_table(date: &str) -> ExchangeRateTable {
    let rates = DEFAULT_FIAT_PER_USD
        .iter()
        .chain(METALS_PER_USD)
        .map(|(code, rate)| (code.to_string(), *rate))
        .chain(std::iter::once(("BTC".to_string(), FALLBACK_BTC_PER_USD)))
        .collect();
    ExchangeRateTable::new("USD", date, rates)
}
