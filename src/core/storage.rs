//! Typed persistence over a [`KeyValueStore`].
//!
//! Every read degrades to "nothing stored" and every write failure is only
//! logged, so storage problems never surface to callers.

use crate::core::currency::DEFAULT_CURRENCY_CODES;
use crate::core::kv::KeyValueStore;
use crate::core::rates::{CacheEntry, ExchangeRateTable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const SAVED_CURRENCIES_KEY: &str = "@denominations_saved_currencies";
pub const CACHED_RATES_KEY: &str = "@denominations_cached_rates";
pub const LAST_UPDATE_KEY: &str = "@denominations_last_update";
pub const LAST_CONVERSION_DATA_KEY: &str = "@denominations_last_conversion_data";
pub const LAST_CONVERSION_BASE_KEY: &str = "@denominations_last_conversion_base";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionBase {
    pub currency: String,
    pub amount: f64,
}

/// Both halves are stored independently and either may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredConversion {
    pub conversions: Option<HashMap<String, f64>>,
    pub base: Option<ConversionBase>,
}

#[derive(Clone)]
pub struct Storage {
    kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Storage { kv }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key).await? {
            Some(text) => {
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse stored value for {key}"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.kv.set(key, &text).await
    }

    pub async fn saved_currencies(&self) -> Vec<String> {
        match self.read_json::<Vec<String>>(SAVED_CURRENCIES_KEY).await {
            Ok(Some(codes)) => codes,
            Ok(None) => default_codes(),
            Err(e) => {
                warn!(error = %e, "Error loading saved currencies");
                default_codes()
            }
        }
    }

    pub async fn save_currencies(&self, codes: &[String]) {
        if let Err(e) = self.write_json(SAVED_CURRENCIES_KEY, &codes).await {
            warn!(error = %e, "Error saving currencies");
        }
    }

    /// The persisted rate cache regardless of age.
    pub async fn cached_rates(&self) -> Option<CacheEntry> {
        let result: Result<Option<CacheEntry>> = async {
            let table = self.read_json::<ExchangeRateTable>(CACHED_RATES_KEY).await?;
            let fetched_at = self.kv.get(LAST_UPDATE_KEY).await?;
            match (table, fetched_at) {
                (Some(table), Some(fetched_at)) => {
                    let fetched_at_epoch_ms = fetched_at
                        .trim()
                        .parse::<i64>()
                        .with_context(|| format!("Invalid cache timestamp: {fetched_at}"))?;
                    Ok(Some(CacheEntry {
                        table,
                        fetched_at_epoch_ms,
                    }))
                }
                _ => Ok(None),
            }
        }
        .await;

        match result {
            Ok(entry) => {
                debug!(hit = entry.is_some(), "Read rate cache");
                entry
            }
            Err(e) => {
                warn!(error = %e, "Error loading cached rates");
                None
            }
        }
    }

    pub async fn cache_rates(&self, entry: &CacheEntry) {
        if let Err(e) = self.write_json(CACHED_RATES_KEY, &entry.table).await {
            warn!(error = %e, "Error caching rates");
            return;
        }
        let stamped = self
            .kv
            .set(LAST_UPDATE_KEY, &entry.fetched_at_epoch_ms.to_string())
            .await;
        if let Err(e) = stamped {
            warn!(error = %e, "Error writing cache timestamp, dropping cached rates");
            // The new table must not pair with an older timestamp.
            if let Err(e) = self.kv.remove(CACHED_RATES_KEY).await {
                warn!(error = %e, "Error dropping cached rates");
            }
        }
    }

    pub async fn clear_cache(&self) {
        for key in [CACHED_RATES_KEY, LAST_UPDATE_KEY] {
            if let Err(e) = self.kv.remove(key).await {
                warn!(error = %e, key, "Error clearing cache");
            }
        }
    }

    pub async fn save_last_conversion(
        &self,
        conversions: &HashMap<String, f64>,
        base_currency: &str,
        amount: f64,
    ) {
        let base = ConversionBase {
            currency: base_currency.to_string(),
            amount,
        };
        let result: Result<()> = async {
            self.write_json(LAST_CONVERSION_DATA_KEY, conversions).await?;
            self.write_json(LAST_CONVERSION_BASE_KEY, &base).await
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "Error saving last conversion");
        }
    }

    pub async fn last_conversion(&self) -> StoredConversion {
        let result: Result<StoredConversion> = async {
            Ok(StoredConversion {
                conversions: self.read_json(LAST_CONVERSION_DATA_KEY).await?,
                base: self.read_json(LAST_CONVERSION_BASE_KEY).await?,
            })
        }
        .await;
        result.unwrap_or_else(|e| {
            warn!(error = %e, "Error loading last conversion");
            StoredConversion::default()
        })
    }
}

fn default_codes() -> Vec<String> {
    DEFAULT_CURRENCY_CODES.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::default_table;
    use crate::store::memory::MemoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("store unavailable"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("store unavailable"))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow!("store unavailable"))
        }
    }

    /// Memory store that refuses writes to one key.
    struct RejectKeyStore {
        inner: MemoryStore,
        rejected: &'static str,
    }

    #[async_trait]
    impl KeyValueStore for RejectKeyStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == self.rejected {
                return Err(anyhow!("write rejected"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    fn memory_storage() -> (MemoryStore, Storage) {
        let kv = MemoryStore::new();
        let storage = Storage::new(Arc::new(kv.clone()));
        (kv, storage)
    }

    #[tokio::test]
    async fn test_saved_currencies_default() {
        let (_, storage) = memory_storage();
        assert_eq!(storage.saved_currencies().await, vec!["USD", "INR", "AED"]);
    }

    #[tokio::test]
    async fn test_saved_currencies_round_trip() {
        let (kv, storage) = memory_storage();
        let codes = vec!["EUR".to_string(), "GBP".to_string()];
        storage.save_currencies(&codes).await;

        assert_eq!(
            kv.get(SAVED_CURRENCIES_KEY).await.unwrap().as_deref(),
            Some(r#"["EUR","GBP"]"#)
        );
        assert_eq!(storage.saved_currencies().await, codes);
    }

    #[tokio::test]
    async fn test_saved_empty_list_is_kept() {
        let (_, storage) = memory_storage();
        storage.save_currencies(&[]).await;
        assert!(storage.saved_currencies().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_saved_currencies_fall_back_to_defaults() {
        let (kv, storage) = memory_storage();
        kv.set(SAVED_CURRENCIES_KEY, "not json").await.unwrap();
        assert_eq!(storage.saved_currencies().await, vec!["USD", "INR", "AED"]);
    }

    #[tokio::test]
    async fn test_broken_store_degrades() {
        let storage = Storage::new(Arc::new(BrokenStore));
        assert_eq!(storage.saved_currencies().await, vec!["USD", "INR", "AED"]);
        assert!(storage.cached_rates().await.is_none());
        assert_eq!(storage.last_conversion().await, StoredConversion::default());

        // Writes only log
        storage.save_currencies(&["USD".to_string()]).await;
        storage.clear_cache().await;
    }

    #[tokio::test]
    async fn test_cache_uses_two_keys() {
        let (kv, storage) = memory_storage();
        let entry = CacheEntry {
            table: default_table("2024-01-01"),
            fetched_at_epoch_ms: 1_700_000_000_000,
        };
        storage.cache_rates(&entry).await;

        assert_eq!(
            kv.get(LAST_UPDATE_KEY).await.unwrap().as_deref(),
            Some("1700000000000")
        );
        assert!(kv.get(CACHED_RATES_KEY).await.unwrap().is_some());
        assert_eq!(storage.cached_rates().await, Some(entry));

        storage.clear_cache().await;
        assert!(kv.get(CACHED_RATES_KEY).await.unwrap().is_none());
        assert!(kv.get(LAST_UPDATE_KEY).await.unwrap().is_none());
        assert!(storage.cached_rates().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_timestamp_write_drops_table() {
        let inner = MemoryStore::new();
        let storage = Storage::new(Arc::new(RejectKeyStore {
            inner: inner.clone(),
            rejected: LAST_UPDATE_KEY,
        }));
        inner.set(LAST_UPDATE_KEY, "1700000000000").await.unwrap();
        inner
            .set(
                CACHED_RATES_KEY,
                r#"{"base":"USD","date":"2023-11-14","rates":{"EUR":0.9}}"#,
            )
            .await
            .unwrap();

        let entry = CacheEntry {
            table: default_table("2024-01-01"),
            fetched_at_epoch_ms: 1_800_000_000_000,
        };
        storage.cache_rates(&entry).await;

        assert!(inner.get(CACHED_RATES_KEY).await.unwrap().is_none());
        assert!(storage.cached_rates().await.is_none());
    }

    #[tokio::test]
    async fn test_cache_without_timestamp_is_ignored() {
        let (kv, storage) = memory_storage();
        kv.set(
            CACHED_RATES_KEY,
            r#"{"base":"USD","date":"2024-01-01","rates":{"EUR":0.9}}"#,
        )
        .await
        .unwrap();
        assert!(storage.cached_rates().await.is_none());

        kv.set(LAST_UPDATE_KEY, "garbage").await.unwrap();
        assert!(storage.cached_rates().await.is_none());
    }

    #[tokio::test]
    async fn test_last_conversion_round_trip() {
        let (kv, storage) = memory_storage();
        assert_eq!(storage.last_conversion().await, StoredConversion::default());

        let conversions = HashMap::from([("USD".to_string(), 100.0), ("EUR".to_string(), 85.0)]);
        storage.save_last_conversion(&conversions, "USD", 100.0).await;

        assert_eq!(
            kv.get(LAST_CONVERSION_BASE_KEY).await.unwrap().as_deref(),
            Some(r#"{"currency":"USD","amount":100.0}"#)
        );
        let stored = storage.last_conversion().await;
        assert_eq!(stored.conversions, Some(conversions));
        assert_eq!(
            stored.base,
            Some(ConversionBase {
                currency: "USD".to_string(),
                amount: 100.0
            })
        );
    }
}
