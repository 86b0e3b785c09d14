//! The user's saved currency list and last conversion, held explicitly and
//! passed to the call sites that need them.

use crate::core::conversion::Conversion;
use crate::core::storage::{ConversionBase, Storage};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Watchlist {
    codes: Vec<String>,
}

impl Watchlist {
    pub fn new(codes: Vec<String>) -> Self {
        Watchlist { codes }
    }

    pub async fn load(storage: &Storage) -> Self {
        Self::new(storage.saved_currencies().await)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// Appends `code` unless already present. Returns whether the list changed.
    pub fn add(&mut self, code: &str) -> bool {
        if self.contains(code) {
            return false;
        }
        self.codes.push(code.to_string());
        true
    }

    /// Returns whether the list changed.
    pub fn remove(&mut self, code: &str) -> bool {
        let before = self.codes.len();
        self.codes.retain(|c| c != code);
        self.codes.len() != before
    }

    pub fn reorder(&mut self, codes: Vec<String>) {
        self.codes = codes;
    }

    pub async fn save(&self, storage: &Storage) {
        storage.save_currencies(&self.codes).await;
    }
}

/// The most recent fan-out, as persisted for the next session.
#[derive(Debug, Clone, PartialEq)]
pub struct LastConversion {
    pub base: ConversionBase,
    pub conversions: HashMap<String, f64>,
}

impl LastConversion {
    pub fn new(base_currency: &str, amount: f64, conversions: &[Conversion]) -> Self {
        LastConversion {
            base: ConversionBase {
                currency: base_currency.to_string(),
                amount,
            },
            conversions: conversions
                .iter()
                .map(|c| (c.code.clone(), c.amount))
                .collect(),
        }
    }

    pub async fn save(&self, storage: &Storage) {
        storage
            .save_last_conversion(&self.conversions, &self.base.currency, self.base.amount)
            .await;
    }

    /// `None` unless both halves were stored.
    pub async fn load(storage: &Storage) -> Option<Self> {
        let stored = storage.last_conversion().await;
        match (stored.base, stored.conversions) {
            (Some(base), Some(conversions)) => Some(LastConversion { base, conversions }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn storage() -> Storage {
        Storage::new(Arc::new(MemoryStore::new()))
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let watchlist = Watchlist::load(&storage()).await;
        assert_eq!(watchlist.codes(), codes(&["USD", "INR", "AED"]).as_slice());
    }

    #[test]
    fn test_add_skips_duplicates() {
        let mut watchlist = Watchlist::new(codes(&["USD"]));
        assert!(watchlist.add("EUR"));
        assert!(!watchlist.add("USD"));
        assert_eq!(watchlist.codes(), codes(&["USD", "EUR"]).as_slice());
    }

    #[test]
    fn test_remove() {
        let mut watchlist = Watchlist::new(codes(&["USD", "EUR"]));
        assert!(watchlist.remove("USD"));
        assert!(!watchlist.remove("GBP"));
        assert_eq!(watchlist.codes(), codes(&["EUR"]).as_slice());
    }

    #[tokio::test]
    async fn test_changes_persist() {
        let storage = storage();
        let mut watchlist = Watchlist::load(&storage).await;
        watchlist.add("EUR");
        watchlist.reorder(codes(&["EUR", "AED", "USD", "INR"]));
        watchlist.save(&storage).await;

        let reloaded = Watchlist::load(&storage).await;
        assert_eq!(reloaded.codes(), codes(&["EUR", "AED", "USD", "INR"]).as_slice());
    }

    #[tokio::test]
    async fn test_last_conversion_round_trip() {
        let storage = storage();
        assert!(LastConversion::load(&storage).await.is_none());

        let conversions = vec![
            Conversion {
                code: "USD".to_string(),
                amount: 10.0,
            },
            Conversion {
                code: "EUR".to_string(),
                amount: 9.2,
            },
        ];
        let last = LastConversion::new("USD", 10.0, &conversions);
        last.save(&storage).await;

        let loaded = LastConversion::load(&storage).await.unwrap();
        assert_eq!(loaded, last);
        assert_eq!(loaded.conversions["EUR"], 9.2);
    }
}
