use crate::core::rates::{ExchangeRateTable, METALS_PER_USD, RateEnrichment};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Gold and silver from fixed constants; there is no live metals feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticMetalsSource;

#[async_trait]
impl RateEnrichment for StaticMetalsSource {
    fn name(&self) -> &str {
        "metals"
    }

    async fn fetch_extra(&self, table: &ExchangeRateTable) -> Result<HashMap<String, f64>> {
        Ok(self.fallback(table))
    }

    fn fallback(&self, table: &ExchangeRateTable) -> HashMap<String, f64> {
        table.rebase_usd_quoted(METALS_PER_USD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metals_are_constants() {
        let table = ExchangeRateTable::new("USD", "2024-03-01", HashMap::new());
        let extra = StaticMetalsSource.fetch_extra(&table).await.unwrap();
        assert_eq!(extra.len(), 2);
        assert_eq!(extra["XAU"], 0.0005);
        assert_eq!(extra["XAG"], 0.04);
        assert_eq!(extra, StaticMetalsSource.fallback(&table));
    }
}
