use crate::core::config::SourceConfig;
use crate::core::rates::{ExchangeRateTable, FALLBACK_BTC_PER_USD, RateEnrichment};
use crate::providers::util::{build_client, get_json};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

const CRYPTO_CODE: &str = "BTC";

/// BTC quotes from a Coinbase-style exchange-rates endpoint.
pub struct CoinbaseCryptoSource {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CoinbaseResponse {
    data: CoinbaseData,
}

#[derive(Debug, Deserialize)]
struct CoinbaseData {
    rates: HashMap<String, String>,
}

impl CoinbaseCryptoSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(CoinbaseCryptoSource {
            base_url: config.base_url.clone(),
            client: build_client(config.timeout())?,
        })
    }
}

#[async_trait]
impl RateEnrichment for CoinbaseCryptoSource {
    fn name(&self) -> &str {
        "coinbase"
    }

    #[instrument(name = "CryptoRateFetch", skip(self, table), fields(base = %table.base))]
    async fn fetch_extra(&self, table: &ExchangeRateTable) -> Result<HashMap<String, f64>> {
        let subject = format!("crypto rate: {}", CRYPTO_CODE);
        let response: CoinbaseResponse = get_json(
            &self.client,
            &self.base_url,
            &[("currency", CRYPTO_CODE)],
            &subject,
        )
        .await?;

        // The endpoint quotes 1 BTC in the table's base; invert to 1 base in BTC.
        let quoted = response
            .data
            .rates
            .get(&table.base)
            .ok_or_else(|| anyhow!("No {} quote in {} for {}", table.base, subject, CRYPTO_CODE))?;
        let price: f64 = quoted
            .parse()
            .with_context(|| format!("Invalid {} price: {}", CRYPTO_CODE, quoted))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(anyhow!("Invalid {} price: {}", CRYPTO_CODE, quoted));
        }

        debug!(price, "Received crypto quote");
        Ok(HashMap::from([(CRYPTO_CODE.to_string(), 1.0 / price)]))
    }

    fn fallback(&self, table: &ExchangeRateTable) -> HashMap<String, f64> {
        table.rebase_usd_quoted(&[(CRYPTO_CODE, FALLBACK_BTC_PER_USD)])
    }
}
