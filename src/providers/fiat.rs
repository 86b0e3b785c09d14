use crate::core::config::SourceConfig;
use crate::core::rates::{ExchangeRateTable, RateSource};
use crate::providers::util::{build_client, get_json};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// How the base currency is passed to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseParam {
    /// `GET {base_url}/{base}`
    PathSegment,
    /// `GET {base_url}?base={base}`
    Query,
}

/// A fiat rate endpoint answering with `{ base, date, rates }`.
pub struct FiatRateSource {
    name: String,
    base_url: String,
    base_param: BaseParam,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    #[serde(default)]
    date: Option<String>,
    rates: HashMap<String, f64>,
}

impl FiatRateSource {
    pub fn new(name: &str, base_url: &str, base_param: BaseParam, timeout: Duration) -> Result<Self> {
        Ok(FiatRateSource {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            base_param,
            client: build_client(timeout)?,
        })
    }

    /// The primary source, e.g. exchangerate-api's `/v4/latest/{base}`.
    pub fn primary(config: &SourceConfig) -> Result<Self> {
        Self::new(
            "exchangerate-api",
            &config.base_url,
            BaseParam::PathSegment,
            config.timeout(),
        )
    }

    /// The alternate source, e.g. fixer's `/latest?base={base}`.
    pub fn fallback(config: &SourceConfig) -> Result<Self> {
        Self::new("fixer", &config.base_url, BaseParam::Query, config.timeout())
    }
}

#[async_trait]
impl RateSource for FiatRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "FiatRateFetch", skip(self), fields(source = %self.name, base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<ExchangeRateTable> {
        let subject = format!("{} rates for base: {}", self.name, base);
        let response: RatesResponse = match self.base_param {
            BaseParam::PathSegment => {
                let url = format!("{}/{}", self.base_url, base);
                get_json(&self.client, &url, &[], &subject).await?
            }
            BaseParam::Query => {
                get_json(&self.client, &self.base_url, &[("base", base)], &subject).await?
            }
        };

        if response.rates.is_empty() {
            return Err(anyhow!("No rate data found for {}", subject));
        }

        debug!(count = response.rates.len(), "Received rates");
        let date = response
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive().to_string());
        Ok(ExchangeRateTable::new(&response.base, &date, response.rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RATES_BODY: &str = r#"{
        "base": "USD",
        "date": "2024-03-01",
        "time_last_updated": 1709251201,
        "rates": { "USD": 1, "EUR": 0.92, "INR": 82.9 }
    }"#;

    fn source_config(uri: &str) -> SourceConfig {
        SourceConfig {
            base_url: uri.to_string(),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_primary_uses_path_segment() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RATES_BODY))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source =
            FiatRateSource::primary(&source_config(&format!("{}/v4/latest/", mock_server.uri())))
                .unwrap();
        let table = source.fetch_rates("USD").await.unwrap();

        assert_eq!(source.name(), "exchangerate-api");
        assert_eq!(table.base, "USD");
        assert_eq!(table.date, "2024-03-01");
        assert_eq!(table.rate("EUR"), Some(0.92));
        assert_eq!(table.rate("INR"), Some(82.9));
    }

    #[tokio::test]
    async fn test_fallback_uses_query_param() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"base": "EUR", "date": "2024-03-01", "rates": {"USD": 1.08}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source =
            FiatRateSource::fallback(&source_config(&format!("{}/latest", mock_server.uri())))
                .unwrap();
        let table = source.fetch_rates("EUR").await.unwrap();

        assert_eq!(table.base, "EUR");
        assert_eq!(table.rate("USD"), Some(1.08));
        assert_eq!(table.rate("EUR"), Some(1.0));
    }

    #[tokio::test]
    async fn test_missing_date_defaults_to_today() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"base": "USD", "rates": {"EUR": 0.9}}"#),
            )
            .mount(&mock_server)
            .await;

        let source = FiatRateSource::primary(&source_config(&mock_server.uri())).unwrap();
        let table = source.fetch_rates("USD").await.unwrap();
        assert_eq!(table.date, chrono::Utc::now().date_naive().to_string());
    }

    #[tokio::test]
    async fn test_empty_rates_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"base": "USD", "date": "2024-03-01", "rates": {}}"#),
            )
            .mount(&mock_server)
            .await;

        let source = FiatRateSource::primary(&source_config(&mock_server.uri())).unwrap();
        let result = source.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for exchangerate-api rates for base: USD"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"success": false, "error": {"code": 101}}"#),
            )
            .mount(&mock_server)
            .await;

        let source = FiatRateSource::fallback(&source_config(&mock_server.uri())).unwrap();
        let result = source.fetch_rates("USD").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for fixer rates for base: USD")
        );
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let source = FiatRateSource::primary(&source_config(&mock_server.uri())).unwrap();
        let result = source.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for exchangerate-api rates for base: USD"
        );
    }
}
