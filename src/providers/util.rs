use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Builds the HTTP client shared by a source. Every request made through it
/// fails once `timeout` elapses.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("denominations/1.0")
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Issues a GET and decodes the JSON body.
///
/// # Parameters
/// - `url`: Endpoint to request
/// - `query`: Query string pairs appended to the URL
/// - `subject`: What is being fetched, used in error messages
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
    subject: &str,
) -> Result<T> {
    debug!("Requesting {} from {}", subject, url);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| anyhow!("Request error: {} for {}", e, subject))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP error: {} for {}",
            response.status(),
            subject
        ));
    }

    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", subject, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: f64,
    }

    #[tokio::test]
    async fn test_get_json_success_with_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(query_param("base", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 1.5}"#))
            .mount(&mock_server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let url = format!("{}/data", mock_server.uri());
        let payload: Payload = get_json(&client, &url, &[("base", "USD")], "payload")
            .await
            .unwrap();
        assert_eq!(payload.value, 1.5);
    }

    #[tokio::test]
    async fn test_get_json_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let result: Result<Payload> = get_json(&client, &mock_server.uri(), &[], "payload").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 503 Service Unavailable for payload"
        );
    }

    #[tokio::test]
    async fn test_get_json_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"value": 1.5}"#)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = build_client(Duration::from_millis(50)).unwrap();
        let result: Result<Payload> = get_json(&client, &mock_server.uri(), &[], "payload").await;
        assert!(result.unwrap_err().to_string().starts_with("Request error"));
    }
}
