//! HTTP client with retry logic for DhakaFlix mirrors
//!
//! One pooled `reqwest::Client` shared by every search and crawl task.
//! Each call carries its own timeout, since mirrors differ wildly in speed.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{DhakaflixError, Result};

/// HTTP client wrapper with retry logic
///
/// Handles all HTTP communication with the mirrors:
/// - Per-request timeouts chosen by the caller
/// - A bounded number of retries with a fixed pause for transient errors
/// - Browser-like User-Agent (some mirrors reject bare clients)
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct DhakaflixClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl DhakaflixClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(DhakaflixError::HttpError)?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// POST a JSON body and return the response text
    ///
    /// # Errors
    /// - `HttpError` - Network errors, timeouts, or non-success status
    /// - `NotFound` - Server returned 404
    /// - `ParseError` - Server returned an empty body
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<String> {
        self.send_with_retry(url, || self.client.post(url).json(body).timeout(timeout))
            .await
    }

    /// GET a page and return its HTML
    ///
    /// # Errors
    /// Same as [`DhakaflixClient::post_json`].
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        self.send_with_retry(url, || self.client.get(url).timeout(timeout))
            .await
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<String>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            match Self::execute(url, build()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    debug!(url, attempt, error = %e, "transient failure, retrying");
                    sleep(self.retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Perform a single attempt
    async fn execute(url: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(DhakaflixError::HttpError)?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DhakaflixError::NotFound(url.to_string()));
        }

        let response = response
            .error_for_status()
            .map_err(DhakaflixError::HttpError)?;
        let body = response.text().await.map_err(DhakaflixError::HttpError)?;

        if body.trim().is_empty() {
            return Err(DhakaflixError::ParseError(format!("empty body from {}", url)));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> ClientConfig {
        ClientConfig {
            retry_backoff: Duration::from_millis(10),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_client_creation() {
        let client = DhakaflixClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let server = MockServer::start().await;
        let payload = json!({"action": "get", "search": {"href": "/S/", "pattern": "heat", "ignorecase": true}});

        Mock::given(method("POST"))
            .and(path("/S/"))
            .and(body_json(&payload))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"search\":[]}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let body = client
            .post_json(&format!("{}/S/", server.uri()), &payload, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(body, "{\"search\":[]}");
    }

    #[tokio::test]
    async fn test_retries_once_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dir/"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dir/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let body = client
            .fetch(&format!("{}/dir/", server.uri()), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let result = client
            .fetch(&format!("{}/dir/", server.uri()), Duration::from_secs(2))
            .await;
        assert!(matches!(result, Err(DhakaflixError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let result = client
            .fetch(&format!("{}/gone/", server.uri()), Duration::from_secs(2))
            .await;
        assert!(matches!(result, Err(DhakaflixError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  "))
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let result = client
            .fetch(&format!("{}/", server.uri()), Duration::from_secs(2))
            .await;
        assert!(matches!(result, Err(DhakaflixError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_per_call_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = DhakaflixClient::with_config(&fast_config()).unwrap();
        let result = client
            .fetch(&format!("{}/", server.uri()), Duration::from_millis(50))
            .await;
        match result {
            Err(DhakaflixError::HttpError(e)) => assert!(e.is_timeout()),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
