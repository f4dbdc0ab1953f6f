//! API client for the advocacy content service.
//!
//! `ApiClient` sends JSON requests relative to a configurable base URL and
//! retries transient failures with exponential backoff.

use std::time::Duration;

use anyhow::Result;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::NetworkError;

// ============================================================================
// Constants
// ============================================================================

/// Placeholder API host until the content service is live.
pub const DEFAULT_BASE_URL: &str = "https://api.disabilityadvocacy.app";

/// Per-attempt HTTP timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Attempts per request, including the first one.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Backoff unit. The delay after attempt `n` is `base * 2^n`: 2s, 4s, 8s...
const BACKOFF_BASE_SECS: u64 = 1;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    fn as_method(&self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_method())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retry_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_retry_attempts: MAX_RETRY_ATTEMPTS,
            backoff_base: Duration::from_secs(BACKOFF_BASE_SECS),
        }
    }
}

/// Delay before the attempt that follows attempt number `attempt` (1-based).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// JSON API client with retry.
///
/// Settings sit behind an async lock and are snapshotted at the start of each
/// request, so a setter never changes an in-flight retry loop.
pub struct ApiClient {
    client: Client,
    settings: RwLock<ClientSettings>,
}

impl ApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            settings: RwLock::new(settings),
        })
    }

    // ===== Configuration =====

    pub async fn settings(&self) -> ClientSettings {
        self.settings.read().await.clone()
    }

    pub async fn set_base_url(&self, base_url: impl Into<String>) {
        self.settings.write().await.base_url = base_url.into();
    }

    pub async fn set_timeout(&self, timeout: Duration) {
        self.settings.write().await.timeout = timeout;
    }

    pub async fn set_max_retry_attempts(&self, attempts: u32) {
        self.settings.write().await.max_retry_attempts = attempts;
    }

    pub async fn set_backoff_base(&self, base: Duration) {
        self.settings.write().await.backoff_base = base;
    }

    // ===== Requests =====

    /// Send `method endpoint` and decode the JSON response as `T`.
    ///
    /// Retries up to `max_retry_attempts` times in total. Client errors and
    /// malformed requests fail immediately.
    pub async fn request<T, B>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let settings = self.settings().await;
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < settings.max_retry_attempts {
            match self
                .perform_request(&settings, endpoint, method, body, headers)
                .await
            {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;
                    if !e.is_retryable() {
                        debug!(endpoint = endpoint, error = %e, "Request failed, not retrying");
                        return Err(e);
                    }
                    if attempts < settings.max_retry_attempts {
                        let delay = backoff_delay(settings.backoff_base, attempts);
                        warn!(
                            endpoint = endpoint,
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Request failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(NetworkError::Unknown))
    }

    fn build_url(settings: &ClientSettings, endpoint: &str) -> std::result::Result<Url, NetworkError> {
        let raw = format!("{}{}", settings.base_url, endpoint);
        Url::parse(&raw).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    fn build_headers(extra: &[(&str, &str)]) -> std::result::Result<HeaderMap, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(header::ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| NetworkError::EncodingFailed(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| NetworkError::EncodingFailed(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    async fn perform_request<T, B>(
        &self,
        settings: &ClientSettings,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = Self::build_url(settings, endpoint)?;
        let mut request = self
            .client
            .request(method.as_method(), url)
            .timeout(settings.timeout)
            .headers(Self::build_headers(headers)?);

        if let Some(body) = body {
            let encoded = serde_json::to_vec(body)
                .map_err(|e| NetworkError::EncodingFailed(e.to_string()))?;
            request = request.body(encoded);
        }

        debug!(method = %method, endpoint = endpoint, "Sending request");
        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::InvalidResponse(e.to_string()))?;

        if !(200..=299).contains(&status) {
            return Err(NetworkError::from_status(status, &String::from_utf8_lossy(&bytes)));
        }

        // An empty success body decodes like JSON null, so `()` and `Option<T>` work.
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload).map_err(|e| NetworkError::DecodingFailed(e.to_string()))
    }

    // ===== Convenience Methods =====

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError> {
        self.request::<T, ()>(endpoint, HttpMethod::Get, None, headers).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError> {
        self.request(endpoint, HttpMethod::Post, body, headers).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError> {
        self.request(endpoint, HttpMethod::Put, body, headers).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<T, NetworkError> {
        self.request::<T, ()>(endpoint, HttpMethod::Delete, None, headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        title: String,
    }

    fn fast_settings(base_url: String) -> ClientSettings {
        ClientSettings {
            base_url,
            timeout: Duration::from_secs(5),
            max_retry_attempts: 3,
            backoff_base: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));
    }

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.max_retry_attempts, 3);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn test_get_decodes_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/items")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .match_header("x-client", "advocate")
            .with_status(200)
            .with_body(r#"[{"id":1,"title":"A"}]"#)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        let items: Vec<Item> = client.get("/items", &[("x-client", "advocate")]).await.unwrap();
        assert_eq!(items, vec![Item { id: 1, title: "A".to_string() }]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/items")
            .match_body(Matcher::Json(json!({"title": "New"})))
            .with_status(201)
            .with_body(r#"{"id":9,"title":"New"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        let created: Item = client
            .post("/items", Some(&json!({"title": "New"})), &[])
            .await
            .unwrap();
        assert_eq!(created.id, 9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_retried_until_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        let err = client.get::<Vec<Item>>("/flaky", &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::ServerError { status: 500 }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_backoff_sleeps_between_attempts_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/down")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(ClientSettings {
            backoff_base: Duration::from_millis(50),
            ..fast_settings(server.url())
        })
        .unwrap();

        let started = std::time::Instant::now();
        assert!(client.get::<Vec<Item>>("/down", &[]).await.is_err());
        let elapsed = started.elapsed();

        // 100ms after the first attempt, 200ms after the second, none after the last.
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(700), "elapsed {:?}", elapsed);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("not here")
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        let err = client.get::<Item>("/missing", &[]).await.unwrap_err();
        match err {
            NetworkError::ClientError { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not here");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_limit_follows_setter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/items/1")
            .with_status(503)
            .expect(5)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings("http://unused.invalid".to_string())).unwrap();
        client.set_base_url(server.url()).await;
        client.set_max_retry_attempts(5).await;

        let err = client.delete::<()>("/items/1", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_decoding_failure_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/garbled")
            .with_status(200)
            .with_body("<html>")
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        let err = client.get::<Item>("/garbled", &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::DecodingFailed(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_success_body_decodes_unit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/items/1")
            .with_status(204)
            .create_async()
            .await;

        let client = ApiClient::new(fast_settings(server.url())).unwrap();
        client
            .put::<(), _>("/items/1", Some(&json!({"title": "B"})), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_retry() {
        let client = ApiClient::new(fast_settings("not a url".to_string())).unwrap();
        let err = client.get::<Item>("/items", &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_zero_attempts_reports_unknown() {
        let client = ApiClient::new(fast_settings("http://localhost".to_string())).unwrap();
        client.set_max_retry_attempts(0).await;
        let err = client.get::<Item>("/items", &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::Unknown));
    }
}
