//! HTTP client with tracing, retries, status mapping, and domain allowlist.
//!
//! Connectors build requests with the usual `reqwest` builder methods and
//! hand them to [`HttpClient::send`] (or [`HttpClient::json`] /
//! [`HttpClient::text`]), which:
//! - enforces the domain allowlist
//! - retries transient failures with the client's [`RetryStrategy`]
//! - maps error statuses to [`FetchError`]

use std::time::Duration;

use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{FetchError, HttpError};
use crate::retry::{RetryStrategy, retry_async};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User agent string for `AdConnect`.
const USER_AGENT: &str = concat!("AdConnect/", env!("CARGO_PKG_VERSION"));

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 500;

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, retries, and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
    retry: RetryStrategy,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This only happens when the
    /// TLS backend cannot be initialized, in which case no request could
    /// succeed anyway.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {e}. \
                    This usually indicates a broken TLS/SSL configuration."
                )
            });

        Self {
            inner: client,
            allowed_domains: None,
            retry: RetryStrategy::no_retry(),
        }
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Sets the retry strategy for transient failures.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the retry strategy.
    pub fn retry(&self) -> &RetryStrategy {
        &self.retry
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Starts a request.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Starts a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    /// Starts a POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.inner.patch(url)
    }

    /// Sends a request with the client's retry strategy and maps error
    /// statuses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, FetchError> {
        self.send_with_retry(builder, &self.retry).await
    }

    /// Sends a request, retrying transient failures with `strategy`.
    pub async fn send_with_retry(
        &self,
        builder: RequestBuilder,
        strategy: &RetryStrategy,
    ) -> Result<Response, FetchError> {
        let request = builder.build()?;
        self.is_domain_allowed(request.url().as_str())?;
        let label = format!("{} {}", request.method(), request.url().path());

        retry_async(
            strategy,
            &label,
            || {
                let attempt = request.try_clone();
                async move {
                    let attempt = attempt.ok_or(HttpError::NotCloneable)?;
                    self.execute(attempt).await
                }
            },
            FetchError::is_transient,
        )
        .await
    }

    #[instrument(skip_all, fields(method = %request.method(), host = request.url().host_str().unwrap_or(""), path = %request.url().path()))]
    async fn execute(&self, request: Request) -> Result<Response, FetchError> {
        debug!("Sending request");
        let response = self.inner.execute(request).await?;
        debug!(status = %response.status(), "Response received");
        check_status(response).await
    }

    /// Sends a request and parses the JSON body.
    pub async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        let body = self.text(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            FetchError::InvalidResponse(format!("{e}: {}", truncate(&body, MAX_ERROR_BODY)))
        })
    }

    /// Sends a request and returns the body as text.
    pub async fn text(&self, builder: RequestBuilder) -> Result<String, FetchError> {
        let response = self.send(builder).await?;
        Ok(response.text().await?)
    }

    /// GETs a URL and parses the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.json(self.get(url)).await
    }

    /// POSTs a JSON body and parses the JSON response.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(self.post(url).json(body)).await
    }

    /// POSTs a form body and parses the JSON response.
    pub async fn post_form<B, T>(&self, url: &str, form: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.json(self.post(url).form(form)).await
    }

    /// Downloads a report file as text.
    pub async fn download_text(&self, url: &str) -> Result<String, FetchError> {
        self.text(self.get(url)).await
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if response.is_rate_limited() {
        return Err(FetchError::RateLimited {
            retry_after: response.retry_after_secs(),
        });
    }

    let body = response.text().await.unwrap_or_default();
    let body = truncate(&body, MAX_ERROR_BODY);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::AuthenticationFailed(format!("HTTP {status}: {body}")));
    }
    Err(FetchError::Api {
        status: status.as_u16(),
        body,
    })
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new().with_allowed_domains(vec![
            "graph.facebook.com".to_string(),
            "googleapis.com".to_string(),
        ]);

        assert!(client.is_domain_allowed("https://graph.facebook.com/v17.0/me").is_ok());
        assert!(
            client
                .is_domain_allowed("https://doubleclickbidmanager.googleapis.com/v2/queries")
                .is_ok()
        );
        assert!(client.is_domain_allowed("https://evil.com/steal").is_err());
    }

    #[test]
    fn test_no_domain_restrictions() {
        let client = HttpClient::new();
        assert!(client.is_domain_allowed("https://any.domain.com").is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::new().with_allowed_domains(vec!["example.com".to_string()]);
        assert!(client.is_domain_allowed("not-a-valid-url").is_err());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let denied = client.get_json::<serde_json::Value>(&format!("{}/denied", server.uri())).await;
        assert!(matches!(denied, Err(FetchError::AuthenticationFailed(_))));

        let limited = client.get_json::<serde_json::Value>(&format!("{}/limited", server.uri())).await;
        assert!(matches!(limited, Err(FetchError::RateLimited { retry_after: Some(7) })));

        let broken = client.get_json::<serde_json::Value>(&format!("{}/broken", server.uri())).await;
        match broken {
            Err(FetchError::Api { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "nope");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new()
            .with_retry(RetryStrategy::new(3).with_base_delay(Duration::from_millis(1)));
        let body: serde_json::Value = client
            .get_json(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_blocked_domain_never_sent() {
        let client = HttpClient::new().with_allowed_domains(vec!["example.com".to_string()]);
        let result = client.get_json::<serde_json::Value>("http://127.0.0.1:9/x").await;
        assert!(matches!(
            result,
            Err(FetchError::Request(HttpError::DomainNotAllowed(_)))
        ));
    }
}
