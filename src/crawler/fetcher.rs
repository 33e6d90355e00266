//! Fetch capability and its plain HTTP implementation
//!
//! This module handles:
//! - The one-method `Fetcher` interface the frontier and harvester depend on
//! - Building the HTTP client from the configuration
//! - Bounded retries for transient failures
//! - Error classification

use crate::config::Config;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value (empty if absent)
    pub content_type: String,
    /// Raw response body
    pub body: Vec<u8>,
}

impl Fetched {
    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true if the response is markup links can be extracted from
    ///
    /// A missing content-type is treated as HTML.
    pub fn is_html(&self) -> bool {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
    }
}

/// Failure to fetch a single URL
///
/// Never fatal to a run: the frontier treats the node as a dead end and the
/// harvester counts the item as failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Browser failed to render {url}: {message}")]
    Browser { url: String, message: String },
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 429 | yes |
    /// | HTTP 5xx | yes |
    /// | Other HTTP status | no |
    /// | Body / protocol error | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::Http { .. } | Self::Browser { .. } => false,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Http {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// Capability that turns a URL into content
///
/// Selected once at startup; the traversal and harvest code only see this
/// interface.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError>;
}

/// Retry behaviour for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Pause before each extra attempt
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) so the fetched page's final URL can
/// be used as the base for its relative links.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled");
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Builds the client and retry policy from the configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::from_config(config),
        ))
    }

    async fn fetch_once(&self, url: &Url) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(Fetched {
            final_url,
            status: status.as_u16(),
            content_type,
            body: body.to_vec(),
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} after transient failure ({}/{}): {}",
                        url,
                        attempt,
                        self.retry.max_retries,
                        e
                    );
                    if !self.retry.backoff.is_zero() {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_retries: u32) -> HttpFetcher {
        let config = Config::with_start_url("http://127.0.0.1/");
        HttpFetcher::new(
            build_http_client(&config).unwrap(),
            RetryPolicy {
                max_retries,
                backoff: Duration::ZERO,
            },
        )
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let config = Config::with_start_url("https://example.com/");
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_is_html() {
        let mut fetched = Fetched {
            final_url: Url::parse("https://example.com/").unwrap(),
            status: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            body: Vec::new(),
        };
        assert!(fetched.is_html());
        fetched.content_type = String::new();
        assert!(fetched.is_html());
        fetched.content_type = "application/pdf".to_string();
        assert!(!fetched.is_html());
    }

    #[test]
    fn test_transient_classification() {
        let status = |status| FetchError::Status {
            url: "u".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(FetchError::Timeout { url: "u".to_string() }.is_transient());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>hi</html>"),
            )
            .mount(&server)
            .await;

        let fetched = fetcher(0).fetch(&url(&server, "/page")).await.unwrap();
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.text(), "<html>hi</html>");
        assert!(fetched.is_html());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher(3).fetch(&url(&server, "/missing")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = fetcher(1).fetch(&url(&server, "/flaky")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetched = fetcher(0).fetch(&url(&server, "/old")).await.unwrap();
        assert_eq!(fetched.final_url.path(), "/new/");
    }
}
