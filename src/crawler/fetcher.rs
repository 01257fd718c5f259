//! HTTP transport
//!
//! This module handles every HTTP request the scraper makes:
//! - Building the shared HTTP client with the configured user agent and timeouts
//! - The `Transport` seam, so components can be tested against fakes
//! - Error classification (timeouts vs other transport failures)

use crate::config::{ScraperConfig, UserAgentConfig};
use crate::ScraperError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub final_url: Url,

    /// Raw response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for HTTP 404
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Issues GET requests on behalf of the crawler and downloader
///
/// A non-2xx status is not an error at this level: the response is returned
/// and the caller decides what the status means. Only failures to obtain a
/// response at all (DNS, connect, timeout, body read) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, ScraperError>;
}

/// `Transport` backed by a shared `reqwest::Client`
///
/// The client owns the connection pool and default headers for the whole run.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        scraper: &ScraperConfig,
    ) -> Result<Self, ScraperError> {
        Ok(Self::new(build_http_client(user_agent, scraper)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, ScraperError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?
            .to_vec();

        Ok(HttpResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request made through the client is bounded by the configured total
/// and connect timeouts.
///
/// # Example
///
/// ```no_run
/// use normativa_scraper::config::{ScraperConfig, UserAgentConfig};
/// use normativa_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    scraper: &ScraperConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.value.as_str())
        .timeout(scraper.request_timeout())
        .connect_timeout(scraper.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest error to the scraper's error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> ScraperError {
    if error.is_timeout() {
        ScraperError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        ScraperError::Transport {
            url: url.to_string(),
            message: format!("Connection failed: {}", error),
        }
    } else {
        ScraperError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
