//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for discovery and source queries:
//! - Building HTTP clients with an identifying user agent string
//! - GET requests for pages, classified into a `FetchResult`
//! - HEAD probes used by website resolution

use crate::config::HttpConfig;
use crate::sources::SourceError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        status_code: u16,
        content_type: String,
        body: String,
    },

    /// Response is not a page (an image, a PDF, an archive)
    ContentMismatch { content_type: String },

    /// Non-success HTTP status
    HttpError { status_code: u16 },

    /// Network error (connection refused, timeout, etc.)
    NetworkError { error: String },
}

impl FetchResult {
    /// The final URL and body of a successful fetch
    pub fn into_page(self) -> Option<(Url, String)> {
        match self {
            Self::Success {
                final_url, body, ..
            } => Some((final_url, body)),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::ContentMismatch { content_type } => format!("not a page ({})", content_type),
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error } => error.clone(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use fleet_sounding::config::HttpConfig;
/// use fleet_sounding::discovery::build_http_client;
///
/// let config = HttpConfig {
///     crawler_name: "FleetSounding".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "ops@example.com".to_string(),
///     request_timeout_secs: 30,
///     probe_timeout_secs: 10,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Binary content types that are never parsed as pages
fn is_binary_content(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    (ct.starts_with("image/")
        || ct.starts_with("audio/")
        || ct.starts_with("video/")
        || ct.starts_with("application/"))
        && !ct.contains("html")
        && !ct.contains("xml")
}

/// Fetches a page with GET and classifies the outcome
pub async fn fetch_page(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else if e.is_redirect() {
                "Too many redirects".to_string()
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if is_binary_content(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}

/// Fetches a source query page, mapping every failure to a `SourceError`
pub async fn fetch_source_page(client: &Client, url: &Url) -> Result<String, SourceError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| SourceError::Body(e.to_string()))
}

/// Checks whether a URL answers
///
/// Implemented over HTTP by `HttpProbe`; tests substitute a fake.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// True only for an HTTP 200 after following redirects
    async fn probe(&self, url: &Url) -> bool;
}

/// HEAD-request prober with a per-probe timeout
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn probe(&self, url: &Url) -> bool {
        let request = self.client.head(url.clone()).timeout(self.timeout);
        match request.send().await {
            Ok(response) => {
                tracing::debug!("Probe {} -> {}", url, response.status());
                response.status() == StatusCode::OK
            }
            Err(e) => {
                tracing::debug!("Probe {} failed: {}", url, e);
                false
            }
        }
    }
}
