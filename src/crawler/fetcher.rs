//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Retry logic for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success(FetchedPage),

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-2xx response after redirects
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, ...)
    NetworkError {
        /// Error description
        error: String,
        timed_out: bool,
    },
}

impl FetchResult {
    /// Whether another attempt may succeed
    ///
    /// Content-type mismatches are permanent; HTTP and network errors are
    /// retried within the task's budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpError { .. } | Self::NetworkError { .. })
    }

    /// Short description for logs and failure records
    pub fn describe(&self) -> String {
        match self {
            Self::Success(page) => format!("HTTP {}", page.status_code),
            Self::ContentMismatch { content_type } => {
                format!("Expected HTML, got {}", content_type)
            }
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error, timed_out } => {
                if *timed_out {
                    "Request timeout".to_string()
                } else {
                    error.clone()
                }
            }
        }
    }
}

/// A successfully fetched HTML document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Page body content
    pub body: String,
    /// Time from request to complete body
    pub latency: Duration,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_audit::config::UserAgentConfig;
/// use sumi_audit::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiAudit".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for HTML content types
///
/// A missing Content-Type is accepted; plenty of small servers omit it.
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

/// Fetches a URL once
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let started = Instant::now();

    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    // Check Content-Type
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            latency: started.elapsed(),
        }),
        Err(e) => classify_error(e),
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
            timed_out: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}

/// Fetches a URL, retrying transient failures
///
/// Makes at most `1 + retry_attempts` requests, sleeping `retry_delay`
/// between them. Returns the last result and the number of requests made.
pub async fn fetch_with_retries(
    client: &Client,
    url: &str,
    retry_attempts: u32,
    retry_delay: Duration,
) -> (FetchResult, u32) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let result = fetch_url(client, url).await;

        if !result.is_retryable() || attempts > retry_attempts {
            return (result, attempts);
        }

        tracing::debug!(
            "Attempt {} for {} failed ({}), retrying",
            attempts,
            url,
            result.describe()
        );
        if !retry_delay.is_zero() {
            tokio::time::sleep(retry_delay).await;
        }
    }
}
