//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! A robots.txt that cannot be fetched yields an allow-all policy: a missing
//! file is the common case and must not stop a crawl.

mod cache;
mod parser;

pub use cache::{RobotsCache, MAX_CRAWL_DELAY};
pub use parser::{product_token, RobotsPolicy};

use crate::SumiError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Upper bound for the robots.txt request, independent of the page timeout
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and parses robots.txt for the origin of `base`
///
/// Any failure (network error, timeout, non-200 status, unreadable body)
/// produces [`RobotsPolicy::allow_all`] and a warning.
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `base` - Any URL on the site; only its scheme, host and port are used
pub async fn fetch_policy(client: &Client, base: &Url) -> RobotsPolicy {
    match try_fetch_policy(client, base).await {
        Ok(policy) => policy,
        Err(e) => {
            tracing::warn!("{}; allowing all paths", e);
            RobotsPolicy::allow_all()
        }
    }
}

/// Fetches robots.txt, reporting why it could not be used
pub async fn try_fetch_policy(client: &Client, base: &Url) -> Result<RobotsPolicy, SumiError> {
    let robots_url = base
        .join("/robots.txt")
        .map_err(|e| SumiError::Robots(format!("cannot build robots.txt URL: {}", e)))?;

    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let response = client
        .get(robots_url.as_str())
        .timeout(ROBOTS_TIMEOUT)
        .send()
        .await
        .map_err(|e| SumiError::Robots(format!("robots.txt fetch failed for {}: {}", robots_url, e)))?;

    if response.status() != StatusCode::OK {
        return Err(SumiError::Robots(format!(
            "robots.txt at {} returned HTTP {}",
            robots_url,
            response.status().as_u16()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SumiError::Robots(format!("robots.txt body unreadable: {}", e)))?;

    Ok(RobotsPolicy::from_content(&body))
}

/// Checks if a URL is allowed by robots.txt
///
/// # Returns
///
/// * `true` - If the URL is allowed
/// * `false` - If the URL is disallowed
pub fn is_allowed(policy: &RobotsPolicy, url: &str, user_agent: &str) -> bool {
    policy.is_allowed(url, user_agent)
}
