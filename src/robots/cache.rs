//! Robots.txt caching implementation
//!
//! Policies are fetched once per origin and kept for the crawl's lifetime.

use crate::robots::{fetch_policy, RobotsPolicy};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Longest crawl delay honoured, whatever robots.txt asks for
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Per-origin robots.txt policies for one crawl
#[derive(Debug, Default)]
pub struct RobotsCache {
    policies: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a URL: `scheme://host[:port]`
    pub fn origin_key(url: &Url) -> String {
        url.origin().ascii_serialization()
    }

    /// Returns the cached policy for the URL's origin, if any
    pub fn get(&self, url: &Url) -> Option<&RobotsPolicy> {
        self.policies.get(&Self::origin_key(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.policies.contains_key(&Self::origin_key(url))
    }

    /// Stores a policy for the URL's origin, replacing any previous one
    pub fn insert(&mut self, url: &Url, policy: RobotsPolicy) {
        self.policies.insert(Self::origin_key(url), policy);
    }

    /// Returns the policy for the URL's origin, fetching it on first use
    pub async fn get_or_fetch(&mut self, client: &Client, url: &Url) -> &RobotsPolicy {
        let key = Self::origin_key(url);
        if !self.policies.contains_key(&key) {
            tracing::debug!("No cached robots.txt for {}, fetching", key);
            let policy = fetch_policy(client, url).await;
            self.policies.insert(key.clone(), policy);
        }
        // Inserted above when missing
        self.policies
            .entry(key)
            .or_insert_with(RobotsPolicy::allow_all)
    }

    /// Checks a URL against the cached policy of its origin
    ///
    /// Origins without a cached policy are allowed.
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        self.get(url)
            .map_or(true, |policy| policy.is_allowed(url.as_str(), user_agent))
    }

    /// Crawl delay declared for the URL's origin, capped at [`MAX_CRAWL_DELAY`]
    pub fn crawl_delay(&self, url: &Url, user_agent: &str) -> Option<Duration> {
        let seconds = self.get(url)?.crawl_delay(user_agent)?;
        match Duration::try_from_secs_f64(seconds) {
            Ok(delay) if delay <= MAX_CRAWL_DELAY => Some(delay),
            _ => {
                tracing::warn!(
                    "Crawl-delay of {}s for {} is too long, using {:?}",
                    seconds,
                    Self::origin_key(url),
                    MAX_CRAWL_DELAY
                );
                Some(MAX_CRAWL_DELAY)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
