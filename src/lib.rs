//! Sumi-Audit: a polite site crawler and SEO auditor
//!
//! This crate crawls a single website under explicit page and depth budgets,
//! respecting robots.txt, extracts a structured record per page, and turns the
//! resulting corpus into a site-wide audit, optimized HTML, sitemap artifacts
//! and a deployable bundle.

pub mod audit;
pub mod config;
pub mod crawler;
pub mod optimize;
pub mod output;
pub mod page;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Audit operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Robots.txt error: {0}")]
    Robots(String),

    #[error("Sitemap fetch failed for {url}: {message}")]
    SitemapFetch { url: String, message: String },

    #[error("Sitemap parse error: {0}")]
    SitemapParse(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Audit operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{audit, AuditResult};
pub use config::{Config, CrawlTask};
pub use crawler::{run, CrawlHandle, CrawlOutcome, CrawlResult};
pub use page::{Issue, PageRecord, Severity};
pub use state::CrawlState;
pub use url::{classify_page, normalize_url, priority, NormalizedUrl, PageType};
