use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Sumi-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub url: UrlConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub publish: Option<PublishTarget>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum number of URLs dispatched in one crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum depth to crawl from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Whether links to other domains are admitted to the frontier
    #[serde(rename = "follow-external-links", default)]
    pub follow_external_links: bool,

    /// Minimum time between dispatches (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Maximum number of concurrent page fetches
    #[serde(
        rename = "max-concurrent-requests",
        default = "default_max_concurrent_requests"
    )]
    pub max_concurrent_requests: u32,

    /// Retries per URL after the first failed attempt
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Whether sitemap.xml is consulted for seed URLs
    #[serde(rename = "use-sitemap", default = "default_true")]
    pub use_sitemap: bool,

    /// Maximum number of child sitemaps fetched from sitemap indexes
    #[serde(rename = "max-child-sitemaps", default = "default_max_child_sitemaps")]
    pub max_child_sitemaps: u32,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the identifying user agent string
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// URL normalization policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlConfig {
    /// Store `www.host` URLs under the bare host
    #[serde(rename = "strip-www", default)]
    pub strip_www: bool,

    /// Tracking parameters removed in addition to the built-in list
    #[serde(rename = "tracking-params", default)]
    pub tracking_params: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives every artifact of a run
    pub directory: String,

    /// Maximum URLs per sitemap file before splitting
    #[serde(rename = "sitemap-chunk-size", default = "default_sitemap_chunk_size")]
    pub sitemap_chunk_size: usize,
}

/// Remote host the bundle can be published to
///
/// Credentials are passed through to the transport and never logged.
#[derive(Clone, Deserialize)]
pub struct PublishTarget {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl fmt::Debug for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("path", &self.path)
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Immutable configuration of a single crawl run
///
/// Built once per invocation from `[crawler]` and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub seed_url: String,
    pub max_pages: usize,
    pub max_depth: u32,
    pub follow_external_links: bool,
    pub request_delay: Duration,
    pub max_concurrent_requests: usize,
    pub retry_attempts: u32,
    pub request_timeout: Duration,
    pub use_sitemap: bool,
    pub max_child_sitemaps: usize,
}

impl CrawlTask {
    /// Builds the run configuration from the `[crawler]` table
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            seed_url: config.seed_url.clone(),
            max_pages: config.max_pages as usize,
            max_depth: config.max_depth,
            follow_external_links: config.follow_external_links,
            request_delay: Duration::from_millis(config.request_delay),
            max_concurrent_requests: config.max_concurrent_requests.max(1) as usize,
            retry_attempts: config.retry_attempts,
            request_timeout: Duration::from_millis(config.request_timeout),
            use_sitemap: config.use_sitemap,
            max_child_sitemaps: config.max_child_sitemaps as usize,
        }
    }

    /// A task with the default budgets for the given seed
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_pages: 100,
            max_depth: 3,
            follow_external_links: false,
            request_delay: Duration::from_millis(default_request_delay()),
            max_concurrent_requests: default_max_concurrent_requests() as usize,
            retry_attempts: default_retry_attempts(),
            request_timeout: Duration::from_millis(default_request_timeout()),
            use_sitemap: true,
            max_child_sitemaps: default_max_child_sitemaps() as usize,
        }
    }
}

fn default_request_delay() -> u64 {
    250
}

fn default_max_concurrent_requests() -> u32 {
    5
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_request_timeout() -> u64 {
    15_000
}

fn default_true() -> bool {
    true
}

fn default_max_child_sitemaps() -> u32 {
    10
}

fn default_sitemap_chunk_size() -> usize {
    crate::sitemap::MAX_URLS_PER_SITEMAP
}

fn default_scheme() -> String {
    "https".to_string()
}
