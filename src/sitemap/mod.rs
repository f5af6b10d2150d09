//! Sitemap discovery and generation
//!
//! Discovery reads a site's published sitemaps to seed the frontier.
//! Generation turns the crawl corpus into `sitemap.xml` (split with an index
//! when large), `sitemap.json` and a browsable `sitemap.html`, all from the
//! same list of [`SitemapEntry`] values.

mod extract;
mod generate;

pub use extract::{extract_seed_urls, parse_sitemap, ParsedSitemap, SitemapUrl};
pub use generate::{
    build_sitemap, build_sitemap_html, build_sitemap_index, build_sitemap_json,
    entries_from_corpus, split_sitemap, SitemapFiles,
};

use serde::Serialize;
use std::fmt;

/// Protocol limit of URLs in a single sitemap file
pub const MAX_URLS_PER_SITEMAP: usize = 50_000;

/// XML namespace of sitemaps and sitemap indexes
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Expected change frequency of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One exported URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFreq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            changefreq: None,
            priority: None,
        }
    }
}
