//! URL handling module for Sumi-Audit
//!
//! This module provides URL normalization, page-type classification,
//! frontier priority scoring, same-site checks and the static deny-list.

mod domain;
mod filter;
mod normalize;

use serde::Serialize;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{bare_host, domain_token, extract_domain, same_site};
pub use filter::{deny_reason, is_crawlable};
pub use normalize::{normalize_url, NormalizedUrl, UrlPolicy};

/// Base priority of a frontier entry
const BASE_PRIORITY: i32 = 100;

/// Penalty per level of crawl depth
const DEPTH_PENALTY: i32 = 10;

/// Bonus for URLs listed in the site's sitemap
const SITEMAP_BONUS: i32 = 20;

/// Penalty for URLs that cannot be parsed
const UNPARSABLE_PENALTY: i32 = 50;

/// Page type derived from the URL path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    Category,
    Product,
    Article,
    Other,
}

impl PageType {
    /// Priority bonus awarded to this page type
    pub fn priority_bonus(&self) -> i32 {
        match self {
            Self::Home => 50,
            Self::Category => 15,
            Self::Product => 5,
            Self::Article => 5,
            Self::Other => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Category => "category",
            Self::Product => "product",
            Self::Article => "article",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const PRODUCT_SEGMENTS: &[&str] = &["product", "products", "p", "item", "items", "dp"];
const CATEGORY_SEGMENTS: &[&str] = &[
    "category",
    "categories",
    "collections",
    "collection",
    "c",
    "shop",
    "tag",
    "tags",
    "department",
];
const ARTICLE_SEGMENTS: &[&str] = &[
    "blog", "article", "articles", "news", "post", "posts", "stories", "guides",
];

/// Classifies a URL into a page type
///
/// Checked in order: home (root path or a bare index document), product,
/// category, article (including dated `/yyyy/mm/` paths), other.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_audit::url::{classify_page, PageType};
///
/// let url = Url::parse("https://example.com/products/red-shoes").unwrap();
/// assert_eq!(classify_page(&url), PageType::Product);
/// ```
pub fn classify_page(url: &Url) -> PageType {
    let path = url.path().to_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty()
        || (segments.len() == 1 && matches!(segments[0], "index.html" | "index.htm" | "index.php"))
    {
        return PageType::Home;
    }

    if segments.iter().any(|s| PRODUCT_SEGMENTS.contains(s)) {
        return PageType::Product;
    }

    if segments.iter().any(|s| CATEGORY_SEGMENTS.contains(s)) {
        return PageType::Category;
    }

    if segments.iter().any(|s| ARTICLE_SEGMENTS.contains(s)) || has_date_segments(&segments) {
        return PageType::Article;
    }

    PageType::Other
}

/// Detects `/2024/05/...` style publication paths
fn has_date_segments(segments: &[&str]) -> bool {
    segments.windows(2).any(|pair| {
        let year_like = pair[0].len() == 4 && pair[0].chars().all(|c| c.is_ascii_digit());
        let month_like = pair[1].len() <= 2 && pair[1].chars().all(|c| c.is_ascii_digit());
        year_like && month_like
    })
}

/// Computes the dispatch priority of a URL (higher is dispatched first)
///
/// Base 100, -10 per depth level, +20 when sourced from a sitemap, plus the
/// page-type bonus (+50 home, +15 category, +5 product, +5 article). A URL
/// that fails to parse takes -50 instead of a page-type bonus. Never below 0.
///
/// # Examples
///
/// ```
/// use sumi_audit::url::priority;
///
/// assert_eq!(priority("https://example.com/", 0, false), 150);
/// assert_eq!(priority("https://example.com/blog/hello", 2, true), 105);
/// ```
pub fn priority(url: &str, depth: u32, from_sitemap: bool) -> u32 {
    let depth_penalty = DEPTH_PENALTY.saturating_mul(depth.min(i32::MAX as u32) as i32);
    let mut score = BASE_PRIORITY.saturating_sub(depth_penalty);

    if from_sitemap {
        score += SITEMAP_BONUS;
    }

    match Url::parse(url) {
        Ok(parsed) => score += classify_page(&parsed).priority_bonus(),
        Err(_) => score -= UNPARSABLE_PENALTY,
    }

    score.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_home() {
        assert_eq!(classify_page(&url("https://example.com/")), PageType::Home);
        assert_eq!(
            classify_page(&url("https://example.com/index.html")),
            PageType::Home
        );
    }

    #[test]
    fn test_classify_product() {
        assert_eq!(
            classify_page(&url("https://example.com/products/blue-mug")),
            PageType::Product
        );
        assert_eq!(
            classify_page(&url("https://example.com/shop/item/42")),
            PageType::Product
        );
    }

    #[test]
    fn test_classify_category() {
        assert_eq!(
            classify_page(&url("https://example.com/category/kitchen")),
            PageType::Category
        );
        assert_eq!(
            classify_page(&url("https://example.com/collections/summer")),
            PageType::Category
        );
    }

    #[test]
    fn test_classify_article() {
        assert_eq!(
            classify_page(&url("https://example.com/blog/launch-notes")),
            PageType::Article
        );
        assert_eq!(
            classify_page(&url("https://example.com/2024/05/some-story")),
            PageType::Article
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(
            classify_page(&url("https://example.com/about")),
            PageType::Other
        );
        assert_eq!(
            classify_page(&url("https://example.com/contact-us")),
            PageType::Other
        );
    }

    #[test]
    fn test_priority_home_at_root() {
        assert_eq!(priority("https://example.com/", 0, false), 150);
        assert_eq!(priority("https://example.com/", 0, true), 170);
    }

    #[test]
    fn test_priority_depth_penalty() {
        assert_eq!(priority("https://example.com/about", 1, false), 90);
        assert_eq!(priority("https://example.com/about", 3, false), 70);
    }

    #[test]
    fn test_priority_type_bonus() {
        assert_eq!(priority("https://example.com/category/a", 1, false), 105);
        assert_eq!(priority("https://example.com/products/a", 1, false), 95);
        assert_eq!(priority("https://example.com/blog/a", 1, false), 95);
    }

    #[test]
    fn test_priority_unparsable_penalty() {
        assert_eq!(priority("not a url", 0, false), 50);
        assert_eq!(priority("not a url", 2, true), 50);
    }

    #[test]
    fn test_priority_floor_at_zero() {
        assert_eq!(priority("not a url", 9, false), 0);
        assert_eq!(priority("https://example.com/x", 50, false), 0);
        assert_eq!(priority("https://example.com/x", u32::MAX, false), 0);
    }

    #[test]
    fn test_sitemap_entry_beats_discovered_link() {
        // A sitemap seed outranks any non-home link found one level down
        let sitemap_seed = priority("https://example.com/about", 0, true);
        let discovered = priority("https://example.com/category/x", 1, false);
        assert!(sitemap_seed > discovered);
    }
}
