//! HTML optimizer
//!
//! Applies deterministic rewrite rules to a fetched document so the common
//! on-page defects found by the auditor are fixed:
//! - Title and meta description generated or fitted to their length windows
//! - Meta keywords, canonical link and Open Graph tags injected when absent
//! - A single H1 per page
//! - Alt text backfilled from image file names
//! - schema.org `WebPage` JSON-LD for content-bearing pages
//!
//! The rewrite is heuristic; its output is meant for human review before it
//! is published.

mod rewrite;

use crate::audit::{DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS};
use crate::page::{PageRecord, MIN_WORD_COUNT};
use crate::url::{bare_host, domain_token, PageType};
use scraper::{Html, Selector};
use url::Url;

/// Upper bound on injected keywords
pub const MAX_KEYWORDS: usize = 10;

const ELLIPSIS: &str = "...";

/// An optimized document and the rules that changed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedPage {
    pub html: String,
    /// Human-readable description of every applied change
    pub changes: Vec<String>,
}

impl OptimizedPage {
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Rewrites a page's HTML, returning the corrected document
pub fn optimize(page: &PageRecord, raw_html: &str) -> String {
    optimize_page(page, raw_html).html
}

/// Rewrites a page's HTML and reports what was changed
pub fn optimize_page(page: &PageRecord, raw_html: &str) -> OptimizedPage {
    let site = SiteNames::for_page(page);
    let mut html = raw_html.to_string();
    let mut changes = Vec::new();
    let mut head = Vec::new();

    // Title
    let title = match page.title.as_deref() {
        None => {
            let title = fit_title(&fallback_title(page, &site), &site);
            if !rewrite::replace_title(&mut html, &title) {
                head.push(format!("<title>{}</title>", html_escape::encode_text(&title)));
            }
            changes.push(format!("Added title \"{}\"", title));
            title
        }
        Some(existing) if !in_window(existing, TITLE_MIN_CHARS, TITLE_MAX_CHARS) => {
            let title = fit_title(existing, &site);
            rewrite::replace_title(&mut html, &title);
            changes.push(format!("Rewrote title to \"{}\"", title));
            title
        }
        Some(existing) => existing.trim().to_string(),
    };

    // Meta description
    let description = match page.meta.description.as_deref() {
        Some(existing)
            if in_window(existing, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS) =>
        {
            existing.trim().to_string()
        }
        existing => {
            let seed = existing
                .map(str::to_string)
                .or_else(|| first_paragraph(raw_html))
                .unwrap_or_default();
            let description = fit_description(&seed, &title, &site);
            let tag = meta_tag("description", &description);
            // A blank tag reads as no description but is still in the markup
            if rewrite::replace_meta_description(&mut html, &tag) {
                changes.push(match existing {
                    Some(_) => "Rewrote meta description".to_string(),
                    None => "Filled blank meta description".to_string(),
                });
            } else {
                head.push(tag);
                changes.push("Added meta description".to_string());
            }
            description
        }
    };

    // Keywords
    if page.meta.keywords.is_none() {
        let keywords = keywords(&title, page.h1(), &site);
        if !keywords.is_empty() {
            head.push(meta_tag("keywords", &keywords.join(", ")));
            changes.push(format!("Added {} meta keywords", keywords.len()));
        }
    }

    // Canonical
    if page.meta.canonical.is_none() {
        head.push(format!(
            "<link rel=\"canonical\" href=\"{}\">",
            html_escape::encode_double_quoted_attribute(&page.url)
        ));
        changes.push("Added canonical link".to_string());
    }

    // H1
    match page.h1().len() {
        0 => {
            let heading = format!("<h1>{}</h1>", html_escape::encode_text(&title));
            if rewrite::insert_after_body_open(&mut html, &heading) {
                changes.push("Added H1 heading".to_string());
            }
        }
        1 => {}
        _ => {
            let demoted = rewrite::demote_extra_h1(&mut html);
            if demoted > 0 {
                changes.push(format!("Demoted {} extra H1 headings to H2", demoted));
            }
        }
    }

    // Alt text
    if page.images_missing_alt() > 0 {
        let filled = rewrite::backfill_alt(&mut html, |src| alt_from_src(src, &title));
        if filled > 0 {
            changes.push(format!("Added alt text to {} images", filled));
        }
    }

    // Open Graph
    let og_type = match page.page_type {
        PageType::Article => "article",
        _ => "website",
    };
    let og_values = [
        ("og:title", title.as_str()),
        ("og:description", description.as_str()),
        ("og:url", page.url.as_str()),
        ("og:type", og_type),
    ];
    let mut og_added = 0;
    for (property, content) in og_values {
        if !page.meta.open_graph.iter().any(|(p, _)| p == property) {
            head.push(format!(
                "<meta property=\"{}\" content=\"{}\">",
                property,
                html_escape::encode_double_quoted_attribute(content)
            ));
            og_added += 1;
        }
    }
    if og_added > 0 {
        changes.push(format!("Added {} Open Graph tags", og_added));
    }

    // Structured data
    if page.word_count > MIN_WORD_COUNT && !page.has_structured_data {
        head.push(web_page_json_ld(&page.url, &title, &description));
        changes.push("Added WebPage structured data".to_string());
    }

    rewrite::insert_into_head(&mut html, &head);

    tracing::debug!("Optimized {}: {} changes", page.url, changes.len());

    OptimizedPage { html, changes }
}

/// Display names for the site a page belongs to
struct SiteNames {
    /// `example.com`
    host: String,
    /// `example`
    token: String,
}

impl SiteNames {
    fn for_page(page: &PageRecord) -> Self {
        let host = Url::parse(&page.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| bare_host(&h.to_lowercase()).to_string()))
            .unwrap_or_default();
        let token = domain_token(&host);
        Self { host, token }
    }
}

fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

fn in_window(text: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&char_len(text))
}

/// Truncates to `max` characters including a trailing ellipsis
fn truncate_chars(text: &str, max: usize) -> String {
    let keep = max.saturating_sub(ELLIPSIS.len());
    let cut: String = text.chars().take(keep).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title material for a page without one: first H1, then the last path
/// segment, then the site name
fn fallback_title(page: &PageRecord, site: &SiteNames) -> String {
    if let Some(h1) = page.h1().iter().find(|h| !h.trim().is_empty()) {
        return h1.trim().to_string();
    }
    let segment = Url::parse(&page.url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut s| s.rfind(|seg| !seg.is_empty()).map(str::to_string))
    });
    match segment {
        Some(segment) => humanize(&segment),
        None => capitalize(&site.token),
    }
}

/// `red-shoes_2.html` -> `Red shoes`
fn humanize(raw: &str) -> String {
    let stem = raw.rsplit_once('.').map_or(raw, |(stem, _)| stem);
    let words: Vec<&str> = stem
        .split(|c: char| c == '-' || c == '_' || c == '.' || c == '+' || c.is_whitespace())
        .map(|w| w.trim_matches(|c: char| c.is_ascii_digit()))
        .filter(|w| !w.is_empty())
        .collect();
    capitalize(&words.join(" "))
}

/// Fits a title into the title window
fn fit_title(raw: &str, site: &SiteNames) -> String {
    let raw = raw.trim();
    let mut title = if raw.is_empty() {
        capitalize(&site.token)
    } else {
        raw.to_string()
    };
    if char_len(&title) < TITLE_MIN_CHARS && !site.host.is_empty() {
        title = format!("{} | {}", title, site.host);
    }
    if char_len(&title) > TITLE_MAX_CHARS {
        title = truncate_chars(&title, TITLE_MAX_CHARS);
    }
    title
}

/// Fits a description into the description window
fn fit_description(raw: &str, title: &str, site: &SiteNames) -> String {
    let mut description = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if char_len(&description) < DESCRIPTION_MIN_CHARS {
        let pitch = format!("Discover {} on {}.", title, site.host);
        description = if description.is_empty() {
            pitch
        } else {
            format!("{} {}", description.trim_end_matches('.'), pitch)
        };
    }
    if char_len(&description) < DESCRIPTION_MIN_CHARS {
        description.push_str(" Read the full page for details and related information.");
    }
    if char_len(&description) > DESCRIPTION_MAX_CHARS {
        description = truncate_chars(&description, DESCRIPTION_MAX_CHARS);
    }
    description
}

/// Visible text of the first paragraph with any content
fn first_paragraph(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").ok()?;
    document
        .select(&selector)
        .map(|p| p.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

/// Keywords from title and H1 tokens longer than 3 characters plus the
/// domain token
fn keywords(title: &str, h1: &[String], site: &SiteNames) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let tokens = std::iter::once(title)
        .chain(h1.iter().map(String::as_str))
        .flat_map(|text| text.split(|c: char| !c.is_alphanumeric()))
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 3)
        .chain(std::iter::once(site.token.clone()).filter(|t| !t.is_empty()));

    for token in tokens {
        if !keywords.contains(&token) {
            keywords.push(token);
        }
    }
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

/// Alt text from an image file name, falling back to the page title
fn alt_from_src(src: &str, title: &str) -> String {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let alt = humanize(file);
    if alt.is_empty() {
        title.to_string()
    } else {
        alt
    }
}

fn meta_tag(name: &str, content: &str) -> String {
    format!(
        "<meta name=\"{}\" content=\"{}\">",
        name,
        html_escape::encode_double_quoted_attribute(content)
    )
}

fn web_page_json_ld(url: &str, title: &str, description: &str) -> String {
    let data = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "name": title,
        "description": description,
        "url": url,
    });
    // `</` would end the script element early
    format!(
        "<script type=\"application/ld+json\">{}</script>",
        data.to_string().replace("</", "<\\/")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{clean_page, PageImage};

    const CLEAN_HTML: &str = r#"<html><head><title>A perfectly reasonable title</title>
<meta name="description" content="A meta description that is comfortably longer than fifty characters.">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="canonical" href="https://example.com/">
<meta property="og:title" content="t"><meta property="og:description" content="d">
<meta property="og:url" content="u"><meta property="og:type" content="website">
<meta name="keywords" content="a, b">
</head><body><h1>Heading</h1><h2>Section</h2><img src="/a.png" alt="A"></body></html>"#;

    fn clean_with_og(url: &str) -> PageRecord {
        let mut page = clean_page(url);
        page.meta.keywords = Some("a, b".to_string());
        page.meta.open_graph = ["og:title", "og:description", "og:url", "og:type"]
            .iter()
            .map(|p| (p.to_string(), "x".to_string()))
            .collect();
        page
    }

    #[test]
    fn test_clean_page_untouched() {
        let page = clean_with_og("https://example.com/");
        let optimized = optimize_page(&page, CLEAN_HTML);
        assert!(optimized.is_unchanged(), "{:?}", optimized.changes);
        assert_eq!(optimized.html, CLEAN_HTML);
    }

    #[test]
    fn test_missing_title_injected_from_h1() {
        let mut page = clean_with_og("https://example.com/");
        page.title = None;
        page.headings[0] = vec!["Handmade ceramic mugs".to_string()];
        let html = "<html><head></head><body><h1>Handmade ceramic mugs</h1></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<title>Handmade ceramic mugs</title>\n</head>"));
    }

    #[test]
    fn test_short_title_gets_site_suffix() {
        let mut page = clean_with_og("https://www.example.com/");
        page.title = Some("Home".to_string());
        let html = "<html><head><title>Home</title></head><body></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<title>Home | example.com</title>"));
    }

    #[test]
    fn test_long_title_truncated() {
        let long = "word ".repeat(30);
        let mut page = clean_with_og("https://example.com/");
        page.title = Some(long.clone());
        let html = format!("<html><head><title>{}</title></head><body></body></html>", long);
        let out = optimize_page(&page, &html);
        let start = out.html.find("<title>").unwrap() + "<title>".len();
        let end = out.html.find("</title>").unwrap();
        let title = &out.html[start..end];
        assert!(title.chars().count() <= TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_missing_description_from_first_paragraph() {
        let mut page = clean_with_og("https://example.com/");
        page.meta.description = None;
        let html = "<html><head><title>A perfectly reasonable title</title></head><body>\
            <p>   </p><p>We make durable mugs from local clay, fired twice for strength and glazed by hand.</p>\
            </body></html>";
        let optimized = optimize_page(&page, html);
        assert!(optimized.html.contains(
            "<meta name=\"description\" content=\"We make durable mugs from local clay, fired twice for strength and glazed by hand.\">"
        ));
        assert_eq!(optimized.changes, vec!["Added meta description"]);
    }

    #[test]
    fn test_blank_description_filled_in_place() {
        let mut page = clean_with_og("https://example.com/");
        page.meta.description = None;
        let html = "<html><head><title>A perfectly reasonable title</title>\
            <meta name=\"description\" content=\"  \"></head><body>\
            <p>We make durable mugs from local clay, fired twice for strength and glazed by hand.</p>\
            </body></html>";
        let optimized = optimize_page(&page, html);
        assert_eq!(optimized.html.matches("name=\"description\"").count(), 1);
        assert!(optimized.html.contains(
            "<meta name=\"description\" content=\"We make durable mugs from local clay, fired twice for strength and glazed by hand.\">"
        ));
        assert_eq!(optimized.changes, vec!["Filled blank meta description"]);
    }

    #[test]
    fn test_short_description_rewritten_in_place() {
        let mut page = clean_with_og("https://example.com/");
        page.meta.description = Some("Too short.".to_string());
        let html = "<html><head><meta name=\"description\" content=\"Too short.\"></head><body></body></html>";
        let out = optimize(&page, html);
        assert_eq!(out.matches("name=\"description\"").count(), 1);
        let description = fit_description(
            "Too short.",
            "A perfectly reasonable title",
            &SiteNames::for_page(&page),
        );
        assert!(in_window(&description, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS));
        assert!(out.contains(&*html_escape::encode_double_quoted_attribute(&description)));
    }

    #[test]
    fn test_keywords_deduplicated_and_capped() {
        let site = SiteNames {
            host: "example.com".to_string(),
            token: "example".to_string(),
        };
        let found = keywords(
            "Blue Mugs and Blue Plates",
            &["Handmade blue mugs".to_string()],
            &site,
        );
        assert_eq!(found, vec!["blue", "mugs", "plates", "handmade", "example"]);

        let many = "alpha bravo charlie delta foxtrot hotel india juliet kilo lima mike";
        assert_eq!(keywords(many, &[], &site).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_multiple_h1_demoted() {
        let mut page = clean_with_og("https://example.com/");
        page.headings[0] = vec!["One".to_string(), "Two".to_string()];
        let html = "<html><head></head><body><h1>One</h1><h1>Two</h1></body></html>";
        let optimized = optimize_page(&page, html);
        assert!(optimized.html.contains("<h1>One</h1><h2>Two</h2>"));
        assert!(optimized
            .changes
            .contains(&"Demoted 1 extra H1 headings to H2".to_string()));
    }

    #[test]
    fn test_missing_h1_injected() {
        let mut page = clean_with_og("https://example.com/");
        page.headings[0].clear();
        let html = "<html><head></head><body class=\"x\"><p>Body</p></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<body class=\"x\"><h1>A perfectly reasonable title</h1><p>Body</p>"));
    }

    #[test]
    fn test_alt_from_file_name() {
        assert_eq!(alt_from_src("/img/red-shoes_2024.jpg?v=3", "T"), "Red shoes");
        assert_eq!(alt_from_src("/img/12345.png", "Page title"), "Page title");

        let mut page = clean_with_og("https://example.com/");
        page.images.push(PageImage {
            src: "/img/blue_mug-01.png".to_string(),
            alt: None,
        });
        let html = "<html><head></head><body><img src=\"/img/blue_mug-01.png\"></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<img alt=\"Blue mug\" src=\"/img/blue_mug-01.png\">"));
    }

    #[test]
    fn test_canonical_and_open_graph_injected() {
        let mut page = clean_page("https://example.com/blog/post");
        page.page_type = PageType::Article;
        page.meta.canonical = None;
        let html = "<html><head></head><body></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<link rel=\"canonical\" href=\"https://example.com/blog/post\">"));
        assert!(out.contains("<meta property=\"og:type\" content=\"article\">"));
        assert!(out.contains("<meta property=\"og:url\" content=\"https://example.com/blog/post\">"));
        assert!(out.contains(
            "<meta property=\"og:title\" content=\"A perfectly reasonable title\">"
        ));
    }

    #[test]
    fn test_structured_data_for_long_pages_only() {
        let mut page = clean_with_og("https://example.com/");
        page.has_structured_data = false;
        page.word_count = 301;
        let html = "<html><head></head><body></body></html>";
        let out = optimize(&page, html);
        assert!(out.contains("<script type=\"application/ld+json\">"));
        assert!(out.contains("\"@type\":\"WebPage\""));

        page.word_count = 300;
        assert!(!optimize(&page, html).contains("application/ld+json"));
    }
}
