//! HTML content extraction
//!
//! This module parses a fetched document and pulls out everything a page
//! record needs:
//! - Title, language and head meta (description, keywords, robots, viewport,
//!   canonical, Open Graph)
//! - Heading texts for H1 through H6
//! - Images with their alt attributes
//! - Followable links (absolute URLs)
//! - Visible word count and JSON-LD presence

use crate::page::{Headings, PageImage, PageMeta};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the reader
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Everything extracted from a single HTML document
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// The `lang` attribute of the root element
    pub lang: Option<String>,

    pub meta: PageMeta,

    pub headings: Headings,

    pub images: Vec<PageImage>,

    /// All followable links found on the page (absolute URLs, document order)
    pub links: Vec<Url>,

    /// Whether a JSON-LD block is present
    pub has_structured_data: bool,

    /// Number of whitespace-separated words in visible body text
    pub word_count: usize,
}

/// Parses HTML content and extracts page content
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that does not resolve to http(s)
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use sumi_audit::page::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract_page(html, &base_url);
/// assert_eq!(page.title, Some("Test".to_string()));
/// assert_eq!(page.links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        lang: extract_lang(&document),
        meta: extract_meta(&document),
        headings: extract_headings(&document),
        images: extract_images(&document),
        links: extract_links(&document, base_url),
        has_structured_data: has_json_ld(&document),
        word_count: count_visible_words(&document),
    }
}

/// Selects every element matching a CSS selector
///
/// Selectors here are static; an unparsable one matches nothing.
fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Collapses runs of whitespace into single spaces
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn non_empty_attr(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    select_all(document, "title")
        .first()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn extract_lang(document: &Html) -> Option<String> {
    select_all(document, "html")
        .first()
        .and_then(|html| non_empty_attr(html, "lang"))
}

/// Reads `<meta>` and `<link rel=canonical>` from the document
///
/// The first occurrence of each named meta tag wins.
fn extract_meta(document: &Html) -> PageMeta {
    let mut meta = PageMeta::default();

    for element in select_all(document, "meta") {
        let content = match non_empty_attr(&element, "content") {
            Some(c) => c,
            None => continue,
        };

        if let Some(property) = element.value().attr("property") {
            let property = property.trim().to_lowercase();
            if property.starts_with("og:") {
                meta.open_graph.push((property, content));
                continue;
            }
        }

        let name = match element.value().attr("name") {
            Some(n) => n.trim().to_lowercase(),
            None => continue,
        };

        let slot = match name.as_str() {
            "description" => &mut meta.description,
            "keywords" => &mut meta.keywords,
            "robots" => &mut meta.robots,
            "viewport" => &mut meta.viewport,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(content);
        }
    }

    meta.canonical = select_all(document, "link[rel][href]")
        .into_iter()
        .find(|link| {
            link.value()
                .attr("rel")
                .map_or(false, |rel| {
                    rel.split_whitespace()
                        .any(|r| r.eq_ignore_ascii_case("canonical"))
                })
        })
        .and_then(|link| non_empty_attr(&link, "href"));

    meta
}

fn extract_headings(document: &Html) -> Headings {
    let mut headings: Headings = Default::default();
    for (index, level) in headings.iter_mut().enumerate() {
        let tag = format!("h{}", index + 1);
        *level = select_all(document, &tag)
            .iter()
            .map(element_text)
            .collect();
    }
    headings
}

fn extract_images(document: &Html) -> Vec<PageImage> {
    select_all(document, "img")
        .iter()
        .filter_map(|img| {
            let src = non_empty_attr(img, "src").or_else(|| non_empty_attr(img, "data-src"))?;
            Some(PageImage {
                src,
                alt: img.value().attr("alt").map(|a| a.trim().to_string()),
            })
        })
        .collect()
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    for element in select_all(document, "a[href]") {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    links
}

fn has_json_ld(document: &Html) -> bool {
    select_all(document, "script[type]").iter().any(|script| {
        script
            .value()
            .attr("type")
            .map_or(false, |t| t.trim().eq_ignore_ascii_case("application/ld+json"))
    })
}

/// Counts words in body text outside of script, style, noscript and template
fn count_visible_words(document: &Html) -> usize {
    let body = select_all(document, "body");
    let root = match body.first() {
        Some(body) => *body,
        None => document.root_element(),
    };

    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |e| INVISIBLE_ELEMENTS.contains(&e.name()))
            });
            if hidden {
                None
            } else {
                Some(text.split_whitespace().count())
            }
        })
        .sum()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}
