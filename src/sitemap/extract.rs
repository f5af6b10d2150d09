//! Sitemap discovery for frontier seeding
//!
//! Sitemaps declared in robots.txt are tried first, then `<base>/sitemap.xml`.
//! Indexes are followed breadth-first with a cap on both the number of child
//! sitemaps and the nesting depth. Every failure is logged and skipped; the
//! worst case is an empty seed list.

use crate::sitemap::MAX_URLS_PER_SITEMAP;
use crate::url::{NormalizedUrl, UrlPolicy};
use crate::SumiError;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::io::Read;
use url::Url;

/// Deepest chain of nested sitemap indexes that is followed
const MAX_INDEX_NESTING: u32 = 3;

/// Protocol limit of an uncompressed sitemap file
const MAX_SITEMAP_BYTES: usize = 50 * 1024 * 1024;

/// A page URL listed in a sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    pub url: NormalizedUrl,
    pub lastmod: Option<String>,
}

/// Contents of one sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSitemap {
    /// A `<urlset>`: `(loc, lastmod)` pairs
    UrlSet(Vec<(String, Option<String>)>),
    /// A `<sitemapindex>`: locations of child sitemaps
    Index(Vec<String>),
}

/// Parses a sitemap or sitemap index document
///
/// Element names are matched on their local part so prefixed namespaces
/// are accepted. Reading stops after [`MAX_URLS_PER_SITEMAP`] entries.
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap, SumiError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut is_index: Option<bool> = None;
    let mut urls = Vec::new();
    let mut children = Vec::new();

    let mut current_element: Option<String> = None;
    let mut text_buf = String::new();
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;
    let mut truncated = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            SumiError::SitemapParse(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                match name.as_str() {
                    "urlset" if is_index.is_none() => is_index = Some(false),
                    "sitemapindex" if is_index.is_none() => is_index = Some(true),
                    "url" | "sitemap" => {
                        loc = None;
                        lastmod = None;
                    }
                    "loc" | "lastmod" => {
                        current_element = Some(name);
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if current_element.is_some() {
                    if let Ok(text) = e.unescape() {
                        text_buf.push_str(&text);
                    }
                }
            }
            Event::CData(ref e) => {
                if current_element.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(&e.to_vec()));
                }
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                match name.as_str() {
                    "loc" => {
                        loc = Some(text_buf.trim().to_string()).filter(|s| !s.is_empty());
                        current_element = None;
                    }
                    "lastmod" => {
                        lastmod = Some(text_buf.trim().to_string()).filter(|s| !s.is_empty());
                        current_element = None;
                    }
                    "url" => {
                        if let Some(l) = loc.take() {
                            if urls.len() >= MAX_URLS_PER_SITEMAP {
                                truncated = true;
                                break;
                            }
                            urls.push((l, lastmod.take()));
                        }
                    }
                    "sitemap" => {
                        if let Some(l) = loc.take() {
                            if children.len() >= MAX_URLS_PER_SITEMAP {
                                truncated = true;
                                break;
                            }
                            children.push(l);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if truncated {
        tracing::warn!(
            "Sitemap lists more than {} entries, ignoring the rest",
            MAX_URLS_PER_SITEMAP
        );
    }

    match is_index {
        Some(true) => Ok(ParsedSitemap::Index(children)),
        Some(false) => Ok(ParsedSitemap::UrlSet(urls)),
        None => Err(SumiError::SitemapParse(
            "document has no <urlset> or <sitemapindex> root".to_string(),
        )),
    }
}

/// Fetches a sitemap body, inflating `.gz` files
///
/// Bodies larger than [`MAX_SITEMAP_BYTES`], before or after inflating,
/// are rejected.
async fn fetch_sitemap(client: &Client, url: &str) -> Result<String, SumiError> {
    let fetch_error = |message: String| SumiError::SitemapFetch {
        url: url.to_string(),
        message,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fetch_error(format!("HTTP {}", response.status().as_u16())));
    }

    if let Some(length) = response.content_length() {
        if length > MAX_SITEMAP_BYTES as u64 {
            return Err(fetch_error(format!(
                "body of {} bytes exceeds {} bytes",
                length, MAX_SITEMAP_BYTES
            )));
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fetch_error(e.to_string()))?
    {
        if bytes.len() + chunk.len() > MAX_SITEMAP_BYTES {
            return Err(fetch_error(format!(
                "body exceeds {} bytes",
                MAX_SITEMAP_BYTES
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    decode_sitemap_body(&bytes, MAX_SITEMAP_BYTES).map_err(fetch_error)
}

/// Decodes a sitemap body, inflating gzip payloads up to `limit` bytes
fn decode_sitemap_body(bytes: &[u8], limit: usize) -> Result<String, String> {
    // Gzip magic bytes; transfer-level gzip is already decoded by the client
    if !bytes.starts_with(&[0x1f, 0x8b]) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .take(limit as u64 + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| format!("gzip: {}", e))?;
    if inflated.len() > limit {
        return Err(format!("inflated body exceeds {} bytes", limit));
    }
    Ok(String::from_utf8_lossy(&inflated).into_owned())
}

/// Discovers seed URLs from a site's sitemaps
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `base` - The crawl's seed URL; only its origin is used
/// * `declared` - `Sitemap:` URLs from robots.txt, tried first
/// * `max_child_sitemaps` - Maximum number of child sitemaps taken from indexes
/// * `policy` - Normalization applied to every listed URL
///
/// # Returns
///
/// Deduplicated, normalized page URLs in document order. Empty if no
/// sitemap could be fetched or parsed.
pub async fn extract_seed_urls(
    client: &Client,
    base: &Url,
    declared: &[String],
    max_child_sitemaps: usize,
    policy: &UrlPolicy,
) -> Vec<SitemapUrl> {
    let mut queue: VecDeque<(String, u32)> = declared.iter().map(|s| (s.clone(), 0)).collect();
    match base.join("/sitemap.xml") {
        Ok(default) => queue.push_back((default.to_string(), 0)),
        Err(e) => tracing::warn!("Cannot build sitemap URL from {}: {}", base, e),
    }

    let mut fetched_sitemaps = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut seeds = Vec::new();
    let mut children_taken = 0usize;

    while let Some((sitemap_url, nesting)) = queue.pop_front() {
        if !fetched_sitemaps.insert(sitemap_url.clone()) {
            continue;
        }

        tracing::debug!("Fetching sitemap: {}", sitemap_url);
        let body = match fetch_sitemap(client, &sitemap_url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };

        match parse_sitemap(&body) {
            Ok(ParsedSitemap::Index(children)) => {
                if nesting >= MAX_INDEX_NESTING {
                    tracing::warn!(
                        "Sitemap index {} nested too deeply, ignoring {} children",
                        sitemap_url,
                        children.len()
                    );
                    continue;
                }
                for child in children {
                    if children_taken >= max_child_sitemaps {
                        tracing::warn!(
                            "Child sitemap limit ({}) reached, skipping {}",
                            max_child_sitemaps,
                            child
                        );
                        break;
                    }
                    children_taken += 1;
                    queue.push_back((child, nesting + 1));
                }
            }
            Ok(ParsedSitemap::UrlSet(entries)) => {
                tracing::debug!("Sitemap {} lists {} URLs", sitemap_url, entries.len());
                for (loc, lastmod) in entries {
                    match policy.normalize(&loc, Some(base)) {
                        Ok(url) => {
                            if seen_urls.insert(url.clone()) {
                                seeds.push(SitemapUrl { url, lastmod });
                            }
                        }
                        Err(e) => tracing::debug!("Skipping sitemap entry {}: {}", loc, e),
                    }
                }
            }
            Err(e) => tracing::warn!("Sitemap {} unusable: {}", sitemap_url, e),
        }
    }

    tracing::info!("Sitemaps yielded {} seed URLs", seeds.len());
    seeds
}
