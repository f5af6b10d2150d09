//! Page processing: fetched HTML to page record plus discovered links

use crate::crawler::fetcher::FetchedPage;
use crate::page::{detect_issues, extract_page, PageRecord};
use crate::url::{classify_page, same_site, NormalizedUrl, UrlPolicy};
use std::collections::HashSet;
use url::Url;

/// Output of processing one fetched page
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    pub record: PageRecord,
    /// Every distinct followable link, internal and external, in document order
    pub links: Vec<NormalizedUrl>,
}

/// Builds the page record for a fetched document
///
/// Links are resolved against the final URL after redirects, normalized
/// with `policy`, and split into internal and external by comparing hosts
/// with `site_host` (`www.` insensitive). Per-page issues are attached.
///
/// # Arguments
///
/// * `url` - The normalized URL that was dispatched
/// * `depth` - Crawl depth of `url`
/// * `fetched` - The fetched document
/// * `policy` - Normalization policy of the crawl
/// * `site_host` - Host of the crawl's seed URL
pub fn process_page(
    url: &NormalizedUrl,
    depth: u32,
    fetched: &FetchedPage,
    policy: &UrlPolicy,
    site_host: &str,
) -> ProcessedPage {
    let base = Url::parse(&fetched.final_url).unwrap_or_else(|_| url.as_url().clone());
    let extracted = extract_page(&fetched.body, &base);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut internal_links = Vec::new();
    let mut external_links = Vec::new();

    for link in &extracted.links {
        let normalized = match policy.normalize(link.as_str(), None) {
            Ok(n) => n,
            Err(e) => {
                tracing::trace!("Dropping link {} on {}: {}", link, url, e);
                continue;
            }
        };
        if !seen.insert(normalized.clone()) {
            continue;
        }
        if same_site(normalized.host(), site_host) {
            internal_links.push(normalized.as_str().to_string());
        } else {
            external_links.push(normalized.as_str().to_string());
        }
        links.push(normalized);
    }

    let mut record = PageRecord {
        url: url.as_str().to_string(),
        final_url: fetched.final_url.clone(),
        status: fetched.status_code,
        depth,
        page_type: classify_page(url.as_url()),
        content_type: fetched.content_type.clone(),
        title: extracted.title,
        lang: extracted.lang,
        meta: extracted.meta,
        headings: extracted.headings,
        images: extracted.images,
        internal_links,
        external_links,
        has_structured_data: extracted.has_structured_data,
        word_count: extracted.word_count,
        content_length: fetched.body.len(),
        latency_ms: fetched.latency.as_millis() as u64,
        issues: Vec::new(),
    };
    record.issues = detect_issues(&record);

    ProcessedPage { record, links }
}
