//! Sitemap artifact generation
//!
//! XML, JSON and HTML renditions are all produced from one `&[SitemapEntry]`
//! so they always agree.

use crate::page::Corpus;
use crate::sitemap::{ChangeFreq, SitemapEntry, MAX_URLS_PER_SITEMAP, SITEMAP_NAMESPACE};
use crate::url::PageType;
use crate::SumiError;
use quick_xml::escape::escape;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Sitemap files ready to be written, by file name
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapFiles {
    /// `sitemap.xml`, or `sitemap-1.xml`.. when split
    pub sitemaps: Vec<(String, String)>,
    /// `sitemap_index.xml` content when the entries were split
    pub index: Option<String>,
}

impl SitemapFiles {
    /// Every file including the index, in write order
    pub fn all(&self) -> Vec<(&str, &str)> {
        let mut files: Vec<(&str, &str)> = self
            .sitemaps
            .iter()
            .map(|(name, xml)| (name.as_str(), xml.as_str()))
            .collect();
        if let Some(index) = &self.index {
            files.push(("sitemap_index.xml", index.as_str()));
        }
        files
    }
}

fn changefreq_for(page_type: PageType) -> ChangeFreq {
    match page_type {
        PageType::Home => ChangeFreq::Daily,
        PageType::Category => ChangeFreq::Weekly,
        PageType::Product => ChangeFreq::Weekly,
        PageType::Article => ChangeFreq::Monthly,
        PageType::Other => ChangeFreq::Monthly,
    }
}

fn priority_for(page_type: PageType) -> f32 {
    match page_type {
        PageType::Home => 1.0,
        PageType::Category => 0.8,
        PageType::Product => 0.7,
        PageType::Article => 0.6,
        PageType::Other => 0.5,
    }
}

/// Derives sitemap entries from the crawl corpus
///
/// Pages that ask not to be indexed are left out. `lastmod` comes from the
/// site's own sitemap when it listed the URL, otherwise `crawl_date`.
///
/// # Arguments
///
/// * `corpus` - Successfully fetched pages
/// * `lastmods` - `lastmod` values read from the site's sitemaps, by URL
/// * `crawl_date` - W3C date used when no `lastmod` is known
pub fn entries_from_corpus(
    corpus: &Corpus,
    lastmods: &HashMap<String, String>,
    crawl_date: &str,
) -> Vec<SitemapEntry> {
    corpus
        .values()
        .filter(|page| !page.meta.is_noindex())
        .map(|page| SitemapEntry {
            loc: page.url.clone(),
            lastmod: Some(
                lastmods
                    .get(&page.url)
                    .cloned()
                    .unwrap_or_else(|| crawl_date.to_string()),
            ),
            changefreq: Some(changefreq_for(page.page_type)),
            priority: Some(priority_for(page.page_type)),
        })
        .collect()
}

/// Renders a single `<urlset>` sitemap
pub fn build_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NAMESPACE));

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(entry.loc.as_str())));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape(lastmod.as_str())));
        }
        if let Some(changefreq) = entry.changefreq {
            xml.push_str(&format!("    <changefreq>{}</changefreq>\n", changefreq));
        }
        if let Some(priority) = entry.priority {
            xml.push_str(&format!("    <priority>{:.1}</priority>\n", priority));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Renders a `<sitemapindex>` pointing at the given sitemap URLs
pub fn build_sitemap_index(sitemap_urls: &[String], lastmod: Option<&str>) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">\n", SITEMAP_NAMESPACE));

    for loc in sitemap_urls {
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(loc.as_str())));
        if let Some(lastmod) = lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape(lastmod)));
        }
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

/// Splits entries into sitemap files of at most `chunk_size` URLs
///
/// Up to `chunk_size` entries produce a single `sitemap.xml`. Larger sets
/// become `sitemap-1.xml`, `sitemap-2.xml`, ... plus a `sitemap_index.xml`
/// whose locations are resolved against `base_url`. A `chunk_size` of zero
/// or above the protocol limit is clamped to [`MAX_URLS_PER_SITEMAP`].
pub fn split_sitemap(entries: &[SitemapEntry], chunk_size: usize, base_url: &Url) -> SitemapFiles {
    let chunk_size = if chunk_size == 0 {
        MAX_URLS_PER_SITEMAP
    } else {
        chunk_size.min(MAX_URLS_PER_SITEMAP)
    };

    if entries.len() <= chunk_size {
        return SitemapFiles {
            sitemaps: vec![("sitemap.xml".to_string(), build_sitemap(entries))],
            index: None,
        };
    }

    let sitemaps: Vec<(String, String)> = entries
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| (format!("sitemap-{}.xml", i + 1), build_sitemap(chunk)))
        .collect();

    let locations: Vec<String> = sitemaps
        .iter()
        .map(|(name, _)| {
            base_url
                .join(&format!("/{}", name))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| name.clone())
        })
        .collect();

    let newest = entries.iter().filter_map(|e| e.lastmod.as_deref()).max();

    tracing::debug!("Split {} sitemap entries into {} files", entries.len(), sitemaps.len());

    SitemapFiles {
        index: Some(build_sitemap_index(&locations, newest)),
        sitemaps,
    }
}

/// Renders the entries as a JSON array
pub fn build_sitemap_json(entries: &[SitemapEntry]) -> Result<String, SumiError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Groups entries by the first segment of their path
///
/// The root and single-level pages are grouped under `/`.
fn group_by_section(entries: &[SitemapEntry]) -> BTreeMap<String, Vec<&SitemapEntry>> {
    let mut groups: BTreeMap<String, Vec<&SitemapEntry>> = BTreeMap::new();
    for entry in entries {
        let section = Url::parse(&entry.loc)
            .ok()
            .and_then(|url| {
                let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
                let first = segments.next()?.to_string();
                // A lone segment is a page, not a section
                segments.next().map(|_| format!("/{}", first))
            })
            .unwrap_or_else(|| "/".to_string());
        groups.entry(section).or_default().push(entry);
    }
    groups
}

/// Renders a human-browsable HTML sitemap grouped by section
pub fn build_sitemap_html(entries: &[SitemapEntry], site_name: &str) -> String {
    let site = html_escape::encode_text(site_name);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Sitemap - {}</title>\n", site));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Sitemap - {}</h1>\n", site));
    html.push_str(&format!("<p>{} pages</p>\n", entries.len()));

    for (section, group) in group_by_section(entries) {
        html.push_str(&format!(
            "<h2>{} ({})</h2>\n<ul>\n",
            html_escape::encode_text(&section),
            group.len()
        ));
        for entry in group {
            html.push_str(&format!(
                "  <li><a href=\"{}\">{}</a></li>\n",
                html_escape::encode_double_quoted_attribute(&entry.loc),
                html_escape::encode_text(&entry.loc)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
