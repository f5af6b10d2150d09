//! Site packaging
//!
//! Maps every optimized page onto a file path under a root directory named
//! for the domain, adds `robots.txt`, the sitemap files and a README, and
//! writes the result as a gzip-compressed tar archive.

use crate::audit::audit;
use crate::output::readme::format_readme;
use crate::page::Corpus;
use crate::sitemap::{entries_from_corpus, split_sitemap, MAX_URLS_PER_SITEMAP};
use crate::url::same_site;
use crate::SumiError;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use url::Url;

/// A deployable site: file contents keyed by path relative to the domain root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub domain: String,
    pub files: BTreeMap<String, Vec<u8>>,
    /// Page URLs that could not be mapped to a file
    pub skipped: Vec<String>,
}

impl Bundle {
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path of a bundle file inside the archive
    pub fn archive_path(&self, path: &str) -> String {
        format!("{}/{}", self.domain, path)
    }

    /// Encodes the bundle as a `.tar.gz` archive
    pub fn to_tar_gz(&self) -> Result<Vec<u8>, SumiError> {
        let archive_err = |e: std::io::Error| SumiError::Archive(e.to_string());
        let mtime = Utc::now().timestamp().max(0) as u64;

        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in &self.files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(mtime);
            header.set_cksum();
            builder
                .append_data(&mut header, self.archive_path(path), contents.as_slice())
                .map_err(archive_err)?;
        }

        let encoder = builder.into_inner().map_err(archive_err)?;
        encoder.finish().map_err(archive_err)
    }

    /// Writes the `.tar.gz` archive to `path`
    pub fn write_tar_gz(&self, path: &Path) -> Result<(), SumiError> {
        let bytes = self.to_tar_gz()?;
        fs::write(path, bytes)?;
        tracing::info!(
            "Wrote bundle {} ({} files)",
            path.display(),
            self.files.len()
        );
        Ok(())
    }
}

/// Maps a page URL onto its file path inside the bundle
///
/// The root becomes `index.html`, `.html`/`.htm` paths keep their name,
/// extensionless paths become `<path>/index.html` and anything with another
/// extension is not packaged.
///
/// # Examples
///
/// ```
/// use sumi_audit::output::page_file_path;
///
/// assert_eq!(page_file_path("https://example.com/"), Some("index.html".to_string()));
/// assert_eq!(page_file_path("https://example.com/about"), Some("about/index.html".to_string()));
/// assert_eq!(page_file_path("https://example.com/doc.pdf"), None);
/// ```
pub fn page_file_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let Some(last) = segments.last() else {
        return Some("index.html".to_string());
    };

    let path = segments.join("/");
    match last.rsplit_once('.') {
        Some((_, ext)) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
            Some(path)
        }
        Some(_) => None,
        None => Some(format!("{}/index.html", path)),
    }
}

/// Base URL of the packaged site, taking the scheme from the crawled pages
fn site_base(domain: &str, corpus: &Corpus) -> Option<Url> {
    let scheme = corpus
        .values()
        .filter_map(|page| Url::parse(&page.url).ok())
        .find(|u| u.host_str().map_or(false, |h| same_site(h, domain)))
        .map_or_else(|| "https".to_string(), |u| u.scheme().to_string());
    Url::parse(&format!("{}://{}/", scheme, domain)).ok()
}

fn robots_txt(base: &Url) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}sitemap.xml\n",
        base.as_str()
    )
}

/// Packages optimized pages of `domain` into a bundle
///
/// # Arguments
///
/// * `domain` - Host of the site; also the archive root
/// * `corpus` - Pages of the crawl
/// * `optimized` - Optimized HTML by page URL
pub fn package(domain: &str, corpus: &Corpus, optimized: &BTreeMap<String, String>) -> Bundle {
    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (url, html) in optimized {
        let on_site = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| same_site(h, domain)))
            .unwrap_or(false);
        if !on_site {
            tracing::debug!("Not packaging off-site page {}", url);
            continue;
        }

        match page_file_path(url) {
            Some(path) if files.contains_key(&path) => {
                tracing::debug!("{} maps onto {} which is already packaged", url, path);
                skipped.push(url.clone());
            }
            Some(path) => {
                files.insert(path, html.clone().into_bytes());
            }
            None => {
                tracing::debug!("Skipping non-HTML path {}", url);
                skipped.push(url.clone());
            }
        }
    }

    let site_pages: Corpus = corpus
        .iter()
        .filter(|(_, page)| {
            Url::parse(&page.url)
                .ok()
                .and_then(|u| u.host_str().map(|h| same_site(h, domain)))
                .unwrap_or(false)
        })
        .map(|(url, page)| (url.clone(), page.clone()))
        .collect();

    let now = Utc::now();
    if let Some(base) = site_base(domain, corpus) {
        files.insert("robots.txt".to_string(), robots_txt(&base).into_bytes());

        let entries = entries_from_corpus(
            &site_pages,
            &HashMap::new(),
            &now.format("%Y-%m-%d").to_string(),
        );
        let sitemaps = split_sitemap(&entries, MAX_URLS_PER_SITEMAP, &base);
        for (name, xml) in sitemaps.all() {
            files.insert(name.to_string(), xml.as_bytes().to_vec());
        }
    }

    let mut listed: Vec<String> = files.keys().cloned().collect();
    listed.push("README.md".to_string());
    listed.sort();
    let readme = format_readme(
        domain,
        &site_pages,
        &audit(&site_pages),
        &listed,
        &now.to_rfc3339(),
    );
    files.insert("README.md".to_string(), readme.into_bytes());

    tracing::info!(
        "Packaged {} files for {} ({} pages skipped)",
        files.len(),
        domain,
        skipped.len()
    );

    Bundle {
        domain: domain.to_string(),
        files,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::clean_page;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn corpus(urls: &[&str]) -> Corpus {
        urls.iter()
            .map(|u| (u.to_string(), clean_page(u)))
            .collect()
    }

    fn optimized(urls: &[&str]) -> BTreeMap<String, String> {
        urls.iter()
            .map(|u| (u.to_string(), format!("<html><body>{}</body></html>", u)))
            .collect()
    }

    #[test]
    fn test_page_file_paths() {
        assert_eq!(page_file_path("https://example.com/").as_deref(), Some("index.html"));
        assert_eq!(
            page_file_path("https://example.com/blog/post").as_deref(),
            Some("blog/post/index.html")
        );
        assert_eq!(
            page_file_path("https://example.com/about.html").as_deref(),
            Some("about.html")
        );
        assert_eq!(
            page_file_path("https://example.com/docs/Guide.HTM").as_deref(),
            Some("docs/Guide.HTM")
        );
        assert_eq!(page_file_path("https://example.com/feed.xml"), None);
        assert_eq!(page_file_path("not a url"), None);
    }

    #[test]
    fn test_package_layout() {
        let urls = [
            "https://example.com/",
            "https://example.com/about",
            "https://example.com/report.pdf",
            "https://other.org/page",
        ];
        let bundle = package("example.com", &corpus(&urls), &optimized(&urls));

        let names: Vec<&str> = bundle.files.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["README.md", "about/index.html", "index.html", "robots.txt", "sitemap.xml"]
        );
        assert_eq!(bundle.skipped, vec!["https://example.com/report.pdf"]);

        let robots = String::from_utf8(bundle.get("robots.txt").unwrap().to_vec()).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));

        let sitemap = String::from_utf8(bundle.get("sitemap.xml").unwrap().to_vec()).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/about</loc>"));
        assert!(!sitemap.contains("other.org"));

        let readme = String::from_utf8(bundle.get("README.md").unwrap().to_vec()).unwrap();
        assert!(readme.contains("- `about/index.html`"));
        assert!(readme.contains("- `README.md`"));
    }

    #[test]
    fn test_tar_gz_has_domain_root() {
        let urls = ["https://example.com/", "https://example.com/about"];
        let bundle = package("example.com", &corpus(&urls), &optimized(&urls));
        let bytes = bundle.to_tar_gz().unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(bytes.as_slice()));
        let mut found = BTreeMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().to_string();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            found.insert(path, contents);
        }

        assert_eq!(found.len(), bundle.len());
        assert!(found.keys().all(|p| p.starts_with("example.com/")));
        assert_eq!(
            found["example.com/about/index.html"],
            "<html><body>https://example.com/about</body></html>"
        );
    }

    #[test]
    fn test_write_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.com.tar.gz");
        let bundle = package("example.com", &Corpus::new(), &BTreeMap::new());
        bundle.write_tar_gz(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        // Without pages only the supporting files are packaged
        assert_eq!(
            bundle.files.keys().collect::<Vec<_>>(),
            vec!["README.md", "robots.txt", "sitemap.xml"]
        );
    }
}
