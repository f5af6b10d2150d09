//! Output module for run artifacts
//!
//! This module handles:
//! - Writing crawl, audit and sitemap artifacts to the output directory
//! - Packaging optimized pages into a deployable bundle
//! - Publishing the bundle to a remote host
//! - Printing the console summary of a run

mod bundle;
mod publish;
mod readme;
mod summary;

pub use bundle::{package, page_file_path, Bundle};
pub use publish::{publish, target_url, try_publish};
pub use readme::format_readme;
pub use summary::{format_summary, print_summary};

use crate::audit::AuditResult;
use crate::crawler::CrawlResult;
use crate::sitemap::{build_sitemap_html, build_sitemap_json, SitemapEntry, SitemapFiles};
use crate::SumiError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Serializes `value` as pretty JSON into `dir/name`
fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf, SumiError> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

fn write_text(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, SumiError> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Writes the crawl, audit and sitemap artifacts of a run
///
/// # Arguments
///
/// * `dir` - Output directory, created if missing
/// * `crawl` - Result of the crawl
/// * `audit` - Audit of the crawl corpus
/// * `sitemaps` - Sitemap XML files (split when large)
/// * `entries` - Sitemap entries for the JSON and HTML renditions
/// * `site_name` - Heading of the HTML sitemap
///
/// # Returns
///
/// Paths of every written file, in write order
pub fn write_artifacts(
    dir: &Path,
    crawl: &CrawlResult,
    audit: &AuditResult,
    sitemaps: &SitemapFiles,
    entries: &[SitemapEntry],
    site_name: &str,
) -> Result<Vec<PathBuf>, SumiError> {
    fs::create_dir_all(dir)?;

    let mut written = vec![
        write_json(dir, "crawl.json", crawl)?,
        write_json(dir, "audit.json", audit)?,
    ];
    for (name, xml) in sitemaps.all() {
        written.push(write_text(dir, name, xml)?);
    }
    written.push(write_text(dir, "sitemap.json", &build_sitemap_json(entries)?)?);
    written.push(write_text(
        dir,
        "sitemap.html",
        &build_sitemap_html(entries, site_name),
    )?);

    tracing::info!("Wrote {} artifacts to {}", written.len(), dir.display());
    Ok(written)
}
