//! Console summary of a crawl and its audit

use crate::audit::AuditResult;
use crate::crawler::CrawlResult;
use crate::page::Severity;

/// Number of recommendations printed to the console
const PRINTED_RECOMMENDATIONS: usize = 5;

/// Formats the summary printed at the end of a run
pub fn format_summary(crawl: &CrawlResult, audit: &AuditResult) -> String {
    let meta = &crawl.metadata;
    let mut out = String::new();

    out.push_str("=== Sumi-Audit Summary ===\n\n");

    out.push_str("Crawl:\n");
    out.push_str(&format!("  Domain: {}\n", meta.domain));
    out.push_str(&format!("  Final state: {}\n", meta.final_state));
    out.push_str(&format!(
        "  Requests: {} ({} succeeded, {} failed, {} HTTP attempts)\n",
        meta.total_requests, meta.success_requests, meta.failed_requests, meta.http_attempts
    ));
    let success_rate = if meta.total_requests > 0 {
        (meta.success_requests as f64 / meta.total_requests as f64) * 100.0
    } else {
        0.0
    };
    out.push_str(&format!("  Success rate: {:.1}%\n", success_rate));
    out.push_str(&format!("  Sitemap URLs: {}\n", meta.sitemap_urls));
    out.push_str(&format!("  Blocked by robots.txt: {}\n", meta.robots_blocked));
    out.push_str(&format!(
        "  Duration: {:.1}s\n\n",
        meta.total_time_ms as f64 / 1000.0
    ));

    out.push_str(&format!("Overall score: {}/100\n", audit.score));
    let scores = &audit.category_scores;
    out.push_str(&format!(
        "  SEO {} | Technical {} | Content {} | Performance {} | Mobile {}\n\n",
        scores.seo, scores.technical, scores.content, scores.performance, scores.mobile
    ));

    out.push_str("Issues:\n");
    for severity in Severity::all() {
        let bucket = audit.issues.get(severity);
        out.push_str(&format!("  {}: {}\n", severity, bucket.len()));
        if severity != Severity::Passed {
            for issue in bucket {
                out.push_str(&format!(
                    "    - {} ({} pages)\n",
                    issue.title,
                    issue.affected_urls.len()
                ));
            }
        }
    }
    out.push('\n');

    if !audit.recommendations.is_empty() {
        out.push_str("Top recommendations:\n");
        for recommendation in audit.recommendations.iter().take(PRINTED_RECOMMENDATIONS) {
            out.push_str(&format!("  - {}\n", recommendation));
        }
    }

    if !crawl.failures.is_empty() {
        out.push_str(&format!("\nFailed URLs ({}):\n", crawl.failures.len()));
        for failure in crawl.failures.iter().take(20) {
            out.push_str(&format!("  - {} ({})\n", failure.url, failure.reason));
        }
    }

    out
}

/// Prints the run summary to stdout
pub fn print_summary(crawl: &CrawlResult, audit: &AuditResult) {
    print!("{}", format_summary(crawl, audit));
}
