//! Bundle README generation
//!
//! The README travels inside the bundle and tells whoever deploys it what
//! was crawled, how the site scored and which files were produced.

use crate::audit::AuditResult;
use crate::page::{Corpus, Severity};

/// Largest number of pages listed individually
const MAX_LISTED_PAGES: usize = 50;

/// Formats the bundle README as markdown
///
/// # Arguments
///
/// * `domain` - The packaged site
/// * `corpus` - Pages of the crawl
/// * `audit` - Audit of the same corpus
/// * `files` - Paths inside the bundle, relative to its root
/// * `generated_at` - Timestamp printed in the header
pub fn format_readme(
    domain: &str,
    corpus: &Corpus,
    audit: &AuditResult,
    files: &[String],
    generated_at: &str,
) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Optimized site bundle for {}\n\n", domain));
    md.push_str(&format!("Generated {} by Sumi-Audit.\n\n", generated_at));
    md.push_str(
        "The HTML in this bundle was rewritten automatically. Review every page \
         before publishing it.\n\n",
    );

    // Audit overview
    md.push_str("## Audit Overview\n\n");
    md.push_str(&format!("- **Overall Score**: {}/100\n", audit.score));
    md.push_str(&format!("- **Pages Audited**: {}\n", audit.summary.total_pages));
    md.push_str(&format!(
        "- **Affected Pages Across Issues**: {}\n\n",
        audit.summary.total_issues
    ));

    md.push_str("| Category | Score |\n");
    md.push_str("|----------|-------|\n");
    let scores = &audit.category_scores;
    md.push_str(&format!("| SEO | {} |\n", scores.seo));
    md.push_str(&format!("| Technical | {} |\n", scores.technical));
    md.push_str(&format!("| Content | {} |\n", scores.content));
    md.push_str(&format!("| Performance | {} |\n", scores.performance));
    md.push_str(&format!("| Mobile | {} |\n\n", scores.mobile));

    // Issues
    let failing: Vec<_> = [
        Severity::Critical,
        Severity::Important,
        Severity::Opportunity,
        Severity::Minor,
    ]
    .into_iter()
    .flat_map(move |severity| {
        audit
            .issues
            .get(severity)
            .iter()
            .map(move |issue| (severity, issue))
    })
    .collect();

    if !failing.is_empty() {
        md.push_str("## Issues Found\n\n");
        md.push_str("| Severity | Issue | Pages |\n");
        md.push_str("|----------|-------|-------|\n");
        for (severity, issue) in failing {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                severity,
                issue.title,
                issue.affected_urls.len()
            ));
        }
        md.push('\n');
    }

    // Recommendations
    md.push_str("## Recommendations\n\n");
    for (i, recommendation) in audit.recommendations.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", i + 1, recommendation));
    }
    md.push('\n');

    // Pages
    if !corpus.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Score | Words |\n");
        md.push_str("|-----|-------|-------|\n");
        for (url, page) in corpus.iter().take(MAX_LISTED_PAGES) {
            let score = audit.page_scores.get(url).copied().unwrap_or(0);
            md.push_str(&format!("| {} | {} | {} |\n", url, score, page.word_count));
        }
        if corpus.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "\n... and {} more\n",
                corpus.len() - MAX_LISTED_PAGES
            ));
        }
        md.push('\n');
    }

    // Files
    md.push_str("## Files\n\n");
    for file in files {
        md.push_str(&format!("- `{}`\n", file));
    }
    md.push('\n');

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use crate::page::{clean_page, detect_issues};

    fn corpus() -> Corpus {
        let mut page = clean_page("https://example.com/");
        page.meta.description = None;
        page.issues = detect_issues(&page);
        let mut corpus = Corpus::new();
        corpus.insert(page.url.clone(), page);
        corpus
    }

    #[test]
    fn test_format_readme() {
        let corpus = corpus();
        let result = audit(&corpus);
        let files = vec!["index.html".to_string(), "robots.txt".to_string()];
        let md = format_readme("example.com", &corpus, &result, &files, "2024-05-01");

        assert!(md.starts_with("# Optimized site bundle for example.com"));
        assert!(md.contains("- **Overall Score**: 90/100"));
        assert!(md.contains("| important | Missing meta descriptions | 1 |"));
        assert!(md.contains("| https://example.com/ | 90 | 500 |"));
        assert!(md.contains("- `robots.txt`"));
    }

    #[test]
    fn test_readme_for_empty_corpus() {
        let corpus = Corpus::new();
        let result = audit(&corpus);
        let md = format_readme("example.com", &corpus, &result, &[], "2024-05-01");

        assert!(md.contains("- **Overall Score**: 0/100"));
        assert!(!md.contains("## Issues Found"));
        assert!(!md.contains("## Pages"));
        assert!(md.contains("5. "));
    }
}
