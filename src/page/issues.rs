//! Per-page structural issue detection
//!
//! These checks only look at a single page. Defects that need the whole
//! corpus (duplicates, scoring) belong to the auditor.

use crate::page::{Issue, IssueCode, PageRecord, Severity};

/// Pages with fewer visible words are considered thin
pub const MIN_WORD_COUNT: usize = 300;

/// Pages with fewer internal links are poorly connected
pub const MIN_INTERNAL_LINKS: usize = 3;

/// Detects structural defects visible at parse time
pub fn detect_issues(page: &PageRecord) -> Vec<Issue> {
    let mut issues = Vec::new();

    if page.title.is_none() {
        issues.push(Issue::new(
            IssueCode::MissingTitle,
            Severity::Critical,
            "Page has no <title>",
        ));
    }

    if page.meta.description.is_none() {
        issues.push(Issue::new(
            IssueCode::MissingDescription,
            Severity::Important,
            "Page has no meta description",
        ));
    }

    match page.h1().len() {
        0 => issues.push(Issue::new(
            IssueCode::MissingH1,
            Severity::Important,
            "Page has no <h1>",
        )),
        1 => {}
        n => issues.push(Issue::new(
            IssueCode::MultipleH1,
            Severity::Opportunity,
            format!("Page has {} <h1> elements", n),
        )),
    }

    let missing_alt = page.images_missing_alt();
    if missing_alt > 0 {
        issues.push(Issue::new(
            IssueCode::MissingAltText,
            Severity::Important,
            format!("{} of {} images lack alt text", missing_alt, page.images.len()),
        ));
    }

    if let Some(level) = broken_heading_level(page) {
        issues.push(Issue::new(
            IssueCode::HeadingHierarchy,
            Severity::Minor,
            format!("<h{}> used without a preceding <h{}>", level, level - 1),
        ));
    }

    if page.word_count < MIN_WORD_COUNT {
        issues.push(Issue::new(
            IssueCode::ThinContent,
            Severity::Important,
            format!(
                "Only {} words of visible text (minimum {})",
                page.word_count, MIN_WORD_COUNT
            ),
        ));
    }

    if page.internal_links.len() < MIN_INTERNAL_LINKS {
        issues.push(Issue::new(
            IssueCode::FewInternalLinks,
            Severity::Opportunity,
            format!(
                "Only {} internal links (minimum {})",
                page.internal_links.len(),
                MIN_INTERNAL_LINKS
            ),
        ));
    }

    issues
}

/// Returns the first heading level present whose parent level is absent
fn broken_heading_level(page: &PageRecord) -> Option<usize> {
    (2..=6).find(|&level| {
        !page.headings[level - 1].is_empty() && page.headings[level - 2].is_empty()
    })
}
