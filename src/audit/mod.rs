//! Site-wide SEO audit
//!
//! Turns the corpus of a finished crawl into an [`AuditResult`]: an overall
//! score, per-category scores, issues bucketed by severity and a list of
//! recommendations. The result is built once and never modified.

mod checks;
mod scoring;

pub use checks::{
    Check, SiteContext, CHECKS, DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, LARGE_PAGE_BYTES,
    SLOW_RESPONSE_MS, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
pub use scoring::{category_scores, page_category_scores, page_score, CategoryScores};

use crate::page::{Corpus, IssueCode, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// Minimum number of recommendations an audit always carries
pub const MIN_RECOMMENDATIONS: usize = 5;

/// One defect type and every page it was observed on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditIssue {
    pub code: IssueCode,
    pub title: String,
    pub description: String,
    pub affected_urls: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Issues grouped by severity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueBuckets {
    pub critical: Vec<AuditIssue>,
    pub important: Vec<AuditIssue>,
    pub opportunity: Vec<AuditIssue>,
    pub minor: Vec<AuditIssue>,
    pub passed: Vec<AuditIssue>,
}

impl IssueBuckets {
    pub fn get(&self, severity: Severity) -> &[AuditIssue] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Important => &self.important,
            Severity::Opportunity => &self.opportunity,
            Severity::Minor => &self.minor,
            Severity::Passed => &self.passed,
        }
    }

    fn get_mut(&mut self, severity: Severity) -> &mut Vec<AuditIssue> {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Important => &mut self.important,
            Severity::Opportunity => &mut self.opportunity,
            Severity::Minor => &mut self.minor,
            Severity::Passed => &mut self.passed,
        }
    }

    /// Finds an issue by code in any bucket
    pub fn find(&self, code: IssueCode) -> Option<(Severity, &AuditIssue)> {
        Severity::all().into_iter().find_map(|severity| {
            self.get(severity)
                .iter()
                .find(|i| i.code == code)
                .map(|i| (severity, i))
        })
    }

    /// Issues that affect at least one page, most severe first
    pub fn failing(&self) -> impl Iterator<Item = &AuditIssue> {
        self.critical
            .iter()
            .chain(&self.important)
            .chain(&self.opportunity)
            .chain(&self.minor)
    }
}

/// Totals over the audited corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditSummary {
    pub total_pages: usize,
    /// Sum of affected pages over every failing issue
    pub total_issues: usize,
    pub critical: usize,
    pub important: usize,
    pub opportunity: usize,
    pub minor: usize,
    pub passed: usize,
    pub average_word_count: usize,
    pub average_response_ms: u64,
}

/// Site-wide audit of one crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditResult {
    /// Unweighted mean of the page scores, 0 for an empty corpus
    pub score: u8,
    pub category_scores: CategoryScores,
    pub issues: IssueBuckets,
    pub recommendations: Vec<String>,
    pub summary: AuditSummary,
    pub page_scores: BTreeMap<String, u8>,
}

/// Audits a crawl corpus
pub fn audit(corpus: &Corpus) -> AuditResult {
    let site = SiteContext::new(corpus);

    let mut issues = IssueBuckets::default();
    for check in CHECKS {
        let affected_urls: Vec<String> = corpus
            .values()
            .filter(|page| (check.affects)(page, &site))
            .map(|page| page.url.clone())
            .collect();

        let severity = if affected_urls.is_empty() {
            Severity::Passed
        } else {
            check.severity
        };
        tracing::debug!(
            "Check {}: {} affected pages ({})",
            check.code,
            affected_urls.len(),
            severity
        );

        issues.get_mut(severity).push(AuditIssue {
            code: check.code,
            title: check.title.to_string(),
            description: check.description.to_string(),
            affected_urls,
            recommendations: vec![check.recommendation.to_string()],
        });
    }

    let recommendations = collect_recommendations(&issues);

    let page_scores: BTreeMap<String, u8> = corpus
        .iter()
        .map(|(url, page)| (url.clone(), page_score(page)))
        .collect();
    let score = scoring::mean(page_scores.values().copied());

    let summary = summarize(corpus, &issues);

    tracing::info!(
        "Audit complete: score {} over {} pages, {} failing checks",
        score,
        summary.total_pages,
        summary.critical + summary.important + summary.opportunity + summary.minor
    );

    AuditResult {
        score,
        category_scores: category_scores(corpus),
        issues,
        recommendations,
        summary,
        page_scores,
    }
}

/// Recommendations of failing issues, deduplicated, padded with generic advice
fn collect_recommendations(issues: &IssueBuckets) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();

    for recommendation in issues.failing().flat_map(|i| i.recommendations.iter()) {
        if !recommendations.contains(recommendation) {
            recommendations.push(recommendation.clone());
        }
    }

    for generic in checks::GENERIC_RECOMMENDATIONS {
        if recommendations.len() >= MIN_RECOMMENDATIONS {
            break;
        }
        if !recommendations.iter().any(|r| r == generic) {
            recommendations.push(generic.to_string());
        }
    }

    recommendations
}

fn summarize(corpus: &Corpus, issues: &IssueBuckets) -> AuditSummary {
    let total_pages = corpus.len();
    let (average_word_count, average_response_ms) = if total_pages == 0 {
        (0, 0)
    } else {
        let words: usize = corpus.values().map(|p| p.word_count).sum();
        let latency: u64 = corpus.values().map(|p| p.latency_ms).sum();
        (words / total_pages, latency / total_pages as u64)
    };

    AuditSummary {
        total_pages,
        total_issues: issues.failing().map(|i| i.affected_urls.len()).sum(),
        critical: issues.critical.len(),
        important: issues.important.len(),
        opportunity: issues.opportunity.len(),
        minor: issues.minor.len(),
        passed: issues.passed.len(),
        average_word_count,
        average_response_ms,
    }
}
