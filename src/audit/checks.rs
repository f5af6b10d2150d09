//! Site-wide issue checks
//!
//! Every check is a row in [`CHECKS`]: an issue code, its severity, the
//! wording shown to consumers and a predicate over one page in the context
//! of the whole corpus.

use crate::page::{Corpus, IssueCode, PageRecord, Severity};
use std::collections::HashMap;

// ===== Thresholds =====

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 70;
pub const DESCRIPTION_MIN_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 160;

/// Responses slower than this are flagged
pub const SLOW_RESPONSE_MS: u64 = 3_000;

/// Documents larger than this are flagged
pub const LARGE_PAGE_BYTES: usize = 500 * 1024;

/// Facts about the corpus needed by cross-page checks
pub struct SiteContext {
    title_counts: HashMap<String, usize>,
    description_counts: HashMap<String, usize>,
}

fn duplicate_key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl SiteContext {
    pub fn new(corpus: &Corpus) -> Self {
        let mut title_counts = HashMap::new();
        let mut description_counts = HashMap::new();
        for page in corpus.values() {
            if let Some(title) = &page.title {
                *title_counts.entry(duplicate_key(title)).or_insert(0) += 1;
            }
            if let Some(description) = &page.meta.description {
                *description_counts
                    .entry(duplicate_key(description))
                    .or_insert(0) += 1;
            }
        }
        Self {
            title_counts,
            description_counts,
        }
    }

    fn title_is_duplicated(&self, page: &PageRecord) -> bool {
        page.title.as_deref().map_or(false, |t| {
            self.title_counts.get(&duplicate_key(t)).copied().unwrap_or(0) > 1
        })
    }

    fn description_is_duplicated(&self, page: &PageRecord) -> bool {
        page.meta.description.as_deref().map_or(false, |d| {
            self.description_counts
                .get(&duplicate_key(d))
                .copied()
                .unwrap_or(0)
                > 1
        })
    }
}

pub fn title_length_ok(title: &str) -> bool {
    (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title.trim().chars().count())
}

pub fn description_length_ok(description: &str) -> bool {
    (DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&description.trim().chars().count())
}

/// One auditable defect type
pub struct Check {
    pub code: IssueCode,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
    pub affects: fn(&PageRecord, &SiteContext) -> bool,
}

/// Every check the auditor runs, most severe first
pub const CHECKS: &[Check] = &[
    Check {
        code: IssueCode::MissingTitle,
        severity: Severity::Critical,
        title: "Missing page titles",
        description: "Pages without a <title> element.",
        recommendation: "Add a unique, descriptive <title> of 10-70 characters to every page.",
        affects: |page, _| page.has_issue(IssueCode::MissingTitle),
    },
    Check {
        code: IssueCode::MissingDescription,
        severity: Severity::Important,
        title: "Missing meta descriptions",
        description: "Pages without a meta description.",
        recommendation: "Write a meta description of 50-160 characters that summarises each page.",
        affects: |page, _| page.has_issue(IssueCode::MissingDescription),
    },
    Check {
        code: IssueCode::MissingH1,
        severity: Severity::Important,
        title: "Missing H1 headings",
        description: "Pages without an <h1> element.",
        recommendation: "Give every page exactly one <h1> that states its main topic.",
        affects: |page, _| page.has_issue(IssueCode::MissingH1),
    },
    Check {
        code: IssueCode::MissingAltText,
        severity: Severity::Important,
        title: "Images without alt text",
        description: "Pages containing images with a missing or empty alt attribute.",
        recommendation: "Describe every meaningful image with a concise alt attribute.",
        affects: |page, _| page.has_issue(IssueCode::MissingAltText),
    },
    Check {
        code: IssueCode::ThinContent,
        severity: Severity::Important,
        title: "Thin content",
        description: "Pages with fewer than 300 words of visible text.",
        recommendation: "Expand thin pages to at least 300 words of useful, original content.",
        affects: |page, _| page.has_issue(IssueCode::ThinContent),
    },
    Check {
        code: IssueCode::DuplicateTitle,
        severity: Severity::Important,
        title: "Duplicate titles",
        description: "Pages sharing their title with another page.",
        recommendation: "Make every page title unique to the content of that page.",
        affects: |page, site| site.title_is_duplicated(page),
    },
    Check {
        code: IssueCode::MissingViewport,
        severity: Severity::Important,
        title: "Missing viewport meta tag",
        description: "Pages without a viewport meta tag render poorly on mobile devices.",
        recommendation: "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> to every page.",
        affects: |page, _| page.meta.viewport.is_none(),
    },
    Check {
        code: IssueCode::Noindex,
        severity: Severity::Important,
        title: "Pages excluded from indexing",
        description: "Pages carrying a noindex robots directive.",
        recommendation: "Remove noindex from pages that should appear in search results.",
        affects: |page, _| page.meta.is_noindex(),
    },
    Check {
        code: IssueCode::MultipleH1,
        severity: Severity::Opportunity,
        title: "Multiple H1 headings",
        description: "Pages with more than one <h1> element.",
        recommendation: "Keep a single <h1> per page and demote the others to <h2>.",
        affects: |page, _| page.has_issue(IssueCode::MultipleH1),
    },
    Check {
        code: IssueCode::FewInternalLinks,
        severity: Severity::Opportunity,
        title: "Few internal links",
        description: "Pages linking to fewer than 3 other pages of the site.",
        recommendation: "Link related pages to each other so crawlers and readers can reach them.",
        affects: |page, _| page.has_issue(IssueCode::FewInternalLinks),
    },
    Check {
        code: IssueCode::DuplicateDescription,
        severity: Severity::Opportunity,
        title: "Duplicate meta descriptions",
        description: "Pages sharing their meta description with another page.",
        recommendation: "Write a distinct meta description for every page.",
        affects: |page, site| site.description_is_duplicated(page),
    },
    Check {
        code: IssueCode::SlowResponse,
        severity: Severity::Opportunity,
        title: "Slow responses",
        description: "Pages that took longer than 3 seconds to download.",
        recommendation: "Reduce server response time with caching and lighter pages.",
        affects: |page, _| page.latency_ms > SLOW_RESPONSE_MS,
    },
    Check {
        code: IssueCode::LargePage,
        severity: Severity::Opportunity,
        title: "Oversized pages",
        description: "HTML documents larger than 500 KB.",
        recommendation: "Trim inline scripts, styles and markup from oversized documents.",
        affects: |page, _| page.content_length > LARGE_PAGE_BYTES,
    },
    Check {
        code: IssueCode::InsecureHttp,
        severity: Severity::Opportunity,
        title: "Pages served over HTTP",
        description: "Pages not served over HTTPS.",
        recommendation: "Serve the whole site over HTTPS and redirect HTTP requests to it.",
        affects: |page, _| !page.is_https(),
    },
    Check {
        code: IssueCode::HeadingHierarchy,
        severity: Severity::Minor,
        title: "Broken heading hierarchy",
        description: "Pages that skip a heading level.",
        recommendation: "Nest headings in order (h1, then h2, then h3) without skipping levels.",
        affects: |page, _| page.has_issue(IssueCode::HeadingHierarchy),
    },
    Check {
        code: IssueCode::TitleLength,
        severity: Severity::Minor,
        title: "Title length out of range",
        description: "Titles shorter than 10 or longer than 70 characters.",
        recommendation: "Keep titles between 10 and 70 characters so they are not truncated.",
        affects: |page, _| page.title.as_deref().map_or(false, |t| !title_length_ok(t)),
    },
    Check {
        code: IssueCode::DescriptionLength,
        severity: Severity::Minor,
        title: "Meta description length out of range",
        description: "Meta descriptions shorter than 50 or longer than 160 characters.",
        recommendation: "Keep meta descriptions between 50 and 160 characters.",
        affects: |page, _| {
            page.meta
                .description
                .as_deref()
                .map_or(false, |d| !description_length_ok(d))
        },
    },
    Check {
        code: IssueCode::MissingCanonical,
        severity: Severity::Minor,
        title: "Missing canonical links",
        description: "Pages without a <link rel=\"canonical\">.",
        recommendation: "Declare a canonical URL on every page to consolidate duplicate URLs.",
        affects: |page, _| page.meta.canonical.is_none(),
    },
];

/// Generic advice appended when the site has few distinct problems
pub const GENERIC_RECOMMENDATIONS: &[&str] = &[
    "Submit the generated sitemap.xml to search engines and reference it from robots.txt.",
    "Review titles and meta descriptions regularly so they match current page content.",
    "Add structured data (schema.org) to describe key pages to search engines.",
    "Monitor page speed and mobile usability after every release.",
    "Publish fresh, in-depth content on a regular schedule.",
    "Check for broken links and redirect chains after site changes.",
];
