//! Page records and per-page issues
//!
//! A [`PageRecord`] is written once when a fetch completes and is read-only
//! afterwards. The corpus of a crawl maps each normalized URL to its record.

mod extract;
mod issues;

pub use extract::{extract_page, resolve_link, ExtractedPage};
pub use issues::{detect_issues, MIN_INTERNAL_LINKS, MIN_WORD_COUNT};

#[cfg(test)]
pub(crate) use issues::tests::clean_page;

use crate::url::PageType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Successfully fetched pages keyed by normalized URL
pub type Corpus = BTreeMap<String, PageRecord>;

/// Issue severity, from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Important,
    Opportunity,
    Minor,
    Passed,
}

impl Severity {
    pub fn all() -> [Severity; 5] {
        [
            Self::Critical,
            Self::Important,
            Self::Opportunity,
            Self::Minor,
            Self::Passed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Opportunity => "opportunity",
            Self::Minor => "minor",
            Self::Passed => "passed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable identifier of a detected defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // ===== Per-page structural defects =====
    MissingTitle,
    MissingDescription,
    MissingH1,
    MultipleH1,
    MissingAltText,
    HeadingHierarchy,
    ThinContent,
    FewInternalLinks,

    // ===== Defects found by the auditor =====
    DuplicateTitle,
    DuplicateDescription,
    TitleLength,
    DescriptionLength,
    MissingCanonical,
    MissingViewport,
    SlowResponse,
    LargePage,
    Noindex,
    InsecureHttp,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::MissingDescription => "missing_description",
            Self::MissingH1 => "missing_h1",
            Self::MultipleH1 => "multiple_h1",
            Self::MissingAltText => "missing_alt_text",
            Self::HeadingHierarchy => "heading_hierarchy",
            Self::ThinContent => "thin_content",
            Self::FewInternalLinks => "few_internal_links",
            Self::DuplicateTitle => "duplicate_title",
            Self::DuplicateDescription => "duplicate_description",
            Self::TitleLength => "title_length",
            Self::DescriptionLength => "description_length",
            Self::MissingCanonical => "missing_canonical",
            Self::MissingViewport => "missing_viewport",
            Self::SlowResponse => "slow_response",
            Self::LargePage => "large_page",
            Self::Noindex => "noindex",
            Self::InsecureHttp => "insecure_http",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A defect observed on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub description: String,
    pub severity: Severity,
}

impl Issue {
    pub fn new(code: IssueCode, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            severity,
        }
    }
}

/// Meta information read from the document head
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub canonical: Option<String>,
    pub robots: Option<String>,
    pub viewport: Option<String>,
    /// Open Graph `property` / `content` pairs in document order
    pub open_graph: Vec<(String, String)>,
}

impl PageMeta {
    /// True if a `robots` meta directive contains `noindex`
    pub fn is_noindex(&self) -> bool {
        self.robots
            .as_deref()
            .map_or(false, |r| r.to_lowercase().contains("noindex"))
    }
}

/// An image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    pub src: String,
    pub alt: Option<String>,
}

impl PageImage {
    /// True if the alt attribute is absent or blank
    pub fn missing_alt(&self) -> bool {
        self.alt.as_deref().map_or(true, |a| a.trim().is_empty())
    }
}

/// Heading texts per level, index 0 holding H1
pub type Headings = [Vec<String>; 6];

/// Structured content of one successfully fetched page
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: String,
    /// URL the server answered from after redirects
    pub final_url: String,
    pub status: u16,
    pub depth: u32,
    pub page_type: PageType,
    pub content_type: String,
    pub title: Option<String>,
    pub lang: Option<String>,
    pub meta: PageMeta,
    pub headings: Headings,
    pub images: Vec<PageImage>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub has_structured_data: bool,
    pub word_count: usize,
    pub content_length: usize,
    pub latency_ms: u64,
    pub issues: Vec<Issue>,
}

impl PageRecord {
    pub fn h1(&self) -> &[String] {
        &self.headings[0]
    }

    pub fn has_issue(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Number of images without usable alt text
    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|i| i.missing_alt()).count()
    }

    pub fn is_https(&self) -> bool {
        self.url.starts_with("https://")
    }
}
