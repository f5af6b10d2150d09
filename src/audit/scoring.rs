//! Page and category scoring
//!
//! Every score starts at 100 and loses fixed penalties per defect, clamped
//! to `0..=100`.

use crate::audit::checks::{
    description_length_ok, title_length_ok, LARGE_PAGE_BYTES, SLOW_RESPONSE_MS,
};
use crate::page::{Corpus, IssueCode, PageRecord};
use serde::Serialize;

const PERFECT: i32 = 100;

/// Alt text penalty per image and its cap
const ALT_PENALTY_PER_IMAGE: i32 = 2;
const ALT_PENALTY_CAP: i32 = 10;

const MODERATE_RESPONSE_MS: u64 = 1_000;
const MODERATE_PAGE_BYTES: usize = 100 * 1024;

/// Scores of one page or of the whole site per concern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryScores {
    pub seo: u8,
    pub technical: u8,
    pub content: u8,
    pub performance: u8,
    pub mobile: u8,
}

fn clamp(score: i32) -> u8 {
    score.clamp(0, PERFECT) as u8
}

fn alt_penalty(page: &PageRecord) -> i32 {
    let missing = page.images_missing_alt() as i32;
    (missing * ALT_PENALTY_PER_IMAGE).min(ALT_PENALTY_CAP)
}

fn title_length_bad(page: &PageRecord) -> bool {
    page.title.as_deref().map_or(false, |t| !title_length_ok(t))
}

fn description_length_bad(page: &PageRecord) -> bool {
    page.meta
        .description
        .as_deref()
        .map_or(false, |d| !description_length_ok(d))
}

/// Overall score of a single page
pub fn page_score(page: &PageRecord) -> u8 {
    let mut score = PERFECT;

    if page.title.is_none() {
        score -= 15;
    }
    if page.meta.description.is_none() {
        score -= 10;
    }
    if page.has_issue(IssueCode::MissingH1) || page.has_issue(IssueCode::MultipleH1) {
        score -= 10;
    }
    if page.has_issue(IssueCode::ThinContent) {
        score -= 10;
    }
    score -= alt_penalty(page);

    let minor = [
        page.has_issue(IssueCode::HeadingHierarchy),
        page.has_issue(IssueCode::FewInternalLinks),
        title_length_bad(page),
        description_length_bad(page),
        page.meta.canonical.is_none(),
        page.meta.viewport.is_none(),
        page.latency_ms > SLOW_RESPONSE_MS,
        page.meta.is_noindex(),
        page.content_length > LARGE_PAGE_BYTES,
    ];
    score -= 5 * minor.iter().filter(|&&hit| hit).count() as i32;

    clamp(score)
}

fn seo_score(page: &PageRecord) -> u8 {
    let mut score = PERFECT;
    if page.title.is_none() {
        score -= 15;
    }
    if page.meta.description.is_none() {
        score -= 10;
    }
    if page.has_issue(IssueCode::MissingH1) || page.has_issue(IssueCode::MultipleH1) {
        score -= 10;
    }
    if title_length_bad(page) {
        score -= 5;
    }
    if description_length_bad(page) {
        score -= 5;
    }
    if page.meta.canonical.is_none() {
        score -= 5;
    }
    clamp(score)
}

fn technical_score(page: &PageRecord) -> u8 {
    let mut score = PERFECT;
    if page.meta.is_noindex() {
        score -= 15;
    }
    if !page.is_https() {
        score -= 10;
    }
    if page.meta.canonical.is_none() {
        score -= 5;
    }
    if page.has_issue(IssueCode::HeadingHierarchy) {
        score -= 5;
    }
    clamp(score)
}

fn content_score(page: &PageRecord) -> u8 {
    let mut score = PERFECT;
    if page.has_issue(IssueCode::ThinContent) {
        score -= 10;
    }
    score -= alt_penalty(page);
    if page.has_issue(IssueCode::FewInternalLinks) {
        score -= 5;
    }
    if page.has_issue(IssueCode::HeadingHierarchy) {
        score -= 5;
    }
    clamp(score)
}

fn performance_score(page: &PageRecord) -> u8 {
    let mut score = PERFECT;
    if page.latency_ms > SLOW_RESPONSE_MS {
        score -= 20;
    } else if page.latency_ms > MODERATE_RESPONSE_MS {
        score -= 10;
    }
    if page.content_length > LARGE_PAGE_BYTES {
        score -= 15;
    } else if page.content_length > MODERATE_PAGE_BYTES {
        score -= 5;
    }
    clamp(score)
}

fn mobile_score(page: &PageRecord) -> u8 {
    match page.meta.viewport.as_deref() {
        None => clamp(PERFECT - 30),
        Some(v) if !v.to_lowercase().replace(' ', "").contains("width=device-width") => {
            clamp(PERFECT - 10)
        }
        Some(_) => clamp(PERFECT),
    }
}

/// Category scores of a single page
pub fn page_category_scores(page: &PageRecord) -> CategoryScores {
    CategoryScores {
        seo: seo_score(page),
        technical: technical_score(page),
        content: content_score(page),
        performance: performance_score(page),
        mobile: mobile_score(page),
    }
}

/// Unweighted mean rounded to the nearest integer, 0 for no values
pub fn mean(values: impl IntoIterator<Item = u8>) -> u8 {
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(s, c), v| (s + v as u64, c + 1));
    if count == 0 {
        return 0;
    }
    ((sum as f64 / count as f64).round() as u64).min(PERFECT as u64) as u8
}

/// Site-wide category scores, the mean of every page's scores
pub fn category_scores(corpus: &Corpus) -> CategoryScores {
    let per_page: Vec<CategoryScores> = corpus.values().map(page_category_scores).collect();
    CategoryScores {
        seo: mean(per_page.iter().map(|s| s.seo)),
        technical: mean(per_page.iter().map(|s| s.technical)),
        content: mean(per_page.iter().map(|s| s.content)),
        performance: mean(per_page.iter().map(|s| s.performance)),
        mobile: mean(per_page.iter().map(|s| s.mobile)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{clean_page, detect_issues, PageImage};

    fn reissue(mut page: PageRecord) -> PageRecord {
        page.issues = detect_issues(&page);
        page
    }

    #[test]
    fn test_clean_page_is_perfect() {
        let page = clean_page("https://example.com/");
        assert_eq!(page_score(&page), 100);
        assert_eq!(
            page_category_scores(&page),
            CategoryScores {
                seo: 100,
                technical: 100,
                content: 100,
                performance: 100,
                mobile: 100,
            }
        );
    }

    #[test]
    fn test_missing_description_costs_ten() {
        let mut page = clean_page("https://example.com/");
        page.meta.description = None;
        let page = reissue(page);
        assert_eq!(page_score(&page), 90);
        assert_eq!(seo_score(&page), 90);
    }

    #[test]
    fn test_alt_penalty_is_capped() {
        let mut page = clean_page("https://example.com/");
        for i in 0..8 {
            page.images.push(PageImage {
                src: format!("/img{}.png", i),
                alt: None,
            });
        }
        let page = reissue(page);
        assert_eq!(page_score(&page), 90);
        assert_eq!(content_score(&page), 90);
    }

    #[test]
    fn test_every_penalty_stacks() {
        let mut page = clean_page("http://example.com/");
        page.title = None;
        page.meta = Default::default();
        page.meta.robots = Some("noindex".to_string());
        page.headings = Default::default();
        page.headings[3] = vec!["deep".to_string()];
        page.word_count = 10;
        page.internal_links.clear();
        page.latency_ms = 10_000;
        page.content_length = 2_000_000;
        page.images = (0..10)
            .map(|i| PageImage {
                src: format!("/{}.png", i),
                alt: None,
            })
            .collect();
        let page = reissue(page);

        // 100 - 15 - 10 - 10 - 10 - 10 - 5 * 7 = 10, with title/desc length
        // not applicable since both are absent
        assert_eq!(page_score(&page), 10);
        assert_eq!(technical_score(&page), 65);
        assert_eq!(performance_score(&page), 65);
        assert_eq!(mobile_score(&page), 70);
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp(-40), 0);
        assert_eq!(clamp(0), 0);
        assert_eq!(clamp(55), 55);
        assert_eq!(clamp(PERFECT), 100);
        assert_eq!(clamp(250), 100);
        assert_eq!(clamp(i32::MIN), 0);
        assert_eq!(clamp(i32::MAX), 100);
    }

    #[test]
    fn test_performance_tiers() {
        let mut page = clean_page("https://example.com/");
        page.latency_ms = 1_500;
        page.content_length = 200 * 1024;
        assert_eq!(performance_score(&page), 85);
    }

    #[test]
    fn test_viewport_without_device_width() {
        let mut page = clean_page("https://example.com/");
        page.meta.viewport = Some("initial-scale=1".to_string());
        assert_eq!(mobile_score(&page), 90);
    }

    #[test]
    fn test_mean_rounds_and_handles_empty() {
        assert_eq!(mean(Vec::new()), 0);
        assert_eq!(mean(vec![100, 90]), 95);
        assert_eq!(mean(vec![100, 100, 99]), 100);
        assert_eq!(mean(vec![0, 1]), 1);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        assert_eq!(category_scores(&Corpus::new()), CategoryScores::default());
    }
}
