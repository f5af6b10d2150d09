//! URL frontier: admission, priority ordering and dispatch
//!
//! This module handles:
//! - Priority queue management for URLs to crawl
//! - Deduplication against every URL already admitted
//! - Depth, same-site, deny-list and robots.txt admission checks
//! - The visited set and page budget
//!
//! The frontier has a single owner (the coordinator loop), so admission,
//! the visited check and dispatch cannot interleave.

use crate::config::CrawlTask;
use crate::robots::RobotsCache;
use crate::url::{deny_reason, priority, same_site, NormalizedUrl};
use reqwest::Client;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// A URL queued for fetching with priority information
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// The URL to fetch
    pub url: NormalizedUrl,

    /// Link distance from the seed (sitemap entries are depth 0)
    pub depth: u32,

    /// Priority value (higher is dispatched first)
    pub priority: u32,

    /// Whether the URL came from the site's sitemap
    pub from_sitemap: bool,

    /// Admission order, used to break priority ties
    sequence: u64,
}

// Higher priority first; equal priorities in admission order
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// Already queued or dispatched
    Duplicate,
    TooDeep,
    OffSite,
    Denied(&'static str),
    RobotsDisallowed,
}

/// The crawl frontier
pub struct Frontier {
    /// Pending URLs, highest priority first
    queue: BinaryHeap<FrontierEntry>,

    /// Every URL ever admitted (queued or dispatched)
    seen: HashSet<NormalizedUrl>,

    /// URLs dispatched so far
    visited: HashSet<NormalizedUrl>,

    /// Dispatch log in dispatch order
    dispatched: Vec<NormalizedUrl>,

    /// Per-origin robots.txt policies
    robots: RobotsCache,

    site_host: String,
    user_agent: String,
    max_depth: u32,
    max_pages: usize,
    follow_external_links: bool,
    next_sequence: u64,
}

impl Frontier {
    /// Creates an empty frontier for a crawl
    ///
    /// # Arguments
    ///
    /// * `task` - The crawl's budgets and link policy
    /// * `site_host` - Host of the seed URL
    /// * `user_agent` - Identity used for robots.txt group matching
    pub fn new(task: &CrawlTask, site_host: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            dispatched: Vec::new(),
            robots: RobotsCache::new(),
            site_host: site_host.into(),
            user_agent: user_agent.into(),
            max_depth: task.max_depth,
            max_pages: task.max_pages,
            follow_external_links: task.follow_external_links,
            next_sequence: 0,
        }
    }

    pub fn robots(&self) -> &RobotsCache {
        &self.robots
    }

    pub fn robots_mut(&mut self) -> &mut RobotsCache {
        &mut self.robots
    }

    /// Checks everything except robots.txt
    fn precheck(&self, url: &NormalizedUrl, depth: u32) -> Option<Admission> {
        if self.seen.contains(url) {
            return Some(Admission::Duplicate);
        }
        if depth > self.max_depth {
            return Some(Admission::TooDeep);
        }
        if !self.follow_external_links && !same_site(url.host(), &self.site_host) {
            return Some(Admission::OffSite);
        }
        if let Some(reason) = deny_reason(url.as_url()) {
            return Some(Admission::Denied(reason));
        }
        None
    }

    /// Offers a URL using only robots.txt policies already cached
    ///
    /// Origins without a cached policy are allowed.
    pub fn enqueue(&mut self, url: NormalizedUrl, depth: u32, from_sitemap: bool) -> Admission {
        if let Some(rejection) = self.precheck(&url, depth) {
            return rejection;
        }
        if !self.robots.is_allowed(url.as_url(), &self.user_agent) {
            return Admission::RobotsDisallowed;
        }
        self.push(url, depth, from_sitemap);
        Admission::Queued
    }

    /// Offers a URL, fetching its origin's robots.txt on first use
    pub async fn admit(
        &mut self,
        client: &Client,
        url: NormalizedUrl,
        depth: u32,
        from_sitemap: bool,
    ) -> Admission {
        if let Some(rejection) = self.precheck(&url, depth) {
            tracing::trace!("Not admitting {}: {:?}", url, rejection);
            return rejection;
        }
        if !self.robots.contains(url.as_url()) {
            self.robots.get_or_fetch(client, url.as_url()).await;
        }
        let admission = self.enqueue(url.clone(), depth, from_sitemap);
        tracing::trace!("Admission of {}: {:?}", url, admission);
        admission
    }

    fn push(&mut self, url: NormalizedUrl, depth: u32, from_sitemap: bool) {
        let entry = FrontierEntry {
            priority: priority(url.as_str(), depth, from_sitemap),
            url: url.clone(),
            depth,
            from_sitemap,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.seen.insert(url);
        self.queue.push(entry);
    }

    /// Whether the page budget has been used up
    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    /// Whether a dispatch is currently possible
    pub fn can_dispatch(&self) -> bool {
        !self.queue.is_empty() && !self.budget_exhausted()
    }

    /// Takes the highest-priority URL and marks it visited
    ///
    /// Returns `None` when the queue is empty or the budget is exhausted.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        if self.budget_exhausted() {
            return None;
        }
        while let Some(entry) = self.queue.pop() {
            if self.visited.insert(entry.url.clone()) {
                self.dispatched.push(entry.url.clone());
                return Some(entry);
            }
        }
        None
    }

    /// Returns the number of URLs waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &NormalizedUrl) -> bool {
        self.visited.contains(url)
    }

    /// Dispatched URLs in dispatch order
    pub fn dispatched(&self) -> &[NormalizedUrl] {
        &self.dispatched
    }

    /// Visited plus queued URLs, capped at the page budget
    pub fn estimate_total(&self) -> usize {
        (self.visited.len() + self.queue.len()).min(self.max_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::RobotsPolicy;
    use crate::url::normalize_url;

    const UA: &str = "TestAuditBot/1.0";

    fn task(max_pages: usize, max_depth: u32) -> CrawlTask {
        let mut task = CrawlTask::new("https://example.com/");
        task.max_pages = max_pages;
        task.max_depth = max_depth;
        task
    }

    fn url(s: &str) -> NormalizedUrl {
        normalize_url(s, None).unwrap()
    }

    fn frontier(max_pages: usize, max_depth: u32) -> Frontier {
        Frontier::new(&task(max_pages, max_depth), "example.com", UA)
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut f = frontier(10, 3);
        assert_eq!(f.enqueue(url("https://example.com/a"), 1, false), Admission::Queued);
        assert_eq!(
            f.enqueue(url("https://example.com/a/"), 1, false),
            Admission::Duplicate
        );
        assert_eq!(f.pending(), 1);

        let entry = f.next().unwrap();
        assert_eq!(
            f.enqueue(entry.url.clone(), 0, true),
            Admission::Duplicate
        );
        assert!(f.is_visited(&entry.url));
    }

    #[test]
    fn test_depth_limit() {
        let mut f = frontier(10, 2);
        assert_eq!(f.enqueue(url("https://example.com/a"), 2, false), Admission::Queued);
        assert_eq!(f.enqueue(url("https://example.com/b"), 3, false), Admission::TooDeep);
    }

    #[test]
    fn test_off_site_rejected_unless_following_external() {
        let mut f = frontier(10, 3);
        assert_eq!(f.enqueue(url("https://other.org/"), 1, false), Admission::OffSite);
        assert_eq!(
            f.enqueue(url("https://www.example.com/x"), 1, false),
            Admission::Queued
        );

        let mut open = task(10, 3);
        open.follow_external_links = true;
        let mut f = Frontier::new(&open, "example.com", UA);
        assert_eq!(f.enqueue(url("https://other.org/"), 1, false), Admission::Queued);
    }

    #[test]
    fn test_deny_list_applied() {
        let mut f = frontier(10, 3);
        assert!(matches!(
            f.enqueue(url("https://example.com/wp-admin/options"), 1, false),
            Admission::Denied(_)
        ));
        assert!(matches!(
            f.enqueue(url("https://example.com/file.zip"), 1, false),
            Admission::Denied(_)
        ));
    }

    #[test]
    fn test_robots_disallow_applied() {
        let mut f = frontier(10, 3);
        f.robots_mut().insert(
            url("https://example.com/").as_url(),
            RobotsPolicy::from_content("User-agent: *\nDisallow: /private/"),
        );
        assert_eq!(
            f.enqueue(url("https://example.com/private/x"), 1, false),
            Admission::RobotsDisallowed
        );
        assert_eq!(
            f.enqueue(url("https://example.com/public"), 1, false),
            Admission::Queued
        );
    }

    #[test]
    fn test_dispatch_order_by_priority_then_fifo() {
        let mut f = frontier(10, 3);
        f.enqueue(url("https://example.com/about"), 1, false); // 90
        f.enqueue(url("https://example.com/contact"), 1, false); // 90
        f.enqueue(url("https://example.com/category/x"), 1, false); // 105
        f.enqueue(url("https://example.com/team"), 0, true); // 120
        f.enqueue(url("https://example.com/"), 0, false); // 150

        let order: Vec<String> = std::iter::from_fn(|| f.next())
            .map(|e| e.url.into_string())
            .collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/",
                "https://example.com/team",
                "https://example.com/category/x",
                "https://example.com/about",
                "https://example.com/contact",
            ]
        );
    }

    #[test]
    fn test_budget_stops_dispatch() {
        let mut f = frontier(2, 3);
        for p in ["a", "b", "c", "d"] {
            f.enqueue(url(&format!("https://example.com/{}", p)), 1, false);
        }
        assert!(f.next().is_some());
        assert!(f.next().is_some());
        assert!(f.budget_exhausted());
        assert!(!f.can_dispatch());
        assert!(f.next().is_none());
        assert_eq!(f.visited_count(), 2);
        assert_eq!(f.pending(), 2);
        assert_eq!(f.estimate_total(), 2);
    }

    #[tokio::test]
    async fn test_admit_fetches_robots_once() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let base = url(&server.uri());
        let mut f = Frontier::new(&task(10, 3), base.host(), UA);
        let client = Client::new();

        assert_eq!(
            f.admit(&client, url(&format!("{}/private/data", server.uri())), 1, false)
                .await,
            Admission::RobotsDisallowed
        );
        assert_eq!(
            f.admit(&client, url(&format!("{}/blog", server.uri())), 1, false)
                .await,
            Admission::Queued
        );
        assert_eq!(f.robots().len(), 1);
    }
}
