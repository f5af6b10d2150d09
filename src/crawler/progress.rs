//! Progress events for crawl observers
//!
//! Events go through a bounded channel with `try_send`: a slow or absent
//! consumer drops events instead of slowing the crawl.

use serde::Serialize;
use tokio::sync::mpsc;

/// Pipeline stage a progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStage {
    Sitemap,
    Crawling,
    Analyzing,
}

/// A snapshot of crawl progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlProgress {
    /// Fetches finished so far, successful or not
    pub pages_scanned: usize,
    pub current_url: Option<String>,
    /// Dispatched plus queued URLs, capped at the page budget
    pub total_urls_estimate: usize,
    pub stage: CrawlStage,
}

/// Sending half of the progress channel
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<CrawlProgress>>,
}

impl ProgressSink {
    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(tx: mpsc::Sender<CrawlProgress>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Creates a sink and the receiver its events arrive on
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CrawlProgress>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Publishes an event without waiting; full or closed channels drop it
    pub fn emit(&self, progress: CrawlProgress) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.try_send(progress) {
                tracing::trace!("Progress event dropped: {}", e);
            }
        }
    }
}
