//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier with its admission rules and page budget
//! - HTTP fetching with retry logic
//! - Turning fetched HTML into page records
//! - Overall crawl coordination, control and progress reporting

mod control;
mod coordinator;
mod fetcher;
mod frontier;
mod processor;
mod progress;

pub use control::CrawlHandle;
pub use coordinator::{run, Coordinator, CrawlMetadata, CrawlOutcome, CrawlResult, FailedUrl};
pub use fetcher::{
    build_http_client, fetch_url, fetch_with_retries, is_html_content_type, FetchResult,
    FetchedPage,
};
pub use frontier::{Admission, Frontier, FrontierEntry};
pub use processor::{process_page, ProcessedPage};
pub use progress::{CrawlProgress, CrawlStage, ProgressSink};
