//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier from the seed URL and the site's sitemaps
//! - Dispatching URLs to a bounded pool of fetch workers
//! - Recording page records and failures as workers complete
//! - Honouring pause, resume and cancel between dispatches
//!
//! The coordinator is the only writer of the frontier and the corpus.

use crate::config::{CrawlTask, UserAgentConfig};
use crate::crawler::control::CrawlHandle;
use crate::crawler::fetcher::{build_http_client, fetch_with_retries, FetchResult};
use crate::crawler::frontier::{Admission, Frontier, FrontierEntry};
use crate::crawler::processor::{process_page, ProcessedPage};
use crate::crawler::progress::{CrawlProgress, CrawlStage, ProgressSink};
use crate::page::Corpus;
use crate::sitemap::extract_seed_urls;
use crate::state::{ControlSignal, CrawlState};
use crate::url::{extract_domain, NormalizedUrl, UrlPolicy};
use crate::SumiError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Totals describing a finished crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlMetadata {
    /// URLs dispatched (`success_requests + failed_requests`)
    pub total_requests: usize,
    /// URLs that produced a page record
    pub success_requests: usize,
    /// URLs that failed after exhausting their retries
    pub failed_requests: usize,
    /// HTTP requests issued for pages, retries included
    pub http_attempts: u64,
    pub domain: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_time_ms: u64,
    /// URLs listed by the site's sitemaps
    pub sitemap_urls: usize,
    /// URLs refused admission by robots.txt
    pub robots_blocked: usize,
    pub final_state: CrawlState,
    /// Hash of the configuration file the run was started from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// A URL that could not be turned into a page record
#[derive(Debug, Clone, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub depth: u32,
    pub reason: String,
    pub attempts: u32,
}

/// Result of a crawl, as handed to consumers
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    /// Dispatched URLs in dispatch order
    pub urls: Vec<String>,
    pub visited_count: usize,
    pub page_count: usize,
    pub failures: Vec<FailedUrl>,
    pub metadata: CrawlMetadata,
}

/// Everything a crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub result: CrawlResult,
    /// Page records keyed by normalized URL
    pub corpus: Corpus,
    /// Raw HTML of every page in the corpus, by normalized URL
    pub documents: BTreeMap<String, String>,
    /// `lastmod` values read from the site's sitemaps
    pub sitemap_lastmods: HashMap<String, String>,
}

/// What a worker reports back for one dispatched URL
struct WorkerReport {
    entry: FrontierEntry,
    attempts: u32,
    outcome: Result<(ProcessedPage, String), String>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    task: CrawlTask,
    client: Client,
    user_agent: String,
    policy: UrlPolicy,
    handle: CrawlHandle,
    progress: ProgressSink,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `task` - The crawl's immutable configuration
    /// * `user_agent` - The crawler's identity
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SumiError)` - The HTTP client could not be built
    pub fn new(task: CrawlTask, user_agent: &UserAgentConfig) -> Result<Self, SumiError> {
        let client = build_http_client(user_agent, task.request_timeout)?;
        Ok(Self {
            task,
            client,
            user_agent: user_agent.user_agent_string(),
            policy: UrlPolicy::default(),
            handle: CrawlHandle::new(),
            progress: ProgressSink::disabled(),
        })
    }

    pub fn with_url_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Controls this crawl from another task
    pub fn handle(&self) -> CrawlHandle {
        self.handle.clone()
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// Per-URL failures never abort the crawl. A cancelled crawl still
    /// returns every page collected before cancellation.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The crawl finished, completely or partially
    /// * `Err(SumiError)` - The seed URL is unusable
    pub async fn run(self) -> Result<CrawlOutcome, SumiError> {
        let seed = self.policy.normalize(&self.task.seed_url, None)?;
        let domain = extract_domain(seed.as_url()).ok_or(crate::UrlError::MissingDomain)?;

        let start_time = Utc::now();
        let started = Instant::now();
        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {})",
            seed,
            self.task.max_pages,
            self.task.max_depth
        );

        let mut control = self.handle.subscribe();
        let mut frontier = Frontier::new(&self.task, domain.clone(), self.user_agent.clone());
        let mut run = RunState::default();

        self.seed_frontier(&mut frontier, &mut run, &seed).await;

        let delay = self.dispatch_delay(&frontier, &seed);
        tracing::debug!("Dispatch delay: {:?}", delay);

        let mut state = self.advance(CrawlState::Idle, CrawlState::Running);
        let mut in_flight: JoinSet<WorkerReport> = JoinSet::new();
        let mut last_dispatch: Option<Instant> = None;

        loop {
            state = self.apply_signal(state, *control.borrow_and_update());
            if state == CrawlState::Cancelled {
                break;
            }

            // Top up the worker pool
            while state.can_dispatch()
                && in_flight.len() < self.task.max_concurrent_requests
                && frontier.can_dispatch()
            {
                if let Some(last) = last_dispatch {
                    let wait = delay.saturating_sub(last.elapsed());
                    if !wait.is_zero() {
                        tokio::time::sleep(wait).await;
                    }
                }

                // Signals are checked before every dispatch
                state = self.apply_signal(state, *control.borrow_and_update());
                if !state.can_dispatch() {
                    break;
                }

                let entry = match frontier.next() {
                    Some(e) => e,
                    None => break,
                };
                last_dispatch = Some(Instant::now());
                tracing::debug!(
                    "Dispatching {} (depth {}, priority {})",
                    entry.url,
                    entry.depth,
                    entry.priority
                );
                self.spawn_worker(&mut in_flight, entry, &domain);
            }

            if state == CrawlState::Cancelled {
                break;
            }

            if in_flight.is_empty() {
                if state == CrawlState::Paused {
                    tracing::info!("Crawl paused with nothing in flight, waiting");
                    wait_for_change(&mut control).await;
                    continue;
                }
                if !frontier.can_dispatch() {
                    break;
                }
                continue;
            }

            tokio::select! {
                joined = in_flight.join_next() => {
                    if let Some(joined) = joined {
                        self.handle_joined(joined, &mut frontier, &mut run, true).await;
                    }
                }
                _ = wait_for_change(&mut control) => {}
            }
        }

        // In-flight fetches run to completion; their pages are kept
        if !in_flight.is_empty() {
            tracing::info!("Waiting for {} in-flight fetches", in_flight.len());
        }
        let follow_links = state != CrawlState::Cancelled;
        while let Some(joined) = in_flight.join_next().await {
            self.handle_joined(joined, &mut frontier, &mut run, follow_links)
                .await;
        }

        let final_state = if state == CrawlState::Cancelled {
            CrawlState::Cancelled
        } else {
            self.advance(state, CrawlState::Completed)
        };

        let end_time = Utc::now();
        let urls: Vec<String> = frontier
            .dispatched()
            .iter()
            .map(|u| u.as_str().to_string())
            .collect();

        let metadata = CrawlMetadata {
            total_requests: run.success + run.failed,
            success_requests: run.success,
            failed_requests: run.failed,
            http_attempts: run.http_attempts,
            domain,
            start_time,
            end_time,
            total_time_ms: started.elapsed().as_millis() as u64,
            sitemap_urls: run.sitemap_urls,
            robots_blocked: run.robots_blocked,
            final_state,
            config_hash: None,
        };

        tracing::info!(
            "Crawl {}: {} pages ok, {} failed, {} dispatched in {:?}",
            final_state,
            metadata.success_requests,
            metadata.failed_requests,
            urls.len(),
            started.elapsed()
        );

        self.progress.emit(CrawlProgress {
            pages_scanned: metadata.total_requests,
            current_url: None,
            total_urls_estimate: urls.len(),
            stage: CrawlStage::Analyzing,
        });

        Ok(CrawlOutcome {
            result: CrawlResult {
                visited_count: urls.len(),
                page_count: run.corpus.len(),
                urls,
                failures: run.failures,
                metadata,
            },
            corpus: run.corpus,
            documents: run.documents,
            sitemap_lastmods: run.lastmods,
        })
    }

    /// Admits the seed URL, then everything the site's sitemaps list
    async fn seed_frontier(&self, frontier: &mut Frontier, run: &mut RunState, seed: &NormalizedUrl) {
        let admission = frontier.admit(&self.client, seed.clone(), 0, false).await;
        if admission != Admission::Queued {
            tracing::warn!("Seed URL {} not admitted: {:?}", seed, admission);
        }

        if !self.task.use_sitemap {
            return;
        }

        self.progress.emit(CrawlProgress {
            pages_scanned: 0,
            current_url: Some(seed.as_str().to_string()),
            total_urls_estimate: frontier.estimate_total(),
            stage: CrawlStage::Sitemap,
        });

        let declared: Vec<String> = frontier
            .robots()
            .get(seed.as_url())
            .map(|policy| policy.sitemaps().to_vec())
            .unwrap_or_default();

        let listed = extract_seed_urls(
            &self.client,
            seed.as_url(),
            &declared,
            self.task.max_child_sitemaps,
            &self.policy,
        )
        .await;
        run.sitemap_urls = listed.len();

        let mut queued = 0;
        for entry in listed {
            if let Some(lastmod) = entry.lastmod {
                run.lastmods.insert(entry.url.as_str().to_string(), lastmod);
            }
            match frontier.admit(&self.client, entry.url, 0, true).await {
                Admission::Queued => queued += 1,
                Admission::RobotsDisallowed => run.robots_blocked += 1,
                _ => {}
            }
        }
        tracing::info!("Queued {} URLs from sitemaps", queued);
    }

    /// Time between dispatches: the configured delay or the site's
    /// robots.txt crawl delay, whichever is longer
    fn dispatch_delay(&self, frontier: &Frontier, seed: &NormalizedUrl) -> Duration {
        let robots_delay = frontier
            .robots()
            .crawl_delay(seed.as_url(), &self.user_agent)
            .unwrap_or(Duration::ZERO);
        self.task.request_delay.max(robots_delay)
    }

    fn spawn_worker(&self, in_flight: &mut JoinSet<WorkerReport>, entry: FrontierEntry, site_host: &str) {
        let client = self.client.clone();
        let policy = self.policy.clone();
        let site_host = site_host.to_string();
        let retry_attempts = self.task.retry_attempts;
        let retry_delay = self.task.request_delay;

        in_flight.spawn(async move {
            let (result, attempts) =
                fetch_with_retries(&client, entry.url.as_str(), retry_attempts, retry_delay).await;

            let outcome = match result {
                FetchResult::Success(fetched) => {
                    let processed =
                        process_page(&entry.url, entry.depth, &fetched, &policy, &site_host);
                    Ok((processed, fetched.body))
                }
                other => Err(other.describe()),
            };

            WorkerReport {
                entry,
                attempts,
                outcome,
            }
        });
    }

    /// Records a finished worker and admits the links it found
    async fn handle_joined(
        &self,
        joined: Result<WorkerReport, tokio::task::JoinError>,
        frontier: &mut Frontier,
        run: &mut RunState,
        follow_links: bool,
    ) {
        let report = match joined {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Fetch worker failed: {}", e);
                run.failed += 1;
                return;
            }
        };

        run.http_attempts += u64::from(report.attempts);
        let url = report.entry.url.as_str().to_string();

        match report.outcome {
            Ok((processed, body)) => {
                run.success += 1;
                tracing::debug!(
                    "Fetched {} ({} words, {} links, {} issues)",
                    url,
                    processed.record.word_count,
                    processed.links.len(),
                    processed.record.issues.len()
                );

                if follow_links {
                    let child_depth = report.entry.depth + 1;
                    for link in processed.links {
                        if frontier.admit(&self.client, link, child_depth, false).await
                            == Admission::RobotsDisallowed
                        {
                            run.robots_blocked += 1;
                        }
                    }
                }

                run.corpus.insert(url.clone(), processed.record);
                run.documents.insert(url.clone(), body);
            }
            Err(reason) => {
                run.failed += 1;
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    report.attempts,
                    reason
                );
                run.failures.push(FailedUrl {
                    url: url.clone(),
                    depth: report.entry.depth,
                    reason,
                    attempts: report.attempts,
                });
            }
        }

        self.progress.emit(CrawlProgress {
            pages_scanned: run.success + run.failed,
            current_url: Some(url),
            total_urls_estimate: frontier.estimate_total(),
            stage: CrawlStage::Crawling,
        });
    }

    /// Maps the latest control signal onto the crawl state
    fn apply_signal(&self, state: CrawlState, signal: ControlSignal) -> CrawlState {
        let wanted = match signal {
            ControlSignal::Run => CrawlState::Running,
            ControlSignal::Pause => CrawlState::Paused,
            ControlSignal::Cancel => CrawlState::Cancelled,
        };
        if wanted == state || state.is_terminal() {
            return state;
        }
        tracing::info!("Crawl {} -> {}", state, wanted);
        self.advance(state, wanted)
    }

    fn advance(&self, from: CrawlState, to: CrawlState) -> CrawlState {
        match self.handle.set_state(to) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("{}", e);
                from
            }
        }
    }
}

/// Mutable bookkeeping of one run, owned by the coordinator loop
#[derive(Default)]
struct RunState {
    corpus: Corpus,
    documents: BTreeMap<String, String>,
    lastmods: HashMap<String, String>,
    failures: Vec<FailedUrl>,
    success: usize,
    failed: usize,
    http_attempts: u64,
    sitemap_urls: usize,
    robots_blocked: usize,
}

/// Waits for the next control signal
///
/// The handle keeps the sender alive for the whole run, so the channel
/// cannot close while the loop is waiting.
async fn wait_for_change(control: &mut watch::Receiver<ControlSignal>) {
    if control.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl with the default URL
/// policy. Use [`Coordinator`] directly to attach a [`CrawlHandle`] or a
/// custom normalization policy.
///
/// # Arguments
///
/// * `task` - The crawl's configuration, seed URL included
/// * `user_agent` - The crawler's identity
/// * `progress` - Where progress events are sent
pub async fn run(
    task: CrawlTask,
    user_agent: &UserAgentConfig,
    progress: ProgressSink,
) -> Result<CrawlOutcome, SumiError> {
    Coordinator::new(task, user_agent)?
        .with_progress(progress)
        .run()
        .await
}
