//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of the
//! crawling process, including:
//! - Seeding the frontier with the root URL
//! - Admitting fetches under a concurrency ceiling
//! - Probing, downloading, extracting and indexing each URL
//! - Feeding admitted links back into the frontier
//! - Deciding when the crawl is finished

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, decode_body, fetch_body, probe, Probe};
use crate::crawler::frontier::Frontier;
use crate::crawler::indexer::Indexer;
use crate::crawler::parser::extract;
use crate::crawler::state::{FetchState, FetchTracker};
use crate::crawler::FetchError;
use crate::search::{JiebaTokenizer, Tokenizer};
use crate::storage::{open_storage, SharedStorage, StorageResult};
use crate::url::{top_level_domain, LinkFilter};
use crate::{IntraError, UrlError};
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use url::Url;

/// Everything a fetch task needs, shared read-only across tasks
pub struct CrawlContext {
    pub client: Client,
    pub frontier: Frontier,
    pub indexer: Indexer,
    pub filter: LinkFilter,
    pub page_deadline: Duration,
}

/// Totals reported when a crawl finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub dispatched: u64,
    pub committed: u64,
    pub redirected: u64,
    pub skipped: u64,
    pub timed_out: u64,
    pub failed: u64,
    /// Largest number of fetches observed in flight at once
    pub peak_in_flight: usize,
}

impl CrawlSummary {
    fn record(&mut self, state: FetchState) {
        match state {
            FetchState::Committed => self.committed += 1,
            FetchState::Redirected => self.redirected += 1,
            FetchState::SkippedNonText => self.skipped += 1,
            FetchState::TimedOut => self.timed_out += 1,
            _ => self.failed += 1,
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    semaphore: Arc<Semaphore>,
    max_in_flight: usize,
    seed_url: Url,
}

impl Coordinator {
    /// Creates a new coordinator over an open store
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Store holding the frontier and the index
    /// * `tokenizer` - Segmenter used when indexing
    pub fn new(
        config: &Config,
        storage: SharedStorage,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, IntraError> {
        let seed_url = Url::parse(&config.crawler.seed_url)
            .map_err(|e| UrlError::Parse(format!("{}: {}", config.crawler.seed_url, e)))?;

        let context = CrawlContext {
            client: build_http_client(&config.crawler)?,
            frontier: Frontier::new(storage.clone()),
            indexer: Indexer::new(storage, tokenizer),
            filter: LinkFilter::new(&config.filter),
            page_deadline: Duration::from_secs(config.crawler.page_deadline_secs),
        };

        let max_in_flight = config.crawler.max_concurrent_fetches as usize;

        Ok(Self {
            context: Arc::new(context),
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            seed_url,
        })
    }

    /// Queues the seed URL unless a previous crawl already knows it
    ///
    /// # Returns
    ///
    /// `true` if the seed was queued
    pub fn seed(&self) -> Result<bool, IntraError> {
        let frontier = &self.context.frontier;
        if frontier.is_known(self.seed_url.as_str())? {
            tracing::info!(
                "Seed {} already known, resuming with {} queued URLs",
                self.seed_url,
                frontier.len()?
            );
            return Ok(false);
        }

        tracing::info!("Seeding frontier with {}", self.seed_url);
        Ok(frontier.enqueue(self.seed_url.as_str())?)
    }

    /// Runs the crawl loop until the frontier drains
    ///
    /// A permit is taken before each dequeue and held by the fetch task, so
    /// no more than `max-concurrent-fetches` URLs are ever in flight. When
    /// the frontier is empty the loop waits for a running fetch to finish,
    /// since it may discover new links; it stops once the frontier is empty
    /// and nothing is in flight.
    pub async fn run(&self) -> Result<CrawlSummary, IntraError> {
        self.seed()?;

        let mut tasks: JoinSet<FetchState> = JoinSet::new();
        let mut summary = CrawlSummary::default();
        let start_time = Instant::now();

        loop {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| FetchError::Task(e.to_string()))?;

            match self.context.frontier.dequeue()? {
                Some(url) => {
                    summary.dispatched += 1;
                    let context = Arc::clone(&self.context);
                    tasks.spawn(async move {
                        let state = process_url(&context, url).await;
                        drop(permit);
                        state
                    });
                    let in_flight = self.max_in_flight - self.semaphore.available_permits();
                    summary.peak_in_flight = summary.peak_in_flight.max(in_flight);

                    if summary.dispatched % 10 == 0 {
                        log_progress(
                            &summary,
                            self.context.frontier.len(),
                            start_time.elapsed(),
                        );
                    }
                }
                None => {
                    drop(permit);
                    match tasks.join_next().await {
                        Some(result) => record_outcome(&mut summary, result),
                        None => break,
                    }
                }
            }

            while let Some(result) = tasks.try_join_next() {
                record_outcome(&mut summary, result);
            }
        }

        tracing::info!(
            "Finished: {} URLs dispatched ({} committed, {} redirected, {} skipped, {} timed out, {} failed) in {:?}",
            summary.dispatched,
            summary.committed,
            summary.redirected,
            summary.skipped,
            summary.timed_out,
            summary.failed,
            start_time.elapsed()
        );

        Ok(summary)
    }
}

/// Logs crawl progress; a failed frontier count is reported, not raised
fn log_progress(summary: &CrawlSummary, queued: StorageResult<u64>, elapsed: Duration) {
    let rate = summary.dispatched as f64 / elapsed.as_secs_f64();
    match queued {
        Ok(queued) => tracing::info!(
            "Progress: {} URLs dispatched, {} committed, {} in frontier, {:.2} URLs/sec",
            summary.dispatched,
            summary.committed,
            queued,
            rate
        ),
        Err(e) => tracing::warn!(
            "Progress: {} URLs dispatched, {} committed, frontier size unavailable: {}",
            summary.dispatched,
            summary.committed,
            e
        ),
    }
}

fn record_outcome(summary: &mut CrawlSummary, result: Result<FetchState, JoinError>) {
    match result {
        Ok(state) => summary.record(state),
        Err(e) => {
            tracing::error!("Fetch task panicked: {}", e);
            summary.failed += 1;
        }
    }
}

/// Fetches and indexes one URL under the page deadline
///
/// Never returns an error: every failure is logged and ends in a terminal
/// state.
async fn process_url(context: &CrawlContext, raw: String) -> FetchState {
    tracing::info!("{}", raw);
    let mut tracker = FetchTracker::new(raw.as_str());

    let url = match Url::parse(&raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("-> Failed to fetch: invalid URL {}: {}", raw, e);
            tracker.advance(FetchState::Failed);
            return tracker.state();
        }
    };

    let outcome =
        tokio::time::timeout(context.page_deadline, fetch_and_index(context, &url, &mut tracker))
            .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!("-> Failed to fetch {}: {}", url, e);
            tracker.advance(FetchState::Failed);
        }
        Err(_) => {
            let e = FetchError::Timeout(context.page_deadline.as_secs());
            tracing::warn!("-> Failed to fetch {}: {}", url, e);
            tracker.advance(FetchState::TimedOut);
        }
    }

    tracker.state()
}

async fn fetch_and_index(
    context: &CrawlContext,
    url: &Url,
    tracker: &mut FetchTracker,
) -> Result<(), FetchError> {
    tracker.advance(FetchState::FetchingHead);

    match probe(&context.client, url).await? {
        Probe::Redirect(target) => {
            if context.filter.admits(&target)
                && context
                    .frontier
                    .enqueue_redirect(target.as_str(), url.as_str())?
            {
                tracing::info!("-> Redirected to {}", target);
            } else {
                tracing::debug!("-> Redirect to {} not followed", target);
            }
            tracker.advance(FetchState::Redirected);
            return Ok(());
        }
        Probe::NotHtml { content_type } => {
            tracing::info!("-> Not html, pass: {}", content_type);
            tracker.advance(FetchState::SkippedNonText);
            return Ok(());
        }
        Probe::Proceed => {}
    }

    tracker.advance(FetchState::FetchingBody);

    let bytes = fetch_body(&context.client, url).await?;
    let html = decode_body(&bytes, top_level_domain(url).as_deref());
    let page = extract(&html);

    context.indexer.commit(url.as_str(), &page.title, &page.body)?;

    for raw in &page.links {
        if let Some(link) = context.filter.admit_link(raw, url) {
            if context.frontier.enqueue(link.as_str())? {
                tracing::info!("-> {}", link);
            }
        }
    }

    tracker.advance(FetchState::Committed);
    Ok(())
}

/// Opens the store and runs a complete crawl
///
/// # Example
///
/// ```no_run
/// use intrasearch::config::load_config;
/// use intrasearch::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_crawl(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlSummary, IntraError> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let storage: SharedStorage = Arc::new(Mutex::new(storage));
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(JiebaTokenizer::new());

    let coordinator = Coordinator::new(config, storage, tokenizer)?;
    coordinator.run().await
}
