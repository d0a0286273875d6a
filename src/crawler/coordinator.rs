//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator is the single consumer of retrieval outcomes. Every
//! decision that touches shared crawl state happens inside its loop:
//! - Consuming one outcome at a time from the aggregation channel
//! - Reporting failures and found pages to the sink
//! - Applying the depth budget
//! - Dispatching newly discovered identifiers
//!
//! The run ends exactly when no dispatched retrieval is outstanding.

use crate::crawler::cancel::CancelToken;
use crate::crawler::dispatcher::{Dispatcher, Outcome};
use crate::fetch::Fetcher;
use crate::output::{CrawlReport, CrawlSink};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Main crawler coordinator structure
///
/// Holds only the settings shared by every run. The visited set and the
/// in-flight counter are created fresh by [`Coordinator::run`], so one
/// coordinator can run any number of independent traversals.
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    fetch_timeout: Option<Duration>,
    cancel: CancelToken,
}

impl Coordinator {
    /// Creates a coordinator that retrieves pages through `fetcher`
    pub fn new<F: Fetcher + 'static>(fetcher: F) -> Self {
        Self::from_shared(Arc::new(fetcher))
    }

    /// Creates a coordinator from an already shared fetcher
    pub fn from_shared(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            fetch_timeout: None,
            cancel: CancelToken::new(),
        }
    }

    /// Fails any single retrieval that takes longer than `timeout`
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Uses `cancel` to stop runs early
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels this coordinator's runs
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs one traversal from `seed`, following links up to `max_depth` hops
    ///
    /// `seed` is used verbatim as an identifier. It must be spelled the way
    /// the fetcher spells its links, otherwise a link back to the seed counts
    /// as a new page. For [`HttpFetcher`](crate::HttpFetcher) use
    /// [`HttpFetcher::normalize_seed`](crate::HttpFetcher::normalize_seed).
    ///
    /// 1. Dispatch the seed with the full depth budget
    /// 2. While retrievals are in flight:
    ///    a. Wait for the next outcome
    ///    b. Decrement the in-flight counter
    ///    c. Report failures and move on
    ///    d. Report found pages
    ///    e. Stop at pages whose budget is spent
    ///    f. Dispatch unvisited links with one less hop
    /// 3. Close the aggregation channel and return the report
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_crawl::{Coordinator, FixtureFetcher, MemorySink};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let fetcher = FixtureFetcher::builder()
    ///     .page("A", "alpha", ["B"])
    ///     .page("B", "beta", ["A"])
    ///     .build();
    /// let mut sink = MemorySink::new();
    ///
    /// let report = Coordinator::new(fetcher).run("A", 1, &mut sink).await;
    /// assert_eq!(report.found, 2);
    /// assert_eq!(sink.found_ids(), vec!["A", "B"]);
    /// # }
    /// ```
    pub async fn run(&self, seed: &str, max_depth: u32, sink: &mut dyn CrawlSink) -> CrawlReport {
        let start_time = Instant::now();
        tracing::info!("Starting crawl from {} (max depth {})", seed, max_depth);

        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new(
            Arc::clone(&self.fetcher),
            results_tx,
            self.fetch_timeout,
            self.cancel.clone(),
        );
        let mut report = CrawlReport::default();

        dispatcher.dispatch(seed, max_depth);

        while dispatcher.in_flight() > 0 {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::warn!(
                        "Crawl cancelled with {} retrievals in flight",
                        dispatcher.in_flight()
                    );
                    report.cancelled = true;
                    break;
                }
                next = results_rx.recv() => match next {
                    Some(outcome) => outcome,
                    None => {
                        // The dispatcher holds a sender, so the channel cannot close under us
                        tracing::error!("Outcome channel closed unexpectedly");
                        break;
                    }
                },
            };

            dispatcher.complete();
            handle_outcome(outcome, &mut dispatcher, sink, &mut report);
        }

        report.abandoned = dispatcher.in_flight();
        report.dispatched = dispatcher.visited_count();
        report.peak_in_flight = dispatcher.peak_in_flight();
        report.elapsed = start_time.elapsed();

        // Dropping both ends releases the aggregation channel
        drop(dispatcher);
        drop(results_rx);

        tracing::info!(
            "Crawl finished: {} found, {} failed in {:?}",
            report.found,
            report.failed,
            report.elapsed
        );

        report
    }
}

/// Applies failure and depth policy to one outcome
fn handle_outcome(
    outcome: Outcome,
    dispatcher: &mut Dispatcher,
    sink: &mut dyn CrawlSink,
    report: &mut CrawlReport,
) {
    let Outcome { id, result, depth } = outcome;

    let page = match result {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", id, e);
            report.failed += 1;
            sink.failed(&id, &e);
            return;
        }
    };

    report.found += 1;
    sink.found(&id, &page.content);

    if depth == 0 {
        tracing::debug!("Depth exhausted at {}, not following {} links", id, page.links.len());
        report.depth_exhausted += 1;
        return;
    }

    for link in &page.links {
        if !dispatcher.dispatch(link, depth - 1) {
            report.duplicates_skipped += 1;
        }
    }
}

/// Runs a crawl that prints to standard output
///
/// Found pages are printed as `found: <url> "<content>"` and failures as
/// their message. Returns the run's statistics.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::crawler::crawl;
/// use ripple_crawl::FixtureFetcher;
///
/// # async fn example() {
/// let report = crawl(FixtureFetcher::SAMPLE_ROOT, 4, FixtureFetcher::sample_site()).await;
/// println!("{} pages found", report.found);
/// # }
/// ```
pub async fn crawl<F: Fetcher + 'static>(seed: &str, max_depth: u32, fetcher: F) -> CrawlReport {
    let mut sink = crate::output::StdoutSink::new();
    Coordinator::new(fetcher).run(seed, max_depth, &mut sink).await
}
