//! Per-run crawl statistics
//!
//! The coordinator fills in a [`CrawlReport`] as it consumes outcomes and
//! hands it back when the run ends.

use std::time::Duration;

/// What happened during one traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Identifiers dispatched (equals the size of the visited set)
    pub dispatched: usize,

    /// Successful retrievals
    pub found: usize,

    /// Failed retrievals
    pub failed: usize,

    /// Outbound links skipped because their target was already dispatched
    pub duplicates_skipped: usize,

    /// Successful pages whose links were not followed because their depth was spent
    pub depth_exhausted: usize,

    /// Highest number of retrievals in flight at once
    pub peak_in_flight: usize,

    /// True if the run was stopped by a cancel token
    pub cancelled: bool,

    /// Retrievals still outstanding when the run stopped (zero unless cancelled)
    pub abandoned: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Outcomes consumed by the coordinator
    pub fn completed(&self) -> usize {
        self.found + self.failed
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        (self.found as f64 / completed as f64) * 100.0
    }
}

/// Logs a report summary through `tracing`
pub fn log_report(report: &CrawlReport) {
    tracing::info!(
        "Crawl {}: {} found, {} failed, {} dispatched in {:?}",
        if report.cancelled { "cancelled" } else { "completed" },
        report.found,
        report.failed,
        report.dispatched,
        report.elapsed
    );
    tracing::info!(
        "Peak concurrency: {}, duplicate links skipped: {}, depth-limited pages: {}",
        report.peak_in_flight,
        report.duplicates_skipped,
        report.depth_exhausted
    );
    if report.cancelled {
        tracing::warn!("{} retrievals abandoned", report.abandoned);
    }
    tracing::info!("Success rate: {:.1}%", report.success_rate());
}
