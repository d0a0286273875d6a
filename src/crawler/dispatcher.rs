//! Dispatcher: visited set, in-flight counter and retrieval tasks
//!
//! The dispatcher is owned by the coordinator and only ever called from the
//! coordinator's loop. That single caller is what makes the check-and-insert
//! on the visited set atomic without a lock.

use crate::crawler::cancel::CancelToken;
use crate::fetch::{FetchError, Fetcher, Page};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Result of one retrieval, delivered to the coordinator exactly once
#[derive(Debug)]
pub struct Outcome {
    /// The identifier that was dispatched
    pub id: String,

    /// The page, or why it could not be retrieved
    pub result: Result<Page, FetchError>,

    /// Depth budget the identifier was dispatched with
    pub depth: u32,
}

/// Launches retrievals and tracks which identifiers have been scheduled
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    results: UnboundedSender<Outcome>,
    fetch_timeout: Option<Duration>,
    cancel: CancelToken,
    visited: HashSet<String>,
    in_flight: usize,
    peak_in_flight: usize,
}

impl Dispatcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        results: UnboundedSender<Outcome>,
        fetch_timeout: Option<Duration>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            fetcher,
            results,
            fetch_timeout,
            cancel,
            visited: HashSet::new(),
            in_flight: 0,
            peak_in_flight: 0,
        }
    }

    /// Dispatches `id` unless it has been dispatched before
    ///
    /// Marks the identifier visited, bumps the in-flight counter and spawns a
    /// task that sends exactly one [`Outcome`] carrying `depth`. Returns
    /// `false` without doing anything if `id` is already visited.
    pub fn dispatch(&mut self, id: &str, depth: u32) -> bool {
        if !self.visited.insert(id.to_string()) {
            tracing::trace!("Skipping already dispatched {}", id);
            return false;
        }

        self.in_flight += 1;
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
        tracing::debug!(
            "Dispatching {} (depth {}, {} in flight)",
            id,
            depth,
            self.in_flight
        );

        tokio::spawn(retrieve(
            Arc::clone(&self.fetcher),
            id.to_string(),
            depth,
            self.fetch_timeout,
            self.cancel.clone(),
            self.results.clone(),
        ));

        true
    }

    /// Records that one outcome has been consumed
    pub fn complete(&mut self) {
        debug_assert!(self.in_flight > 0, "completed more outcomes than dispatched");
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Dispatches whose outcome has not been consumed yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    #[cfg(test)]
    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Body of a retrieval task
///
/// Panics and timeouts inside the fetcher become a [`FetchError`] so the
/// coordinator still receives an outcome. On cancellation nothing is sent.
async fn retrieve(
    fetcher: Arc<dyn Fetcher>,
    id: String,
    depth: u32,
    fetch_timeout: Option<Duration>,
    cancel: CancelToken,
    results: UnboundedSender<Outcome>,
) {
    let fetch = AssertUnwindSafe(fetch_with_timeout(fetcher.as_ref(), &id, fetch_timeout))
        .catch_unwind();

    let result = tokio::select! {
        fetched = fetch => fetched.unwrap_or_else(|panic| {
            Err(FetchError::new(format!(
                "fetcher panicked on {}: {}",
                id,
                panic_message(panic.as_ref())
            )))
        }),
        _ = cancel.cancelled() => {
            tracing::trace!("Retrieval of {} cancelled", id);
            return;
        }
    };

    // The receiver is only gone if the coordinator already stopped
    if results.send(Outcome { id, result, depth }).is_err() {
        tracing::trace!("Coordinator gone, dropping outcome");
    }
}

async fn fetch_with_timeout(
    fetcher: &dyn Fetcher,
    id: &str,
    fetch_timeout: Option<Duration>,
) -> Result<Page, FetchError> {
    match fetch_timeout {
        Some(limit) => tokio::time::timeout(limit, fetcher.fetch(id))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::new(format!(
                    "timed out after {}ms fetching {}",
                    limit.as_millis(),
                    id
                )))
            }),
        None => fetcher.fetch(id).await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
