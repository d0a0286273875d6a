//! In-memory fetcher with canned pages
//!
//! Used by the test suite and by the CLI's `--demo` mode. The page table is
//! injected at construction time and never changes afterwards, so repeated
//! lookups of the same identifier always return the same result.

use super::{FetchError, Fetcher, Page};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fetcher that serves pages from a fixed table
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, Page>,
    latency: Option<Duration>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    /// Starts building a fixture
    pub fn builder() -> FixtureFetcherBuilder {
        FixtureFetcherBuilder::default()
    }

    /// A small four-page site with cycles and shared links
    pub fn sample_site() -> Self {
        Self::builder()
            .page(
                "http://golang.org/",
                "The Go Programming Language",
                ["http://golang.org/pkg/", "http://golang.org/cmd/"],
            )
            .page(
                "http://golang.org/pkg/",
                "Packages",
                [
                    "http://golang.org/",
                    "http://golang.org/cmd/",
                    "http://golang.org/pkg/fmt/",
                    "http://golang.org/pkg/os/",
                ],
            )
            .page(
                "http://golang.org/pkg/fmt/",
                "Package fmt",
                ["http://golang.org/", "http://golang.org/pkg/"],
            )
            .page(
                "http://golang.org/pkg/os/",
                "Package os",
                ["http://golang.org/", "http://golang.org/pkg/"],
            )
            .build()
    }

    /// Root identifier of [`FixtureFetcher::sample_site`]
    pub const SAMPLE_ROOT: &'static str = "http://golang.org/";

    /// Number of pages in the table
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Every identifier passed to `fetch`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// How many times `id` has been fetched
    pub fn call_count(&self, id: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|c| c.as_str() == id)
            .count()
    }

    fn record_call(&self, id: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(id.to_string());
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, id: &str) -> Result<Page, FetchError> {
        self.record_call(id);

        if let Some(delay) = self.delays.get(id).copied().or(self.latency) {
            tokio::time::sleep(delay).await;
        }

        self.pages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::not_found(id))
    }
}

/// Builder for [`FixtureFetcher`]
#[derive(Debug, Default)]
pub struct FixtureFetcherBuilder {
    pages: HashMap<String, Page>,
    latency: Option<Duration>,
    delays: HashMap<String, Duration>,
}

impl FixtureFetcherBuilder {
    /// Adds a page; a later call for the same identifier replaces it
    pub fn page<I, S>(mut self, id: &str, content: &str, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let links = links.into_iter().map(Into::into).collect();
        self.pages.insert(id.to_string(), Page::new(content, links));
        self
    }

    /// Sleeps this long before answering any lookup
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Overrides the latency for one identifier
    pub fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn build(self) -> FixtureFetcher {
        FixtureFetcher {
            pages: self.pages,
            latency: self.latency,
            delays: self.delays,
            calls: Mutex::new(Vec::new()),
        }
    }
}
