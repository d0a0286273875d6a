//! Fetch capability for the crawler
//!
//! The crawler never talks to the network directly. Everything it knows
//! about a page comes through the [`Fetcher`] trait, which has two
//! implementations here:
//! - [`FixtureFetcher`], a canned in-memory site used by tests and the demo mode
//! - [`HttpFetcher`], which GETs pages over HTTP and extracts their links

mod fixture;
mod http;
mod parser;

pub use fixture::{FixtureFetcher, FixtureFetcherBuilder};
pub use http::{build_http_client, HttpFetcher};
pub use parser::{extract_links_simple, parse_html, ParsedPage};

use async_trait::async_trait;
use thiserror::Error;

/// A successfully retrieved page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Content reported for the page (body text or title)
    pub content: String,

    /// Outbound identifiers in document order; may contain duplicates
    pub links: Vec<String>,
}

impl Page {
    pub fn new(content: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            content: content.into(),
            links,
        }
    }
}

/// A failed retrieval
///
/// There is a single failure kind. The message is what gets reported to
/// the user, so it should name the identifier it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure reported for an identifier the fetcher has no page for
    pub fn not_found(id: &str) -> Self {
        Self::new(format!("not found: {}", id))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Capability for retrieving a page and its outbound links
///
/// Implementations must be shareable across tasks: the crawler calls
/// `fetch` concurrently for different identifiers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the page named by `id`
    async fn fetch(&self, id: &str) -> Result<Page, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, id: &str) -> Result<Page, FetchError> {
        (**self).fetch(id).await
    }
}
