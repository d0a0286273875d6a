//! HTTP fetcher implementation
//!
//! GETs a page, checks that it is HTML, and turns it into a [`Page`]:
//! the title becomes the content and the normalized links become the
//! outbound identifiers. Every failure is folded into a [`FetchError`]
//! so the crawler can report it and move on.

use super::parser::parse_html;
use super::{FetchError, Fetcher, Page};
use crate::config::UserAgentConfig;
use crate::url::{host_of, normalize_url};
use crate::{RippleError, UrlResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Default request timeout when none is configured
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds an HTTP client that identifies the crawler
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::UserAgentConfig;
/// use ripple_crawl::fetch::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), None).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Option<Duration>,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    restrict_to_host: Option<String>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            restrict_to_host: None,
        }
    }

    /// Builds the client from user agent settings
    pub fn from_config(
        config: &UserAgentConfig,
        request_timeout: Option<Duration>,
    ) -> Result<Self, RippleError> {
        Ok(Self::new(build_http_client(config, request_timeout)?))
    }

    /// Spells a seed the way this fetcher spells the links it reports
    ///
    /// Links come back normalized, so a seed passed to
    /// [`Coordinator::run`](crate::Coordinator::run) in any other spelling
    /// would be fetched a second time when a page links back to it.
    ///
    /// ```
    /// use ripple_crawl::HttpFetcher;
    ///
    /// let seed = HttpFetcher::normalize_seed("https://Example.com#top").unwrap();
    /// assert_eq!(seed, "https://example.com/");
    /// ```
    pub fn normalize_seed(seed: &str) -> UrlResult<String> {
        Ok(normalize_url(seed)?.into())
    }

    /// Only report links whose host matches `seed`'s host
    pub fn restrict_to_host_of(mut self, seed: &str) -> Self {
        self.restrict_to_host = host_of(seed);
        self
    }

    fn keep_link(&self, link: &Url) -> bool {
        match &self.restrict_to_host {
            Some(host) => link.host_str() == Some(host.as_str()),
            None => true,
        }
    }

    fn collect_links(&self, links: Vec<String>) -> Vec<String> {
        links
            .into_iter()
            .filter_map(|link| match normalize_url(&link) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::trace!("Dropping link {}: {}", link, e);
                    None
                }
            })
            .filter(|url| self.keep_link(url))
            .map(String::from)
            .collect()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(id)
            .send()
            .await
            .map_err(|e| describe_transport_error(id, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::not_found(id));
        }
        if !status.is_success() {
            return Err(FetchError::new(format!("HTTP {} for {}", status.as_u16(), id)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::new(format!(
                "expected HTML from {}, got '{}'",
                id, content_type
            )));
        }

        // Resolve links against the final URL so redirects do not break relative hrefs
        let base_url = response.url().clone();

        let body = response
            .text()
            .await
            .map_err(|e| describe_transport_error(id, &e))?;

        let parsed = parse_html(&body, &base_url);

        Ok(Page {
            content: parsed.title.unwrap_or_default(),
            links: self.collect_links(parsed.links),
        })
    }
}

fn describe_transport_error(id: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::new(format!("request timeout for {}", id))
    } else if error.is_connect() {
        FetchError::new(format!("connection failed for {}: {}", id, error))
    } else if error.is_builder() {
        FetchError::new(format!("invalid request for {}: {}", id, error))
    } else {
        FetchError::new(format!("request failed for {}: {}", id, error))
    }
}
