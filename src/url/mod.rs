//! URL handling for the HTTP fetcher
//!
//! Identifiers are compared as plain strings by the crawler, so the HTTP
//! fetcher normalizes every link it hands back. This module also answers
//! host questions for the same-host restriction.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Extracts the lowercase host of a URL string, if it has one
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::host_of;
///
/// assert_eq!(host_of("https://Docs.Example.com/a"), Some("docs.example.com".to_string()));
/// assert_eq!(host_of("not a url"), None);
/// ```
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()?
        .host_str()
        .map(|host| host.to_lowercase())
}
