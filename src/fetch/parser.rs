//! HTML parsing for the HTTP fetcher
//!
//! Pulls the page title and every followable link out of a document.
//! Links are resolved against the page URL and returned in document order.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Link prefixes that never name a crawlable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "#"];

/// Title and links extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Trimmed contents of `<title>`, if present and non-empty
    pub title: Option<String>,

    /// Absolute http(s) links in document order
    pub links: Vec<String>,
}

/// Parses an HTML document
///
/// Followed: `<a href>` anywhere in the document (including `rel="nofollow"`)
/// and `<link rel="canonical" href>`.
///
/// Skipped: anchors carrying `download`, `javascript:`/`mailto:`/`tel:`/`data:`
/// hrefs, fragment-only hrefs, and anything that does not resolve to http(s).
///
/// # Example
///
/// ```
/// use ripple_crawl::fetch::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base);
/// assert_eq!(parsed.title.as_deref(), Some("Test"));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Convenience wrapper returning only the links
pub fn extract_links_simple(html: &str, base_url: &Url) -> Vec<String> {
    parse_html(html, base_url).links
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let selector = match Selector::parse("a[href], link[rel='canonical'][href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter(|element| is_followable(element))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

fn is_followable(element: &ElementRef<'_>) -> bool {
    !(element.value().name() == "a" && element.value().attr("download").is_some())
}

/// Resolves `href` against `base_url`, or `None` when it should not be followed
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || SKIPPED_PREFIXES.iter().any(|p| href.starts_with(p)) {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}
