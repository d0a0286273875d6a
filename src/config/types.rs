use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Ripple-Crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Traversal settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlSettings {
    /// Identifier the traversal starts from
    #[serde(default)]
    pub seed: Option<String>,

    /// Number of hops to follow from the seed
    #[serde(default)]
    pub max_depth: u32,

    /// Upper bound on a single retrieval (milliseconds)
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    /// Only follow links on the seed's host
    #[serde(default)]
    pub same_host_only: bool,
}

impl CrawlSettings {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

/// User agent identification configuration
///
/// Missing keys fall back to [`UserAgentConfig::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/ripple-crawl".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}
