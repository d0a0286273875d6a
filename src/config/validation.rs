use crate::config::types::{Config, CrawlSettings, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest accepted `max-depth`
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// Smallest accepted `fetch-timeout-ms`
const MIN_FETCH_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
///
/// A missing seed is accepted here; use [`Config::require_seed`] once
/// command-line overrides have been applied.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

impl Config {
    /// Returns the seed, or an error if none was configured
    pub fn require_seed(&self) -> Result<&str, ConfigError> {
        self.crawl.seed.as_deref().ok_or_else(|| {
            ConfigError::Validation("a seed URL is required (set crawl.seed or --seed)".to_string())
        })
    }
}

fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if let Some(seed) = &settings.seed {
        validate_seed(seed)?;
    }

    if settings.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, settings.max_depth
        )));
    }

    if let Some(timeout) = settings.fetch_timeout_ms {
        if timeout < MIN_FETCH_TIMEOUT_MS {
            return Err(ConfigError::Validation(format!(
                "fetch_timeout_ms must be >= {}ms, got {}ms",
                MIN_FETCH_TIMEOUT_MS, timeout
            )));
        }
    }

    Ok(())
}

fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)
}

/// Basic email validation: one `@`, a local part, and a dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid email format: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
