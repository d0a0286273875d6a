//! Sink trait and the built-in sinks
//!
//! A sink observes what the crawler finds. The coordinator is its only
//! caller, so implementations never see two events at once.

use crate::fetch::FetchError;
use std::io::Write;

/// Observer for crawl events
pub trait CrawlSink: Send {
    /// Called once for every successfully retrieved identifier
    fn found(&mut self, id: &str, content: &str);

    /// Called once for every failed retrieval
    fn failed(&mut self, id: &str, error: &FetchError);
}

/// Renders the line emitted for a found page: `found: <id> <quoted content>`
pub fn format_found(id: &str, content: &str) -> String {
    format!("found: {} {:?}", id, content)
}

/// Sink that prints to standard output
///
/// Found pages are printed with [`format_found`]; failures print their
/// message alone. Write errors (for example a closed pipe) are logged and
/// otherwise ignored so they cannot stop a crawl.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", line) {
            tracing::debug!("Failed to write to stdout: {}", e);
        }
    }
}

impl CrawlSink for StdoutSink {
    fn found(&mut self, id: &str, content: &str) {
        self.emit(&format_found(id, content));
    }

    fn failed(&mut self, _id: &str, error: &FetchError) {
        self.emit(error.message());
    }
}

/// A single recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Found { id: String, content: String },
    Failed { id: String, message: String },
}

impl Emission {
    pub fn id(&self) -> &str {
        match self {
            Emission::Found { id, .. } | Emission::Failed { id, .. } => id,
        }
    }

    /// The line [`StdoutSink`] would have printed for this event
    pub fn line(&self) -> String {
        match self {
            Emission::Found { id, content } => format_found(id, content),
            Emission::Failed { message, .. } => message.clone(),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    emissions: Vec<Emission>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in the order they were observed
    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Identifiers that were found, in order
    pub fn found_ids(&self) -> Vec<&str> {
        self.emissions
            .iter()
            .filter(|e| matches!(e, Emission::Found { .. }))
            .map(Emission::id)
            .collect()
    }

    /// Failure messages, in order
    pub fn failures(&self) -> Vec<&str> {
        self.emissions
            .iter()
            .filter_map(|e| match e {
                Emission::Failed { message, .. } => Some(message.as_str()),
                Emission::Found { .. } => None,
            })
            .collect()
    }

    /// Rendered output lines, in order
    pub fn lines(&self) -> Vec<String> {
        self.emissions.iter().map(Emission::line).collect()
    }
}

impl CrawlSink for MemorySink {
    fn found(&mut self, id: &str, content: &str) {
        self.emissions.push(Emission::Found {
            id: id.to_string(),
            content: content.to_string(),
        });
    }

    fn failed(&mut self, id: &str, error: &FetchError) {
        self.emissions.push(Emission::Failed {
            id: id.to_string(),
            message: error.message().to_string(),
        });
    }
}
