//! Output module for crawl events and run summaries
//!
//! This module handles:
//! - Emitting found pages and failures through a [`CrawlSink`]
//! - Collecting per-run statistics in a [`CrawlReport`]

pub mod stats;
mod traits;

pub use stats::{log_report, CrawlReport};
pub use traits::{format_found, CrawlSink, Emission, MemorySink, StdoutSink};
