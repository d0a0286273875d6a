//! Crawler module for the concurrent traversal
//!
//! This module contains the core crawling logic:
//! - The dispatcher, which owns the visited set and spawns retrievals
//! - The coordinator, which consumes outcomes and applies depth policy
//! - Cancellation for long-running crawls

mod cancel;
mod coordinator;
mod dispatcher;

pub use cancel::CancelToken;
pub use coordinator::{crawl, Coordinator};
pub use dispatcher::{Dispatcher, Outcome};
