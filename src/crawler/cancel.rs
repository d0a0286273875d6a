//! Cancellation for a running crawl

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle that stops a crawl
///
/// Once cancelled it stays cancelled. The coordinator stops waiting for
/// outcomes and every in-flight retrieval gives up at its next await point.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called on any clone
    pub async fn cancelled(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel
        let _ = state.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
