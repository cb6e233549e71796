// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Network connectivity as reported by the platform.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(connected: bool) -> Self {
        let (tx, _) = watch::channel(connected);
        Self {
            state: Arc::new(tx),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        let previous = self.state.send_replace(connected);
        if previous != connected {
            tracing::info!(connected, "Connectivity changed");
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait up to `limit` for the network. Returns whether it is available.
    pub async fn wait_connected(&self, limit: Duration) -> bool {
        if self.is_connected() {
            return true;
        }
        let mut rx = self.state.subscribe();
        let waited = tokio::time::timeout(limit, rx.wait_for(|connected| *connected))
            .await
            .map(|result| result.is_ok());
        matches!(waited, Ok(true))
    }
}
