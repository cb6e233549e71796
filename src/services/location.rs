// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Latest location fix pushed by the platform.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::Location;

/// Holds only the most recent fix.
#[derive(Clone)]
pub struct LocationStore {
    latest: Arc<watch::Sender<Option<Location>>>,
    max_age: Duration,
}

impl LocationStore {
    pub fn new(max_age: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            latest: Arc::new(tx),
            max_age,
        }
    }

    /// Replace the current fix.
    pub fn update(&self, location: Location) {
        self.latest.send_replace(Some(location));
    }

    /// The current fix, or the `(0, 0)` sentinel when there is none or it is stale.
    pub fn current(&self, now: DateTime<Utc>) -> Location {
        let latest = *self.latest.borrow();
        match latest {
            Some(fix) if !self.is_stale(&fix, now) => fix,
            Some(fix) => {
                tracing::debug!(
                    fix_time = %fix.timestamp,
                    "Location fix is stale, treating as no fix"
                );
                Location::unknown(now)
            }
            None => Location::unknown(now),
        }
    }

    fn is_stale(&self, fix: &Location, now: DateTime<Utc>) -> bool {
        match (now - fix.timestamp).to_std() {
            Ok(age) => age > self.max_age,
            // Fix is timestamped in the future; accept it.
            Err(_) => false,
        }
    }
}
