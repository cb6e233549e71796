// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pending activity events awaiting a bulk sync.
//!
//! The buffer is plain state with no I/O. The activity engine owns it and is
//! the only caller, which serializes record and sync.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::ActivityEvent;

/// Pending count that triggers a sync.
pub const SYNC_BATCH_SIZE: usize = 10;

/// Maximum time between syncs while events are pending.
pub const SYNC_MAX_AGE_MINUTES: i64 = 30;

/// Snapshot of the buffer for observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferStatus {
    pub pending: usize,
    pub last_sync_time: DateTime<Utc>,
    pub sync_in_flight: bool,
}

#[derive(Debug, Clone)]
pub struct ActivityBuffer {
    pending: Vec<ActivityEvent>,
    last_sync_time: DateTime<Utc>,
    /// Number of leading events handed to the sync currently in flight
    in_flight: Option<usize>,
}

impl ActivityBuffer {
    /// Create an empty buffer. The sync clock starts at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            pending: Vec::new(),
            last_sync_time: now,
            in_flight: None,
        }
    }

    /// Append an event. Returns `true` when a sync is now due.
    pub fn record(&mut self, event: ActivityEvent, now: DateTime<Utc>) -> bool {
        self.pending.push(event);
        self.sync_due(now)
    }

    /// A sync is due when events are pending and either the batch is full
    /// or the last sync is too old.
    pub fn sync_due(&self, now: DateTime<Utc>) -> bool {
        !self.pending.is_empty()
            && (self.pending.len() >= SYNC_BATCH_SIZE
                || now - self.last_sync_time > Duration::minutes(SYNC_MAX_AGE_MINUTES))
    }

    /// Hand out a copy of every pending event for a bulk request.
    ///
    /// Returns `None` while another sync is in flight or nothing is pending.
    pub fn begin_sync(&mut self) -> Option<Vec<ActivityEvent>> {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return None;
        }
        self.in_flight = Some(self.pending.len());
        Some(self.pending.clone())
    }

    /// Settle the in-flight sync.
    ///
    /// On success exactly the events that were sent are removed; anything
    /// recorded while the request was outstanding stays. On failure nothing
    /// is removed so the batch is retried later.
    pub fn complete_sync(&mut self, success: bool, now: DateTime<Utc>) {
        let Some(sent) = self.in_flight.take() else {
            return;
        };
        if success {
            self.pending.drain(..sent.min(self.pending.len()));
            self.last_sync_time = now;
        }
    }

    pub fn pending(&self) -> &[ActivityEvent] {
        &self.pending
    }

    pub fn last_sync_time(&self) -> DateTime<Utc> {
        self.last_sync_time
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus {
            pending: self.pending.len(),
            last_sync_time: self.last_sync_time,
            sync_in_flight: self.in_flight.is_some(),
        }
    }
}
