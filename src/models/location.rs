// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Device location fix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single location fix reported by the platform.
///
/// `(0, 0)` is the "no fix" sentinel and must never be matched against places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// The "no GPS fix" sentinel.
    pub fn unknown(timestamp: DateTime<Utc>) -> Self {
        Self::new(0.0, 0.0, timestamp)
    }

    /// True for the `(0, 0)` sentinel and for non-finite coordinates.
    pub fn is_unknown(&self) -> bool {
        (self.latitude == 0.0 && self.longitude == 0.0)
            || !self.latitude.is_finite()
            || !self.longitude.is_finite()
    }

    /// Position as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}
