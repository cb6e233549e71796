// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Backend-registered place with a circular geofence.

use serde::{Deserialize, Serialize};

/// A place owned by the backend. The client only holds a per-fetch copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    /// Place category (e.g. "restaurant", "grocery")
    #[serde(default)]
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Geofence radius around the place center, in meters
    #[serde(alias = "geofenceRadiusMeters", alias = "geofence_radius")]
    pub geofence_radius_meters: f64,
}

impl Place {
    /// Whether the record can take part in geofence matching.
    ///
    /// The radius must be non-negative and every number finite.
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.geofence_radius_meters.is_finite()
            && self.geofence_radius_meters >= 0.0
    }

    /// Place center as a `geo` point (x = longitude, y = latitude).
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}
