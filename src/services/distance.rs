// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance and geofence containment.

use crate::models::{Location, Place};
use geo::Point;

/// Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in decimal degrees.
///
/// Symmetric, non-negative, and zero when the points coincide.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Haversine distance between two `geo` points (x = longitude, y = latitude).
pub fn distance_between(a: Point<f64>, b: Point<f64>) -> f64 {
    distance_meters(a.y(), a.x(), b.y(), b.x())
}

/// Distance from a location to a place center.
pub fn distance_to_place(location: &Location, place: &Place) -> f64 {
    distance_between(location.point(), place.point())
}

/// Check whether a location falls inside a place's geofence (boundary inclusive).
pub fn within_geofence(location: &Location, place: &Place) -> bool {
    distance_to_place(location, place) <= place.geofence_radius_meters
}
