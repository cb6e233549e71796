// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place/geofence resolution for the current location.
//!
//! Handles the core workflow:
//! 1. Skip everything when there is no location fix
//! 2. Ask the backend for places near the fix
//! 3. Keep places whose geofence contains the fix, pick the closest
//! 4. Otherwise fall back to the external restaurant search
//!
//! Every failure degrades to "no trigger"; nothing here aborts a tick.

use crate::models::{Location, NotificationPriority, NotificationTrigger, NotificationType, Place};
use crate::services::backend::BackendClient;
use crate::services::distance;
use crate::services::places_search::{NearbyPlace, PlacesSearchClient, FALLBACK_SEARCH_RADIUS_METERS};

/// Candidate radius for the backend nearby-places query.
pub const NEARBY_QUERY_RADIUS_KM: f64 = 1.0;

/// Distance reported for fallback triggers.
///
/// This is the search radius, not the distance to the returned place.
pub const FALLBACK_REPORTED_DISTANCE_METERS: f64 = FALLBACK_SEARCH_RADIUS_METERS as f64;

/// Resolves the current location into an optional notification trigger.
#[derive(Clone)]
pub struct PlaceResolver {
    backend: BackendClient,
    places_search: Option<PlacesSearchClient>,
}

impl PlaceResolver {
    pub fn new(backend: BackendClient, places_search: Option<PlacesSearchClient>) -> Self {
        Self {
            backend,
            places_search,
        }
    }

    /// Find the place that should trigger a notification at `location`, if any.
    pub async fn resolve_nearby_trigger(&self, location: &Location) -> Option<NotificationTrigger> {
        if location.is_unknown() {
            tracing::debug!("No location fix, skipping place resolution");
            return None;
        }

        let places = match self
            .backend
            .get_nearby_places(location.latitude, location.longitude, NEARBY_QUERY_RADIUS_KM)
            .await
        {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!(error = %e, "Backend place lookup failed, using fallback search");
                Vec::new()
            }
        };

        if let Some((place, distance_meters)) = closest_in_geofence(location, &places) {
            tracing::info!(
                place_id = place.id,
                place = %place.name,
                distance_meters,
                radius_meters = place.geofence_radius_meters,
                "Inside geofence"
            );
            return Some(trigger_for_place(place, distance_meters));
        }

        self.fallback_trigger(location).await
    }

    async fn fallback_trigger(&self, location: &Location) -> Option<NotificationTrigger> {
        let search = self.places_search.as_ref()?;

        match search
            .nearby_restaurants(location.latitude, location.longitude)
            .await
        {
            Ok(results) => {
                let first = results.into_iter().next()?;
                tracing::info!(place = %first.name, "Using nearby restaurant fallback");
                Some(trigger_for_restaurant(&first))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Nearby restaurant search failed");
                None
            }
        }
    }
}

/// Closest place whose geofence contains `location`.
///
/// Ties on distance go to the lowest place id.
pub fn closest_in_geofence<'a>(location: &Location, places: &'a [Place]) -> Option<(&'a Place, f64)> {
    places
        .iter()
        .filter(|p| p.is_well_formed() && distance::within_geofence(location, p))
        .map(|p| (p, distance::distance_to_place(location, p)))
        .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.id.cmp(&b.id)))
}

fn icon_for_category(category: &str) -> &'static str {
    match category.to_ascii_lowercase().as_str() {
        "restaurant" | "cafe" | "fast_food" => "ic_restaurant",
        "grocery" | "supermarket" => "ic_grocery",
        "gym" => "ic_fitness",
        _ => "ic_place",
    }
}

/// Trigger for a backend place whose geofence contains the user.
pub fn trigger_for_place(place: &Place, distance_meters: f64) -> NotificationTrigger {
    NotificationTrigger {
        place_id: place.id.to_string(),
        place_name: place.name.clone(),
        category: place.category.clone(),
        notification_type: NotificationType::GeofenceEnter,
        message: format!("You're at {}. Remember to log what you eat!", place.name),
        priority: NotificationPriority::High,
        distance_meters,
        should_vibrate: true,
        icon: icon_for_category(&place.category).to_string(),
    }
}

/// Trigger synthesized from the first fallback search result.
pub fn trigger_for_restaurant(result: &NearbyPlace) -> NotificationTrigger {
    NotificationTrigger {
        place_id: result
            .place_id
            .clone()
            .unwrap_or_else(|| result.name.clone()),
        place_name: result.name.clone(),
        category: "restaurant".to_string(),
        notification_type: NotificationType::NearbyRestaurant,
        message: format!("{} is nearby. Planning a meal? Log it when you eat.", result.name),
        priority: NotificationPriority::Medium,
        distance_meters: FALLBACK_REPORTED_DISTANCE_METERS,
        should_vibrate: false,
        icon: icon_for_category("restaurant").to_string(),
    }
}
