// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place resolution against a mock backend and places API.

use chrono::Utc;
use nudge_notify::models::{Location, NotificationPriority, NotificationType};
use nudge_notify::services::{BackendClient, PlaceResolver, PlacesSearchClient};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;

const LAT: f64 = 37.3861;
const LON: f64 = -122.0839;

fn resolver(server: &common::MockServer, with_search: bool) -> PlaceResolver {
    let timeout = Duration::from_secs(2);
    let backend = BackendClient::new(server.base_url.clone(), None, timeout).unwrap();
    let search = with_search
        .then(|| PlacesSearchClient::new(server.base_url.clone(), "test-key", timeout).unwrap());
    PlaceResolver::new(backend, search)
}

#[tokio::test]
async fn test_no_fix_makes_no_network_calls() {
    let server = common::spawn_mock_server().await;
    let resolver = resolver(&server, true);

    let trigger = resolver
        .resolve_nearby_trigger(&Location::unknown(Utc::now()))
        .await;

    assert!(trigger.is_none());
    assert_eq!(server.state.total_hits(), 0);
}

#[tokio::test]
async fn test_inside_geofence_gives_high_priority_trigger() {
    let server = common::spawn_mock_server().await;
    server
        .state
        .set_places(vec![common::place_json(7, "Corner Deli", LAT, LON, 100.0)]);
    let resolver = resolver(&server, true);

    let here = common::north_of(LAT, LON, 80.0);
    let trigger = resolver.resolve_nearby_trigger(&here).await.unwrap();

    assert_eq!(trigger.place_id, "7");
    assert_eq!(trigger.place_name, "Corner Deli");
    assert_eq!(trigger.priority, NotificationPriority::High);
    assert_eq!(trigger.notification_type, NotificationType::GeofenceEnter);
    assert!(trigger.should_vibrate);
    assert!((trigger.distance_meters - 80.0).abs() < 0.5);
    assert_eq!(server.state.search_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_closest_of_several_geofences_wins() {
    let server = common::spawn_mock_server().await;
    let far = common::north_of(LAT, LON, 60.0);
    server.state.set_places(vec![
        common::place_json(1, "Far", far.latitude, LON, 200.0),
        common::place_json(2, "Near", LAT, LON, 200.0),
        common::place_json(3, "Outside", common::north_of(LAT, LON, 900.0).latitude, LON, 50.0),
    ]);
    let resolver = resolver(&server, true);

    let here = common::north_of(LAT, LON, 10.0);
    let trigger = resolver.resolve_nearby_trigger(&here).await.unwrap();

    assert_eq!(trigger.place_id, "2");
}

#[tokio::test]
async fn test_outside_geofence_falls_back_to_search() {
    let server = common::spawn_mock_server().await;
    server.state.set_places(vec![common::place_json(
        1,
        "Far Away",
        common::north_of(LAT, LON, 400.0).latitude,
        LON,
        100.0,
    )]);
    server.state.set_search_response(json!({
        "status": "OK",
        "results": [{ "name": "Taqueria", "place_id": "gp-1" }, { "name": "Pho House" }]
    }));
    let resolver = resolver(&server, true);

    let here = common::north_of(LAT, LON, 0.0);
    let trigger = resolver.resolve_nearby_trigger(&here).await.unwrap();

    assert_eq!(trigger.place_name, "Taqueria");
    assert_eq!(trigger.place_id, "gp-1");
    assert_eq!(trigger.notification_type, NotificationType::NearbyRestaurant);
    assert_eq!(trigger.priority, NotificationPriority::Medium);
    assert_eq!(trigger.distance_meters, 500.0);
    assert!(!trigger.should_vibrate);
}

#[tokio::test]
async fn test_backend_failure_still_uses_fallback() {
    let server = common::spawn_mock_server().await;
    server.state.places_fail.store(true, Ordering::SeqCst);
    server.state.set_search_response(json!({
        "status": "OK",
        "results": [{ "name": "Burger Barn" }]
    }));
    let resolver = resolver(&server, true);

    let trigger = resolver
        .resolve_nearby_trigger(&common::north_of(LAT, LON, 0.0))
        .await
        .unwrap();

    assert_eq!(trigger.place_name, "Burger Barn");
    assert_eq!(server.state.nearby_hits.load(Ordering::SeqCst), 1);
    assert_eq!(server.state.search_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_search_status_gives_no_trigger() {
    let server = common::spawn_mock_server().await;
    server.state.places_fail.store(true, Ordering::SeqCst);
    server.state.set_search_response(json!({
        "status": "REQUEST_DENIED",
        "error_message": "bad key"
    }));
    let resolver = resolver(&server, true);

    let trigger = resolver
        .resolve_nearby_trigger(&common::north_of(LAT, LON, 0.0))
        .await;

    assert!(trigger.is_none());
}

#[tokio::test]
async fn test_zero_results_gives_no_trigger() {
    let server = common::spawn_mock_server().await;
    let resolver = resolver(&server, true);

    let trigger = resolver
        .resolve_nearby_trigger(&common::north_of(LAT, LON, 0.0))
        .await;

    assert!(trigger.is_none());
    assert_eq!(server.state.search_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_without_search_key_no_fallback() {
    let server = common::spawn_mock_server().await;
    let resolver = resolver(&server, false);

    let trigger = resolver
        .resolve_nearby_trigger(&common::north_of(LAT, LON, 0.0))
        .await;

    assert!(trigger.is_none());
    assert_eq!(server.state.nearby_hits.load(Ordering::SeqCst), 1);
    assert_eq!(server.state.search_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_place_is_skipped() {
    let server = common::spawn_mock_server().await;
    server
        .state
        .set_places(vec![common::place_json(5, "Broken", LAT, LON, -1.0)]);
    let resolver = resolver(&server, false);

    let trigger = resolver
        .resolve_nearby_trigger(&common::north_of(LAT, LON, 0.0))
        .await;

    assert!(trigger.is_none());
}
