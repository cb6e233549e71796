// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use nudge_notify::config::Config;
use nudge_notify::models::{ActivityEvent, ActivityType, Location};
use nudge_notify::routes::create_router;
use nudge_notify::services::distance::EARTH_RADIUS_METERS;
use nudge_notify::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Recorded traffic and canned responses for the mock backend and places API.
pub struct MockState {
    pub places: Mutex<Vec<Value>>,
    pub places_fail: AtomicBool,
    pub nearby_hits: AtomicUsize,
    pub bulk_fail: AtomicBool,
    pub bulk_hits: AtomicUsize,
    pub bulk_bodies: Mutex<Vec<Value>>,
    pub search_response: Mutex<Value>,
    pub search_hits: AtomicUsize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            places: Mutex::new(Vec::new()),
            places_fail: AtomicBool::new(false),
            nearby_hits: AtomicUsize::new(0),
            bulk_fail: AtomicBool::new(false),
            bulk_hits: AtomicUsize::new(0),
            bulk_bodies: Mutex::new(Vec::new()),
            search_response: Mutex::new(json!({ "status": "ZERO_RESULTS", "results": [] })),
            search_hits: AtomicUsize::new(0),
        }
    }
}

#[allow(dead_code)]
impl MockState {
    pub fn set_places(&self, places: Vec<Value>) {
        *self.places.lock().unwrap() = places;
    }

    pub fn set_search_response(&self, body: Value) {
        *self.search_response.lock().unwrap() = body;
    }

    pub fn total_hits(&self) -> usize {
        self.nearby_hits.load(Ordering::SeqCst)
            + self.bulk_hits.load(Ordering::SeqCst)
            + self.search_hits.load(Ordering::SeqCst)
    }
}

/// In-process HTTP server standing in for the backend and the places API.
#[allow(dead_code)]
pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

async fn nearby_places(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.nearby_hits.fetch_add(1, Ordering::SeqCst);
    if state.places_fail.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "boom" })),
        );
    }
    let places = state.places.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(places)))
}

async fn bulk_activity_logs(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.bulk_hits.fetch_add(1, Ordering::SeqCst);
    let count = body["activities"].as_array().map_or(0, |a| a.len());
    state.bulk_bodies.lock().unwrap().push(body);
    if state.bulk_fail.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "message": "unavailable" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "created": count })),
    )
}

async fn nearby_search(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.search_hits.fetch_add(1, Ordering::SeqCst);
    Json(state.search_response.lock().unwrap().clone())
}

/// Start the mock server on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_mock_server() -> MockServer {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/places/nearby", get(nearby_places))
        .route("/activity-logs/bulk", post(bulk_activity_logs))
        .route("/maps/api/place/nearbysearch/json", get(nearby_search))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Config pointing both collaborators at the mock server.
#[allow(dead_code)]
pub fn mock_config(server: &MockServer) -> Config {
    Config {
        backend_base_url: server.base_url.clone(),
        places_api_key: Some("test-key".to_string()),
        places_base_url: server.base_url.clone(),
        http_timeout: Duration::from_secs(2),
        ..Config::test_default()
    }
}

/// Create a test app with offline dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = AppState::new(config, CancellationToken::new()).expect("app state");
    (create_router(state.clone()), state)
}

/// A point `meters` due north of (lat, lon).
#[allow(dead_code)]
pub fn north_of(lat: f64, lon: f64, meters: f64) -> Location {
    let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
    Location::new(lat + d_lat, lon, Utc::now())
}

#[allow(dead_code)]
pub fn place_json(id: i64, name: &str, lat: f64, lon: f64, radius: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "category": "restaurant",
        "latitude": lat,
        "longitude": lon,
        "geofence_radius_meters": radius,
    })
}

#[allow(dead_code)]
pub fn walking_event(user_id: &str, minutes_ago: i64) -> ActivityEvent {
    let end = Utc::now() - ChronoDuration::minutes(minutes_ago);
    ActivityEvent {
        user_id: user_id.to_string(),
        activity_type: ActivityType::Walking,
        start_time: end - ChronoDuration::minutes(5),
        end_time: end,
        confidence: 90,
    }
}

/// Poll `cond` until it holds or five seconds pass.
#[allow(dead_code)]
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}
