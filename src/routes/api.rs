// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inputs from the platform shell and read-only pipeline state.

use crate::error::{AppError, Result};
use crate::models::{ActivityEvent, Location, VulnerabilityState};
use crate::services::notifications::{NotificationChannel, ShownNotification};
use crate::services::SensorSample;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sensors", post(post_sensor_sample))
        .route("/api/vulnerability", get(get_vulnerability))
        .route("/api/activity-events", post(post_activity_event))
        .route("/api/activity-buffer", get(get_activity_buffer))
        .route("/api/activity-buffer/sync", post(post_activity_sync))
        .route("/api/location", post(post_location))
        .route("/api/connectivity", post(post_connectivity))
        .route("/api/notifications/permission", post(post_permission))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/channels", get(get_notification_channels))
        .route("/api/alarms/food-reminder", post(post_food_reminder))
}

// ─── Sensors and Activity ────────────────────────────────────

/// Queue one sensor sample for the classifier.
async fn post_sensor_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<SensorSample>,
) -> Result<StatusCode> {
    if !sample.is_finite() {
        return Err(AppError::BadRequest(
            "sensor values must be finite".to_string(),
        ));
    }
    state.engine.submit_sample(sample)?;
    Ok(StatusCode::ACCEPTED)
}

async fn get_vulnerability(State(state): State<Arc<AppState>>) -> Json<VulnerabilityState> {
    Json(state.engine.vulnerability())
}

/// Record an activity detected by the platform's activity recognition.
async fn post_activity_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ActivityEvent>,
) -> Result<StatusCode> {
    event.validate()?;
    state.engine.record(event).await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Serialize)]
pub struct BufferStatusResponse {
    pub pending: usize,
    pub last_sync_time: String,
    pub sync_in_flight: bool,
}

async fn get_activity_buffer(State(state): State<Arc<AppState>>) -> Json<BufferStatusResponse> {
    let status = state.engine.buffer_status();
    Json(BufferStatusResponse {
        pending: status.pending,
        last_sync_time: format_utc_rfc3339(status.last_sync_time),
        sync_in_flight: status.sync_in_flight,
    })
}

async fn post_activity_sync(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    state.engine.request_sync().await?;
    Ok(StatusCode::ACCEPTED)
}

// ─── Location and Connectivity ───────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Fix time; defaults to now
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

async fn post_location(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LocationRequest>,
) -> Result<StatusCode> {
    req.validate()?;
    let timestamp = req.timestamp.unwrap_or_else(Utc::now);
    state
        .locations
        .update(Location::new(req.latitude, req.longitude, timestamp));
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ConnectivityRequest {
    pub connected: bool,
}

async fn post_connectivity(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectivityRequest>,
) -> StatusCode {
    state.connectivity.set_connected(req.connected);
    StatusCode::NO_CONTENT
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

async fn post_permission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PermissionRequest>,
) -> StatusCode {
    state.notifications.set_permission(req.granted);
    StatusCode::NO_CONTENT
}

async fn get_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<ShownNotification>> {
    Json(state.notifications.history())
}

/// Channels registered so far. Channels are created on first use.
async fn get_notification_channels(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<NotificationChannel>> {
    Json(state.notifications.channels())
}

#[derive(Debug, Deserialize, Validate)]
pub struct FoodReminderRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

#[derive(Serialize)]
pub struct FoodReminderResponse {
    pub shown: bool,
}

/// Alarm fired for a scheduled food reminder.
async fn post_food_reminder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FoodReminderRequest>,
) -> Result<Json<FoodReminderResponse>> {
    req.validate()?;
    let shown = state.engine.food_reminder(req.title, req.message).await?;
    Ok(Json(FoodReminderResponse { shown }))
}
