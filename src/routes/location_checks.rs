// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Start, stop and inspect the periodic location-check job.

use crate::services::ScheduleState;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/location-checks",
        post(start_location_checks)
            .delete(stop_location_checks)
            .get(get_location_checks),
    )
}

#[derive(Serialize)]
pub struct StartResponse {
    pub newly_scheduled: bool,
}

async fn start_location_checks(State(state): State<Arc<AppState>>) -> Json<StartResponse> {
    let newly_scheduled = state.scheduler.start_location_checks().await;
    Json(StartResponse { newly_scheduled })
}

async fn stop_location_checks(State(state): State<Arc<AppState>>) -> StatusCode {
    state.scheduler.stop_location_checks().await;
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
pub struct LocationChecksResponse {
    pub work_name: String,
    #[serde(flatten)]
    pub state: ScheduleState,
}

async fn get_location_checks(State(state): State<Arc<AppState>>) -> Json<LocationChecksResponse> {
    Json(LocationChecksResponse {
        work_name: state.scheduler.work_name().to_string(),
        state: state.scheduler.state(),
    })
}
