// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend REST API client for places and activity logs.
//!
//! Handles:
//! - Nearby place lookup for geofence matching
//! - Bulk activity-log upload
//! - Failing closed on unexpected status codes or response shapes

use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::models::activity::BulkActivityRequest;
use crate::models::{ActivityEvent, BulkActivityResponse, Place};

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl BackendClient {
    /// Create a client with a bounded per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.backend_base_url.clone(),
            config.backend_api_token.clone(),
            config.http_timeout,
        )
    }

    /// Places within `radius_km` of a coordinate.
    ///
    /// Records that cannot take part in geofence matching are dropped.
    pub async fn get_nearby_places(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<Place>, AppError> {
        let url = format!("{}/places/nearby", self.base_url);

        let request = self.http.get(&url).query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("radius_km", radius_km.to_string()),
        ]);

        let places: Vec<Place> = self.send_json(request).await?;
        let total = places.len();
        let places: Vec<Place> = places
            .into_iter()
            .filter(|p| {
                let ok = p.is_well_formed();
                if !ok {
                    tracing::warn!(
                        place_id = p.id,
                        radius = p.geofence_radius_meters,
                        "Discarding malformed place from backend"
                    );
                }
                ok
            })
            .collect();

        tracing::debug!(total, usable = places.len(), "Fetched nearby places");
        Ok(places)
    }

    /// Upload a batch of activity events in one request.
    pub async fn bulk_create_activity_logs(
        &self,
        user_id: &str,
        activities: &[ActivityEvent],
    ) -> Result<BulkActivityResponse, AppError> {
        let url = format!("{}/activity-logs/bulk", self.base_url);
        let body = BulkActivityRequest {
            user_id,
            activities,
        };

        let request = self.http.post(&url).json(&body);
        self.send_json(request).await
    }

    /// Attach auth, send, and parse a JSON body.
    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("backend request: {}", e))
            } else {
                AppError::Backend(e.to_string())
            }
        })?;

        self.check_response_json(response).await
    }

    /// Check response status and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Backend rate limit hit (429)");
            }

            return Err(AppError::Backend(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
    }
}
