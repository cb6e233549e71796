// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External nearby-places search, used when no backend geofence matches.

use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;

/// Search radius for the restaurant fallback, in meters.
pub const FALLBACK_SEARCH_RADIUS_METERS: u32 = 500;

/// Nearby places search client.
#[derive(Clone)]
pub struct PlacesSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlacesSearchClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build a client if an API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        match &config.places_api_key {
            Some(key) => Ok(Some(Self::new(
                config.places_base_url.clone(),
                key.clone(),
                config.http_timeout,
            )?)),
            None => Ok(None),
        }
    }

    /// Restaurants within [`FALLBACK_SEARCH_RADIUS_METERS`] of a coordinate.
    ///
    /// `ZERO_RESULTS` is an empty list; any status other than `OK` is an error.
    pub async fn nearby_restaurants(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<NearbyPlace>, AppError> {
        let url = format!("{}/maps/api/place/nearbysearch/json", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("location", format!("{},{}", latitude, longitude)),
                ("radius", FALLBACK_SEARCH_RADIUS_METERS.to_string()),
                ("type", "restaurant".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::PlacesApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::PlacesApi(format!("HTTP {}", response.status())));
        }

        let body: NearbySearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::PlacesApi(format!("JSON parse error: {}", e)))?;

        match body.status.as_str() {
            "OK" => Ok(body.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(AppError::PlacesApi(format!(
                "status {}: {}",
                other,
                body.error_message.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

/// One result of the nearby search.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub vicinity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_response() {
        let json = r#"{"status":"OK","results":[{"name":"Taqueria","place_id":"abc"},{"name":"Pho"}]}"#;
        let body: NearbySearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, "OK");
        assert_eq!(body.results.len(), 2);
        assert_eq!(body.results[0].place_id.as_deref(), Some("abc"));
        assert!(body.results[1].place_id.is_none());
    }

    #[test]
    fn test_parse_zero_results_without_results_field() {
        let json = r#"{"status":"ZERO_RESULTS"}"#;
        let body: NearbySearchResponse = serde_json::from_str(json).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn test_from_config_without_key_disables_search() {
        let config = Config::test_default();
        assert!(PlacesSearchClient::from_config(&config).unwrap().is_none());
    }
}
