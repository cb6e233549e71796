// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Stable name of the periodic location-check job.
pub const LOCATION_CHECK_WORK_NAME: &str = "location_check_work";

/// Upper bound for minute-valued settings (one week).
const MAX_MINUTES: u64 = 7 * 24 * 60;

/// Default external places search host.
const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Backend ---
    /// Base URL of the user profile/activity/place REST API
    pub backend_base_url: String,
    /// Bearer token sent with backend requests, if any
    pub backend_api_token: Option<String>,
    /// User whose activity is recorded
    pub user_id: String,

    // --- External places search ---
    /// API key for the nearby places search; fallback is disabled without one
    pub places_api_key: Option<String>,
    pub places_base_url: String,

    // --- Control surface ---
    /// Server port
    pub port: u16,

    // --- Timing ---
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
    /// Period of the location check job
    pub check_interval: Duration,
    /// Tolerance window at the end of each period
    pub check_flex: Duration,
    /// Location fixes older than this are treated as "no fix"
    pub location_max_age: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_base_url: "http://127.0.0.1:9".to_string(),
            backend_api_token: None,
            user_id: "test-user".to_string(),
            places_api_key: None,
            places_base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            port: 8080,
            http_timeout: Duration::from_secs(5),
            check_interval: Duration::from_secs(30 * 60),
            check_flex: Duration::from_secs(15 * 60),
            location_max_age: Duration::from_secs(15 * 60),
        }
    }
}

impl Config {
    /// Offline configuration for tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            backend_base_url: env::var("BACKEND_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BACKEND_BASE_URL"))?,
            backend_api_token: non_empty_var("BACKEND_API_TOKEN"),
            user_id: env::var("USER_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("USER_ID"))?,
            places_api_key: non_empty_var("PLACES_API_KEY"),
            places_base_url: env::var("PLACES_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_PLACES_BASE_URL.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 10)),
            check_interval: minutes_or("CHECK_INTERVAL_MINUTES", 30)?,
            check_flex: minutes_or("CHECK_FLEX_MINUTES", 15)?,
            location_max_age: minutes_or("LOCATION_MAX_AGE_MINUTES", 15)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "CHECK_INTERVAL_MINUTES must be positive".to_string(),
            ));
        }
        if self.check_flex > self.check_interval {
            return Err(ConfigError::Invalid(format!(
                "flex window ({}s) exceeds check interval ({}s)",
                self.check_flex.as_secs(),
                self.check_interval.as_secs()
            )));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a duration given in minutes, capped at [`MAX_MINUTES`].
fn minutes_or(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let minutes = parse_or(name, default);
    if minutes > MAX_MINUTES {
        return Err(ConfigError::Invalid(format!(
            "{} must be at most {} minutes, got {}",
            name, MAX_MINUTES, minutes
        )));
    }
    Ok(Duration::from_secs(minutes * 60))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
