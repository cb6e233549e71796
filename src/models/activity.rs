// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Detected activity records and the bulk-sync wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Activity types that are tracked and synced to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Walking,
    Running,
    Cycling,
    InVehicle,
}

/// A detected activity segment, buffered until a bulk sync is acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_time_order"))]
pub struct ActivityEvent {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    pub activity_type: ActivityType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Detection confidence, 0-100
    #[validate(range(max = 100))]
    pub confidence: u8,
}

fn validate_time_order(event: &ActivityEvent) -> Result<(), ValidationError> {
    if event.end_time < event.start_time {
        return Err(ValidationError::new("end_time_before_start_time"));
    }
    Ok(())
}

/// Body of the bulk activity-log request.
#[derive(Debug, Serialize)]
pub struct BulkActivityRequest<'a> {
    pub user_id: &'a str,
    pub activities: &'a [ActivityEvent],
}

/// Backend acknowledgement of a bulk activity-log request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActivityResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created: Option<u32>,
}
