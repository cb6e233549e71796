// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Location-derived notification trigger.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    High,
    Medium,
    Low,
}

/// Where a trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Inside the geofence of a backend-registered place
    GeofenceEnter,
    /// Synthesized from the external nearby-restaurant search
    NearbyRestaurant,
}

/// A trigger computed fresh on each scheduler tick. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTrigger {
    pub place_id: String,
    pub place_name: String,
    pub category: String,
    pub notification_type: NotificationType,
    pub message: String,
    pub priority: NotificationPriority,
    pub distance_meters: f64,
    pub should_vibrate: bool,
    pub icon: String,
}
