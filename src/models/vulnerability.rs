// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User activity, phone usage, and the derived vulnerability snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ActivityType;

/// Coarse user activity inferred from motion sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserActivity {
    Still,
    Walking,
    Running,
    OnBicycle,
    InVehicle,
    Tilting,
    Unknown,
}

impl UserActivity {
    /// The activity type recorded for this activity, if it is tracked at all.
    pub fn tracked_type(self) -> Option<ActivityType> {
        match self {
            UserActivity::Walking => Some(ActivityType::Walking),
            UserActivity::Running => Some(ActivityType::Running),
            UserActivity::OnBicycle => Some(ActivityType::Cycling),
            UserActivity::InVehicle => Some(ActivityType::InVehicle),
            UserActivity::Still | UserActivity::Tilting | UserActivity::Unknown => None,
        }
    }
}

/// How the phone is currently being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhoneUsage {
    ActivelyUsing,
    ScreenOnIdle,
    Pocket,
    FaceDown,
    ScreenOff,
    Unknown,
}

/// Risk tier for showing the user a notification right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnerabilityLevel {
    Safe,
    Moderate,
    High,
    Critical,
    Unknown,
}

impl VulnerabilityLevel {
    /// Levels at which food reminders are withheld.
    pub fn blocks_reminders(self) -> bool {
        matches!(self, VulnerabilityLevel::High | VulnerabilityLevel::Critical)
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            VulnerabilityLevel::Safe => "Safe to interact with your phone.",
            VulnerabilityLevel::Moderate => "Keep interactions short.",
            VulnerabilityLevel::High => "Avoid using your phone while moving.",
            VulnerabilityLevel::Critical => "Put your phone away until you stop.",
            VulnerabilityLevel::Unknown => "Unable to determine your current activity.",
        }
    }
}

/// Latest classifier output. Only the current value is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityState {
    pub user_activity: UserActivity,
    pub phone_usage: PhoneUsage,
    pub vulnerability_level: VulnerabilityLevel,
    /// Classification confidence, 0-100
    pub confidence: u8,
    pub recommendation_text: String,
    pub last_updated: DateTime<Utc>,
}

impl VulnerabilityState {
    /// Snapshot published before the first classification.
    pub fn unknown(now: DateTime<Utc>) -> Self {
        Self {
            user_activity: UserActivity::Unknown,
            phone_usage: PhoneUsage::Unknown,
            vulnerability_level: VulnerabilityLevel::Unknown,
            confidence: 0,
            recommendation_text: VulnerabilityLevel::Unknown.recommendation().to_string(),
            last_updated: now,
        }
    }
}
