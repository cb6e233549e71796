// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the notification pipeline.

pub mod activity;
pub mod location;
pub mod notification;
pub mod place;
pub mod vulnerability;

pub use activity::{ActivityEvent, ActivityType, BulkActivityResponse};
pub use location::Location;
pub use notification::{NotificationPriority, NotificationTrigger, NotificationType};
pub use place::Place;
pub use vulnerability::{PhoneUsage, UserActivity, VulnerabilityLevel, VulnerabilityState};
