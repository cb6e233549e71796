// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification delivery and the gate that decides what may be shown.
//!
//! `NotificationCenter` stands in for the platform notification service:
//! permission state, channel registry, shown history, and a live feed for
//! the shell. `NotificationGate` holds the policy for each notification path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{NotificationPriority, NotificationTrigger, VulnerabilityState};

/// Vibration timings (ms): wait, buzz, pause, buzz.
pub const VIBRATION_PATTERN: [u64; 4] = [0, 500, 200, 500];

/// Shown notifications kept for inspection.
const HISTORY_LIMIT: usize = 100;

const FEED_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    FoodReminders,
    LocationBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Default,
    High,
}

impl ChannelKind {
    pub fn id(self) -> &'static str {
        match self {
            ChannelKind::FoodReminders => "food_reminders",
            ChannelKind::LocationBased => "location_notifications",
        }
    }

    fn definition(self) -> NotificationChannel {
        match self {
            ChannelKind::FoodReminders => NotificationChannel {
                id: self.id(),
                name: "Food reminders",
                importance: Importance::Default,
                vibration_enabled: false,
            },
            ChannelKind::LocationBased => NotificationChannel {
                id: self.id(),
                name: "Location-based",
                importance: Importance::High,
                vibration_enabled: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub importance: Importance,
    pub vibration_enabled: bool,
}

/// Display priority handed to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPriority {
    Urgent,
    Default,
    Low,
}

impl From<NotificationPriority> for DisplayPriority {
    fn from(priority: NotificationPriority) -> Self {
        match priority {
            NotificationPriority::High => DisplayPriority::Urgent,
            NotificationPriority::Medium => DisplayPriority::Default,
            NotificationPriority::Low => DisplayPriority::Low,
        }
    }
}

/// Content of a notification to display.
#[derive(Debug, Clone)]
pub struct NotificationContent {
    pub title: String,
    pub message: String,
    pub priority: DisplayPriority,
    pub vibration_pattern: Option<Vec<u64>>,
    pub icon: Option<String>,
}

/// A notification that was actually displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShownNotification {
    pub id: u64,
    pub channel_id: &'static str,
    pub title: String,
    pub message: String,
    pub priority: DisplayPriority,
    pub vibration_pattern: Option<Vec<u64>>,
    pub icon: Option<String>,
    pub shown_at: DateTime<Utc>,
}

/// Platform notification delivery.
pub struct NotificationCenter {
    permission_granted: AtomicBool,
    channels: DashMap<ChannelKind, NotificationChannel>,
    history: Mutex<VecDeque<ShownNotification>>,
    next_id: AtomicU64,
    feed: broadcast::Sender<ShownNotification>,
}

impl NotificationCenter {
    pub fn new(permission_granted: bool) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            permission_granted: AtomicBool::new(permission_granted),
            channels: DashMap::new(),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
            next_id: AtomicU64::new(1),
            feed,
        }
    }

    pub fn set_permission(&self, granted: bool) {
        let previous = self.permission_granted.swap(granted, Ordering::SeqCst);
        if previous != granted {
            tracing::info!(granted, "Notification permission changed");
        }
    }

    pub fn has_permission(&self) -> bool {
        self.permission_granted.load(Ordering::SeqCst)
    }

    /// Register a channel. Safe to call repeatedly; returns `true` only on creation.
    pub fn ensure_channel(&self, kind: ChannelKind) -> bool {
        let mut created = false;
        self.channels.entry(kind).or_insert_with(|| {
            created = true;
            kind.definition()
        });
        if created {
            tracing::debug!(channel = kind.id(), "Created notification channel");
        }
        created
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        let mut channels: Vec<_> = self.channels.iter().map(|c| c.value().clone()).collect();
        channels.sort_by_key(|c| c.id);
        channels
    }

    /// Display a notification on a channel.
    ///
    /// Without permission this logs and returns `None`.
    pub fn show(&self, kind: ChannelKind, content: NotificationContent) -> Option<ShownNotification> {
        if !self.has_permission() {
            tracing::warn!(
                channel = kind.id(),
                title = %content.title,
                "Notification permission not granted, dropping notification"
            );
            return None;
        }

        self.ensure_channel(kind);

        let shown = ShownNotification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            channel_id: kind.id(),
            title: content.title,
            message: content.message,
            priority: content.priority,
            vibration_pattern: content.vibration_pattern,
            icon: content.icon,
            shown_at: Utc::now(),
        };

        {
            let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(shown.clone());
        }

        // No subscribers is fine.
        let _ = self.feed.send(shown.clone());

        tracing::info!(
            id = shown.id,
            channel = shown.channel_id,
            priority = ?shown.priority,
            "Notification shown"
        );
        Some(shown)
    }

    /// Shown notifications, oldest first.
    pub fn history(&self) -> Vec<ShownNotification> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShownNotification> {
        self.feed.subscribe()
    }
}

/// Decides whether a notification may be shown now.
#[derive(Clone)]
pub struct NotificationGate {
    center: Arc<NotificationCenter>,
}

impl NotificationGate {
    pub fn new(center: Arc<NotificationCenter>) -> Self {
        Self { center }
    }

    pub fn center(&self) -> &Arc<NotificationCenter> {
        &self.center
    }

    /// Food reminder path. Withheld at HIGH or CRITICAL vulnerability.
    ///
    /// Returns `true` only if the reminder was displayed.
    pub fn notify_food_reminder(
        &self,
        state: &VulnerabilityState,
        title: &str,
        message: &str,
    ) -> bool {
        self.center.ensure_channel(ChannelKind::FoodReminders);

        if state.vulnerability_level.blocks_reminders() {
            tracing::info!(
                level = ?state.vulnerability_level,
                activity = ?state.user_activity,
                "Food reminder suppressed"
            );
            return false;
        }

        self.center
            .show(
                ChannelKind::FoodReminders,
                NotificationContent {
                    title: title.to_string(),
                    message: message.to_string(),
                    priority: DisplayPriority::Default,
                    vibration_pattern: None,
                    icon: None,
                },
            )
            .is_some()
    }

    /// Location trigger path. Not gated on vulnerability.
    pub fn notify_location_trigger(&self, trigger: &NotificationTrigger) -> bool {
        self.center.ensure_channel(ChannelKind::LocationBased);

        self.center
            .show(
                ChannelKind::LocationBased,
                NotificationContent {
                    title: trigger.place_name.clone(),
                    message: trigger.message.clone(),
                    priority: trigger.priority.into(),
                    vibration_pattern: trigger.should_vibrate.then(|| VIBRATION_PATTERN.to_vec()),
                    icon: Some(trigger.icon.clone()),
                },
            )
            .is_some()
    }
}
