// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One location-check tick: location fix, place resolution, notification.

use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::services::location::LocationStore;
use crate::services::notifications::NotificationGate;
use crate::services::resolver::PlaceResolver;
use crate::services::scheduler::{PeriodicScheduler, PeriodicTask};

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickReport {
    NoLocation,
    NoTrigger,
    Notified { place_id: String },
    /// A trigger was found but nothing was displayed (no permission).
    Suppressed { place_id: String },
}

/// Periodic task that turns the current location into a notification.
pub struct SmartNotificationWorker {
    locations: LocationStore,
    resolver: PlaceResolver,
    gate: NotificationGate,
}

impl SmartNotificationWorker {
    pub fn new(locations: LocationStore, resolver: PlaceResolver, gate: NotificationGate) -> Self {
        Self {
            locations,
            resolver,
            gate,
        }
    }

    pub async fn tick(&self) -> TickReport {
        let location = self.locations.current(Utc::now());
        if location.is_unknown() {
            tracing::debug!("No location fix for this tick");
            return TickReport::NoLocation;
        }

        let Some(trigger) = self.resolver.resolve_nearby_trigger(&location).await else {
            return TickReport::NoTrigger;
        };

        if self.gate.notify_location_trigger(&trigger) {
            TickReport::Notified {
                place_id: trigger.place_id,
            }
        } else {
            TickReport::Suppressed {
                place_id: trigger.place_id,
            }
        }
    }
}

impl PeriodicTask for SmartNotificationWorker {
    type Output = TickReport;

    async fn run(&self) -> Result<TickReport> {
        Ok(self.tick().await)
    }
}

impl PeriodicScheduler<SmartNotificationWorker> {
    /// Schedule the location-check job. Keeps an existing job.
    pub async fn start_location_checks(&self) -> bool {
        self.start().await
    }

    /// Cancel the location-check job by its work name.
    pub async fn stop_location_checks(&self) {
        self.stop().await
    }
}
