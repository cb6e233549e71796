// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Nudge notify: context-aware food reminders.
//!
//! This crate hosts the smart-notification pipeline. It classifies how
//! distracted the user is from phone sensors, buffers detected activities
//! for bulk upload, checks the current location against nearby place
//! geofences on a periodic schedule, and decides whether a notification
//! may be shown.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use config::{Config, LOCATION_CHECK_WORK_NAME};
use error::Result;
use services::{
    ActivityEngine, BackendClient, ConnectivityMonitor, EngineHandle, LocationStore,
    NotificationCenter, NotificationGate, PeriodicScheduler, PlaceResolver, PlacesSearchClient,
    ScheduleOptions, SmartNotificationWorker,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engine: EngineHandle,
    pub locations: LocationStore,
    pub connectivity: ConnectivityMonitor,
    pub notifications: Arc<NotificationCenter>,
    pub scheduler: PeriodicScheduler<SmartNotificationWorker>,
}

impl AppState {
    /// Wire up the pipeline and spawn the activity engine.
    ///
    /// Background tasks stop when `shutdown` is cancelled. Location checks
    /// are not scheduled until [`PeriodicScheduler::start_location_checks`].
    pub fn new(config: Config, shutdown: CancellationToken) -> Result<Arc<Self>> {
        let backend = BackendClient::from_config(&config)?;
        let places_search = PlacesSearchClient::from_config(&config)?;
        if places_search.is_none() {
            tracing::warn!("PLACES_API_KEY not set, nearby restaurant fallback disabled");
        }

        // Permission is unknown until the platform shell reports it.
        let notifications = Arc::new(NotificationCenter::new(false));
        let gate = NotificationGate::new(Arc::clone(&notifications));

        let (engine, _engine_task) = ActivityEngine::spawn(
            config.user_id.clone(),
            backend.clone(),
            gate.clone(),
            shutdown.clone(),
        );

        let locations = LocationStore::new(config.location_max_age);
        let connectivity = ConnectivityMonitor::new(true);

        let worker = SmartNotificationWorker::new(
            locations.clone(),
            PlaceResolver::new(backend, places_search),
            gate,
        );
        let scheduler = PeriodicScheduler::new(
            LOCATION_CHECK_WORK_NAME,
            worker,
            connectivity.clone(),
            ScheduleOptions::from_config(&config),
            shutdown,
        );

        Ok(Arc::new(AppState {
            config,
            engine,
            locations,
            connectivity,
            notifications,
            scheduler,
        }))
    }
}
