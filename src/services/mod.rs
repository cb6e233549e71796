// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - pipeline logic layer.

pub mod activity_buffer;
pub mod backend;
pub mod classifier;
pub mod connectivity;
pub mod distance;
pub mod engine;
pub mod location;
pub mod notifications;
pub mod places_search;
pub mod resolver;
pub mod scheduler;
pub mod worker;

pub use activity_buffer::{ActivityBuffer, BufferStatus};
pub use backend::BackendClient;
pub use classifier::{ActivityClassifier, SensorSample, TransitionTracker};
pub use connectivity::ConnectivityMonitor;
pub use engine::{ActivityEngine, EngineHandle};
pub use location::LocationStore;
pub use notifications::{NotificationCenter, NotificationGate};
pub use places_search::PlacesSearchClient;
pub use resolver::PlaceResolver;
pub use scheduler::{PeriodicScheduler, PeriodicTask, ScheduleOptions, ScheduleState};
pub use worker::{SmartNotificationWorker, TickReport};
