// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity engine: the single owner of classifier and buffer state.
//!
//! Sensor callbacks, the control surface, and alarms talk to the engine
//! through a bounded channel. Consumers read the latest vulnerability
//! snapshot and buffer status through `watch` channels. Bulk syncs run in a
//! spawned task on a copy of the pending list and report back, so sensor
//! processing never waits on the network.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{ActivityEvent, VulnerabilityState};
use crate::services::activity_buffer::{ActivityBuffer, BufferStatus};
use crate::services::backend::BackendClient;
use crate::services::classifier::{
    ActivityClassifier, SensorSample, TransitionTracker, CLASSIFY_INTERVAL,
    MIN_TRANSITION_CONFIDENCE,
};
use crate::services::notifications::NotificationGate;

/// Capacity of the engine inbox.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Messages accepted by the engine.
#[derive(Debug)]
pub enum EngineEvent {
    Sensor(SensorSample),
    Record(ActivityEvent),
    FoodReminderAlarm {
        title: String,
        message: String,
        reply: oneshot::Sender<bool>,
    },
    SyncNow,
    ClassifyNow,
}

/// Result of a spawned bulk sync.
#[derive(Debug)]
struct SyncOutcome {
    sent: usize,
    success: bool,
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
    vulnerability: watch::Receiver<VulnerabilityState>,
    buffer: watch::Receiver<BufferStatus>,
}

impl EngineHandle {
    /// Non-blocking submit for sensor callbacks. Fails when the inbox is full.
    pub fn submit_sample(&self, sample: SensorSample) -> Result<()> {
        self.tx
            .try_send(EngineEvent::Sensor(sample))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    AppError::Unavailable("engine inbox full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    AppError::Unavailable("engine stopped".to_string())
                }
            })
    }

    /// Buffer an externally detected activity event.
    pub async fn record(&self, event: ActivityEvent) -> Result<()> {
        self.send(EngineEvent::Record(event)).await
    }

    pub async fn request_sync(&self) -> Result<()> {
        self.send(EngineEvent::SyncNow).await
    }

    /// Recompute the classification now instead of waiting for the next tick.
    pub async fn classify_now(&self) -> Result<()> {
        self.send(EngineEvent::ClassifyNow).await
    }

    /// Deliver a food reminder alarm. Returns whether it was displayed.
    pub async fn food_reminder(&self, title: String, message: String) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineEvent::FoodReminderAlarm {
            title,
            message,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| AppError::Unavailable("engine dropped alarm".to_string()))
    }

    pub fn vulnerability(&self) -> VulnerabilityState {
        self.vulnerability.borrow().clone()
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.buffer.borrow().clone()
    }

    async fn send(&self, event: EngineEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::Unavailable("engine stopped".to_string()))
    }
}

/// Engine state. Lives inside the spawned task.
pub struct ActivityEngine {
    user_id: String,
    classifier: ActivityClassifier,
    tracker: TransitionTracker,
    buffer: ActivityBuffer,
    backend: BackendClient,
    gate: NotificationGate,
    vulnerability_tx: watch::Sender<VulnerabilityState>,
    buffer_tx: watch::Sender<BufferStatus>,
    sync_done_tx: mpsc::UnboundedSender<SyncOutcome>,
}

impl ActivityEngine {
    /// Spawn the engine task. It runs until `cancel` fires.
    pub fn spawn(
        user_id: String,
        backend: BackendClient,
        gate: NotificationGate,
        cancel: CancellationToken,
    ) -> (EngineHandle, JoinHandle<()>) {
        let now = Utc::now();
        let buffer = ActivityBuffer::new(now);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (vulnerability_tx, vulnerability_rx) = watch::channel(VulnerabilityState::unknown(now));
        let (buffer_tx, buffer_rx) = watch::channel(buffer.status());
        let (sync_done_tx, sync_done_rx) = mpsc::unbounded_channel();

        let engine = ActivityEngine {
            tracker: TransitionTracker::new(user_id.clone()),
            user_id,
            classifier: ActivityClassifier::new(),
            buffer,
            backend,
            gate,
            vulnerability_tx,
            buffer_tx,
            sync_done_tx,
        };

        let handle = tokio::spawn(engine.run(rx, sync_done_rx, cancel));

        (
            EngineHandle {
                tx,
                vulnerability: vulnerability_rx,
                buffer: buffer_rx,
            },
            handle,
        )
    }

    async fn run(
        mut self,
        mut rx: mpsc::Receiver<EngineEvent>,
        mut sync_done_rx: mpsc::UnboundedReceiver<SyncOutcome>,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(CLASSIFY_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(user_id = %self.user_id, "Activity engine started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(
                        pending = self.buffer.pending().len(),
                        "Activity engine shutting down"
                    );
                    break;
                }
                _ = ticker.tick() => self.reclassify(),
                Some(outcome) = sync_done_rx.recv() => self.finish_sync(outcome),
                event = rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }
    }

    fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Sensor(sample) => self.classifier.ingest(sample),
            EngineEvent::Record(event) => self.record(event),
            EngineEvent::FoodReminderAlarm {
                title,
                message,
                reply,
            } => {
                let state = self.vulnerability_tx.borrow().clone();
                let shown = self.gate.notify_food_reminder(&state, &title, &message);
                // Caller may have gone away.
                let _ = reply.send(shown);
            }
            EngineEvent::SyncNow => self.start_sync(),
            EngineEvent::ClassifyNow => self.reclassify(),
        }
    }

    /// Recompute and publish the snapshot; close any finished activity segment.
    fn reclassify(&mut self) {
        let now = Utc::now();
        let state = self.classifier.classify(now);

        if let Some(event) = self
            .tracker
            .observe(state.user_activity, state.confidence, now)
        {
            tracing::info!(
                activity = ?event.activity_type,
                start = %event.start_time,
                end = %event.end_time,
                "Activity segment closed"
            );
            self.record(event);
        }

        let changed = {
            let previous = self.vulnerability_tx.borrow();
            previous.vulnerability_level != state.vulnerability_level
                || previous.user_activity != state.user_activity
        };
        if changed {
            tracing::info!(
                activity = ?state.user_activity,
                usage = ?state.phone_usage,
                level = ?state.vulnerability_level,
                confidence = state.confidence,
                open_segment = ?self.tracker.open_activity(),
                "Vulnerability changed"
            );
        }
        self.vulnerability_tx.send_replace(state);

        // Retries a failed batch and flushes old events even without new records.
        if self.buffer.sync_due(now) {
            self.start_sync();
        }
    }

    fn record(&mut self, event: ActivityEvent) {
        if event.confidence < MIN_TRANSITION_CONFIDENCE {
            tracing::debug!(
                activity = ?event.activity_type,
                confidence = event.confidence,
                "Discarding low-confidence activity event"
            );
            return;
        }

        let due = self.buffer.record(event, Utc::now());
        self.publish_buffer();
        if due {
            self.start_sync();
        }
    }

    fn start_sync(&mut self) {
        let Some(batch) = self.buffer.begin_sync() else {
            return;
        };
        self.publish_buffer();

        let backend = self.backend.clone();
        let user_id = self.user_id.clone();
        let done = self.sync_done_tx.clone();
        let sent = batch.len();

        tracing::info!(count = sent, "Syncing activity events");

        tokio::spawn(async move {
            let success = match backend.bulk_create_activity_logs(&user_id, &batch).await {
                Ok(response) if response.success => true,
                Ok(response) => {
                    tracing::warn!(
                        message = ?response.message,
                        "Backend rejected activity batch, will retry"
                    );
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Activity sync failed, will retry");
                    false
                }
            };
            let _ = done.send(SyncOutcome { sent, success });
        });
    }

    fn finish_sync(&mut self, outcome: SyncOutcome) {
        self.buffer.complete_sync(outcome.success, Utc::now());
        if outcome.success {
            tracing::info!(
                synced = outcome.sent,
                remaining = self.buffer.pending().len(),
                "Activity events synced"
            );
        }
        self.publish_buffer();
    }

    fn publish_buffer(&self) {
        self.buffer_tx.send_replace(self.buffer.status());
    }
}
