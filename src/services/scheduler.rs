// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic job scheduling with a flex window, a network constraint, and
//! exponential retry backoff.
//!
//! A run becomes eligible `interval - flex` after its period starts and must
//! start before the period ends. When connectivity never shows up inside that
//! window the run is skipped. A failed or timed-out run is retried after
//! 30 s, 60 s, 120 s, ... capped at 5 hours.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::services::connectivity::ConnectivityMonitor;

/// Upper bound on a single run.
pub const TICK_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// First retry delay.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(30);

/// Retry delay ceiling.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60 * 60);

/// Work executed once per period.
pub trait PeriodicTask: Send + Sync + 'static {
    type Output: std::fmt::Debug + Send;

    fn run(&self) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleState {
    Unscheduled,
    Scheduled,
    Running,
    RetryPending { attempt: u32 },
}

/// Timing parameters for a periodic job.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    pub interval: Duration,
    pub flex: Duration,
    pub tick_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ScheduleOptions {
    pub fn new(interval: Duration, flex: Duration) -> Self {
        Self {
            interval,
            flex: flex.min(interval),
            tick_timeout: TICK_TIMEOUT,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.check_interval, config.check_flex)
    }

    /// Retry delays for one period: `initial_backoff`, doubling each attempt,
    /// capped at `max_backoff`.
    pub fn retry_strategy(&self) -> ExponentialBackoff {
        let factor = (self.initial_backoff.as_millis() / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(u64::try_from(factor).unwrap_or(u64::MAX))
            .max_delay(self.max_backoff)
    }
}

struct Job {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs one named [`PeriodicTask`] at a time.
pub struct PeriodicScheduler<T: PeriodicTask> {
    work_name: String,
    task: Arc<T>,
    connectivity: ConnectivityMonitor,
    options: ScheduleOptions,
    state: Arc<watch::Sender<ScheduleState>>,
    job: Mutex<Option<Job>>,
    shutdown: CancellationToken,
}

impl<T: PeriodicTask> PeriodicScheduler<T> {
    pub fn new(
        work_name: impl Into<String>,
        task: T,
        connectivity: ConnectivityMonitor,
        options: ScheduleOptions,
        shutdown: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(ScheduleState::Unscheduled);
        Self {
            work_name: work_name.into(),
            task: Arc::new(task),
            connectivity,
            options,
            state: Arc::new(state),
            job: Mutex::new(None),
            shutdown,
        }
    }

    pub fn work_name(&self) -> &str {
        &self.work_name
    }

    pub fn state(&self) -> ScheduleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.state.subscribe()
    }

    /// Schedule the job unless it is already scheduled.
    ///
    /// Returns `true` when a new job was created.
    pub async fn start(&self) -> bool {
        let mut job = self.job.lock().await;
        if let Some(existing) = job.as_ref() {
            if !existing.handle.is_finished() {
                tracing::debug!(work = %self.work_name, "Job already scheduled, keeping it");
                return false;
            }
        }

        let cancel = self.shutdown.child_token();
        self.state.send_replace(ScheduleState::Scheduled);

        let handle = tokio::spawn(run_schedule(
            self.work_name.clone(),
            Arc::clone(&self.task),
            self.connectivity.clone(),
            self.options,
            Arc::clone(&self.state),
            cancel.clone(),
        ));

        tracing::info!(
            work = %self.work_name,
            interval_secs = self.options.interval.as_secs(),
            flex_secs = self.options.flex.as_secs(),
            "Periodic job scheduled"
        );
        *job = Some(Job { cancel, handle });
        true
    }

    /// Cancel the job. An in-flight run is abandoned.
    pub async fn stop(&self) {
        let job = self.job.lock().await.take();
        if let Some(job) = job {
            job.cancel.cancel();
            if let Err(e) = job.handle.await {
                tracing::error!(work = %self.work_name, error = %e, "Periodic job panicked");
            }
            tracing::info!(work = %self.work_name, "Periodic job cancelled");
        }
        self.state.send_replace(ScheduleState::Unscheduled);
    }
}

async fn run_schedule<T: PeriodicTask>(
    work_name: String,
    task: Arc<T>,
    connectivity: ConnectivityMonitor,
    options: ScheduleOptions,
    state: Arc<watch::Sender<ScheduleState>>,
    cancel: CancellationToken,
) {
    let mut period_start = Instant::now();

    loop {
        state.send_replace(ScheduleState::Scheduled);

        let window_open = period_start + (options.interval - options.flex);
        let window_close = period_start + options.interval;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep_until(window_open) => {}
        }

        let limit = window_close.saturating_duration_since(Instant::now());
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            connected = connectivity.wait_connected(limit) => connected,
        };
        if !connected {
            tracing::info!(work = %work_name, "No network during flex window, skipping run");
            period_start += options.interval;
            continue;
        }

        let mut attempt: u32 = 0;
        let mut delays = options.retry_strategy();
        loop {
            state.send_replace(ScheduleState::Running);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    state.send_replace(ScheduleState::Unscheduled);
                    return;
                }
                outcome = tokio::time::timeout(options.tick_timeout, task.run()) => outcome,
            };

            match outcome {
                Ok(Ok(output)) => {
                    tracing::info!(work = %work_name, ?output, "Periodic run complete");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        work = %work_name,
                        error = %e,
                        transient = e.is_transient(),
                        "Periodic run failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        work = %work_name,
                        timeout_secs = options.tick_timeout.as_secs(),
                        "Periodic run timed out"
                    );
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = delays.next().unwrap_or(options.max_backoff);
            state.send_replace(ScheduleState::RetryPending { attempt });
            tracing::info!(
                work = %work_name,
                attempt,
                delay_secs = delay.as_secs(),
                "Retry pending"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    state.send_replace(ScheduleState::Unscheduled);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let connected = tokio::select! {
                _ = cancel.cancelled() => {
                    state.send_replace(ScheduleState::Unscheduled);
                    return;
                }
                connected = connectivity.wait_connected(options.flex) => connected,
            };
            if !connected {
                tracing::info!(work = %work_name, attempt, "No network for retry, waiting for next period");
                break;
            }
        }

        period_start += options.interval;
        let now = Instant::now();
        if period_start + (options.interval - options.flex) < now {
            // Retries ran past the next window.
            period_start = now;
        }
    }

    state.send_replace(ScheduleState::Unscheduled);
}
