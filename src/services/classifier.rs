// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity and vulnerability classification from raw device sensors.
//!
//! Motion samples feed two rolling windows (accelerometer and gyroscope
//! magnitudes). On each recompute the windows are reduced to a few features
//! and run through ordered threshold rules. The first matching rule wins, and
//! the rule order is significant because the thresholds overlap.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    ActivityEvent, ActivityType, PhoneUsage, UserActivity, VulnerabilityLevel, VulnerabilityState,
};

/// Number of magnitude samples kept per sensor.
pub const WINDOW_SIZE: usize = 10;

/// Accelerometer samples required before any activity is inferred.
pub const MIN_ACCEL_SAMPLES: usize = WINDOW_SIZE / 2;

/// Cadence of the classification recompute.
pub const CLASSIFY_INTERVAL: Duration = Duration::from_secs(30);

/// Minimum confidence for an activity transition to open a tracked segment.
pub const MIN_TRANSITION_CONFIDENCE: u8 = 75;

/// A raw sample delivered by the platform sensor callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorSample {
    Accelerometer { x: f64, y: f64, z: f64 },
    Gyroscope { x: f64, y: f64, z: f64 },
    Proximity { near: bool },
    Screen { on: bool },
    Interaction { active: bool },
    Orientation { face_down: bool },
}

impl SensorSample {
    /// Rejects NaN and infinite vector components.
    pub fn is_finite(&self) -> bool {
        match *self {
            SensorSample::Accelerometer { x, y, z } | SensorSample::Gyroscope { x, y, z } => {
                x.is_finite() && y.is_finite() && z.is_finite()
            }
            _ => true,
        }
    }
}

fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Fixed-capacity window that evicts the oldest sample.
#[derive(Debug, Clone)]
struct RollingWindow {
    samples: VecDeque<f64>,
}

impl RollingWindow {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    fn push(&mut self, value: f64) {
        if self.samples.len() == WINDOW_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population variance.
    fn variance(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.samples
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.samples.len() as f64
    }

    /// Fill level as a percentage of the window capacity.
    fn fill_percent(&self) -> u8 {
        (self.samples.len() * 100 / WINDOW_SIZE) as u8
    }
}

/// Window statistics fed into the activity rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFeatures {
    pub avg_accel: f64,
    pub accel_variance: f64,
    pub avg_gyro: f64,
    pub accel_samples: usize,
    pub gyro_samples: usize,
}

/// Ordered threshold rules; the first match wins.
pub fn classify_activity(f: &MotionFeatures) -> UserActivity {
    if f.accel_samples < MIN_ACCEL_SAMPLES {
        return UserActivity::Unknown;
    }

    if f.accel_variance > 15.0 && f.avg_accel > 15.0 {
        UserActivity::Running
    } else if f.accel_variance > 10.0 && f.avg_accel > 12.0 {
        UserActivity::Walking
    } else if f.accel_variance > 5.0 && f.avg_gyro > 1.5 {
        UserActivity::InVehicle
    } else if f.accel_variance > 3.0 && f.avg_gyro > 0.8 {
        UserActivity::OnBicycle
    } else if f.avg_gyro > 0.5 {
        UserActivity::Tilting
    } else if f.accel_variance < 2.0 {
        UserActivity::Still
    } else {
        UserActivity::Unknown
    }
}

/// Phone handling from proximity and screen state.
///
/// `screen_on` is `None` until the platform has reported the screen state.
pub fn classify_phone_usage(
    proximity_near: bool,
    screen_on: Option<bool>,
    interacting: bool,
    face_down: bool,
) -> PhoneUsage {
    match screen_on {
        Some(false) if proximity_near => PhoneUsage::Pocket,
        Some(true) if proximity_near => PhoneUsage::ActivelyUsing,
        Some(true) if interacting => PhoneUsage::ActivelyUsing,
        Some(true) => PhoneUsage::ScreenOnIdle,
        Some(false) if face_down => PhoneUsage::FaceDown,
        Some(false) => PhoneUsage::ScreenOff,
        None => PhoneUsage::Unknown,
    }
}

/// Activity x phone-usage decision table. Unlisted combinations are UNKNOWN.
pub fn vulnerability_level(activity: UserActivity, usage: PhoneUsage) -> VulnerabilityLevel {
    use PhoneUsage as P;
    use UserActivity as A;

    match (activity, usage) {
        (A::OnBicycle, _) => VulnerabilityLevel::Critical,
        (A::InVehicle, P::ActivelyUsing) => VulnerabilityLevel::Critical,
        (A::Walking, P::ActivelyUsing | P::ScreenOnIdle | P::Pocket) => VulnerabilityLevel::High,
        (A::Still, P::ActivelyUsing) => VulnerabilityLevel::Moderate,
        (A::Still, P::ScreenOff | P::FaceDown) => VulnerabilityLevel::Safe,
        _ => VulnerabilityLevel::Unknown,
    }
}

/// Sensor state owned by the activity engine.
#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    accel: RollingWindow,
    gyro: RollingWindow,
    proximity_near: bool,
    screen_on: Option<bool>,
    interacting: bool,
    face_down: bool,
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityClassifier {
    pub fn new() -> Self {
        Self {
            accel: RollingWindow::new(),
            gyro: RollingWindow::new(),
            proximity_near: false,
            screen_on: None,
            interacting: false,
            face_down: false,
        }
    }

    /// Apply one raw sample. Motion samples go into their windows as magnitudes.
    pub fn ingest(&mut self, sample: SensorSample) {
        match sample {
            SensorSample::Accelerometer { x, y, z } => self.accel.push(magnitude(x, y, z)),
            SensorSample::Gyroscope { x, y, z } => self.gyro.push(magnitude(x, y, z)),
            SensorSample::Proximity { near } => self.proximity_near = near,
            SensorSample::Screen { on } => {
                self.screen_on = Some(on);
                if !on {
                    self.interacting = false;
                }
            }
            SensorSample::Interaction { active } => self.interacting = active,
            SensorSample::Orientation { face_down } => self.face_down = face_down,
        }
    }

    pub fn features(&self) -> MotionFeatures {
        MotionFeatures {
            avg_accel: self.accel.mean(),
            accel_variance: self.accel.variance(),
            avg_gyro: self.gyro.mean(),
            accel_samples: self.accel.len(),
            gyro_samples: self.gyro.len(),
        }
    }

    /// Confidence tracks how much of the relevant windows is populated.
    fn confidence(&self, activity: UserActivity) -> u8 {
        match activity {
            UserActivity::Unknown => 0,
            UserActivity::InVehicle | UserActivity::OnBicycle | UserActivity::Tilting => {
                self.accel.fill_percent().min(self.gyro.fill_percent())
            }
            UserActivity::Running | UserActivity::Walking | UserActivity::Still => {
                self.accel.fill_percent()
            }
        }
    }

    /// Recompute the full snapshot. Never fails; missing data yields UNKNOWN.
    pub fn classify(&self, now: DateTime<Utc>) -> VulnerabilityState {
        let user_activity = classify_activity(&self.features());
        let phone_usage = classify_phone_usage(
            self.proximity_near,
            self.screen_on,
            self.interacting,
            self.face_down,
        );
        let level = vulnerability_level(user_activity, phone_usage);

        VulnerabilityState {
            user_activity,
            phone_usage,
            vulnerability_level: level,
            confidence: self.confidence(user_activity),
            recommendation_text: level.recommendation().to_string(),
            last_updated: now,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenSegment {
    activity_type: ActivityType,
    start_time: DateTime<Utc>,
    confidence: u8,
}

/// Turns the stream of classifications into closed activity segments.
///
/// A segment opens when a tracked activity is classified with at least
/// [`MIN_TRANSITION_CONFIDENCE`], and closes on the next change of activity.
#[derive(Debug, Clone)]
pub struct TransitionTracker {
    user_id: String,
    open: Option<OpenSegment>,
}

impl TransitionTracker {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            open: None,
        }
    }

    /// Feed one classification. Returns the segment closed by this transition, if any.
    pub fn observe(
        &mut self,
        activity: UserActivity,
        confidence: u8,
        now: DateTime<Utc>,
    ) -> Option<ActivityEvent> {
        let tracked = activity.tracked_type();

        if let Some(open) = self.open.as_mut() {
            if tracked == Some(open.activity_type) {
                open.confidence = open.confidence.max(confidence);
                return None;
            }
        }

        let closed = self.open.take().map(|seg| ActivityEvent {
            user_id: self.user_id.clone(),
            activity_type: seg.activity_type,
            start_time: seg.start_time,
            end_time: now,
            confidence: seg.confidence,
        });

        if let Some(activity_type) = tracked {
            if confidence >= MIN_TRANSITION_CONFIDENCE {
                self.open = Some(OpenSegment {
                    activity_type,
                    start_time: now,
                    confidence,
                });
            }
        }

        closed
    }

    pub fn open_activity(&self) -> Option<ActivityType> {
        self.open.as_ref().map(|s| s.activity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    /// Feed accelerometer magnitudes along the x axis.
    fn feed_accel(classifier: &mut ActivityClassifier, magnitudes: &[f64]) {
        for &m in magnitudes {
            classifier.ingest(SensorSample::Accelerometer { x: m, y: 0.0, z: 0.0 });
        }
    }

    fn feed_gyro(classifier: &mut ActivityClassifier, magnitude: f64, count: usize) {
        for _ in 0..count {
            classifier.ingest(SensorSample::Gyroscope {
                x: 0.0,
                y: 0.0,
                z: magnitude,
            });
        }
    }

    /// Ten samples alternating around `mean` with the given population variance.
    fn alternating(mean: f64, variance: f64) -> Vec<f64> {
        let d = variance.sqrt();
        (0..WINDOW_SIZE)
            .map(|i| if i % 2 == 0 { mean + d } else { mean - d })
            .collect()
    }

    fn features(avg_accel: f64, accel_variance: f64, avg_gyro: f64) -> MotionFeatures {
        MotionFeatures {
            avg_accel,
            accel_variance,
            avg_gyro,
            accel_samples: WINDOW_SIZE,
            gyro_samples: WINDOW_SIZE,
        }
    }

    #[test]
    fn test_running_from_samples() {
        let mut classifier = ActivityClassifier::new();
        feed_accel(&mut classifier, &alternating(20.0, 20.0));

        let f = classifier.features();
        assert!((f.avg_accel - 20.0).abs() < 1e-9);
        assert!((f.accel_variance - 20.0).abs() < 1e-9);

        let state = classifier.classify(Utc::now());
        assert_eq!(state.user_activity, UserActivity::Running);
        assert_eq!(state.confidence, 100);
    }

    #[test]
    fn test_empty_window_is_unknown() {
        let classifier = ActivityClassifier::new();
        let state = classifier.classify(Utc::now());
        assert_eq!(state.user_activity, UserActivity::Unknown);
        assert_eq!(state.vulnerability_level, VulnerabilityLevel::Unknown);
        assert_eq!(state.confidence, 0);
    }

    #[test]
    fn test_insufficient_samples_is_unknown() {
        let mut classifier = ActivityClassifier::new();
        feed_accel(&mut classifier, &[9.8; MIN_ACCEL_SAMPLES - 1]);
        assert_eq!(
            classifier.classify(Utc::now()).user_activity,
            UserActivity::Unknown
        );

        feed_accel(&mut classifier, &[9.8]);
        assert_eq!(
            classifier.classify(Utc::now()).user_activity,
            UserActivity::Still
        );
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut classifier = ActivityClassifier::new();
        feed_accel(&mut classifier, &alternating(20.0, 20.0));
        feed_accel(&mut classifier, &[9.8; WINDOW_SIZE]);

        let f = classifier.features();
        assert_eq!(f.accel_samples, WINDOW_SIZE);
        assert!((f.avg_accel - 9.8).abs() < 1e-9);
        assert!(f.accel_variance < 1e-9);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // Satisfies both the running and walking rules.
        assert_eq!(
            classify_activity(&features(16.0, 16.0, 0.0)),
            UserActivity::Running
        );
        // Variance > 10 with a high gyro still lands on walking before vehicle.
        assert_eq!(
            classify_activity(&features(13.0, 11.0, 2.0)),
            UserActivity::Walking
        );
        assert_eq!(
            classify_activity(&features(9.8, 6.0, 1.6)),
            UserActivity::InVehicle
        );
        assert_eq!(
            classify_activity(&features(9.8, 4.0, 1.0)),
            UserActivity::OnBicycle
        );
        assert_eq!(
            classify_activity(&features(9.8, 1.0, 0.6)),
            UserActivity::Tilting
        );
        assert_eq!(
            classify_activity(&features(9.8, 1.0, 0.1)),
            UserActivity::Still
        );
        // Moderate variance without rotation matches nothing.
        assert_eq!(
            classify_activity(&features(9.8, 2.5, 0.1)),
            UserActivity::Unknown
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(
            classify_activity(&features(15.0, 15.0, 0.0)),
            UserActivity::Walking
        );
        assert_eq!(
            classify_activity(&features(9.8, 2.0, 0.5)),
            UserActivity::Unknown
        );
    }

    #[test]
    fn test_phone_usage_rules() {
        assert_eq!(
            classify_phone_usage(true, Some(false), false, false),
            PhoneUsage::Pocket
        );
        assert_eq!(
            classify_phone_usage(true, Some(true), false, false),
            PhoneUsage::ActivelyUsing
        );
        assert_eq!(
            classify_phone_usage(false, Some(true), true, false),
            PhoneUsage::ActivelyUsing
        );
        assert_eq!(
            classify_phone_usage(false, Some(true), false, false),
            PhoneUsage::ScreenOnIdle
        );
        assert_eq!(
            classify_phone_usage(false, Some(false), false, true),
            PhoneUsage::FaceDown
        );
        assert_eq!(
            classify_phone_usage(false, Some(false), false, false),
            PhoneUsage::ScreenOff
        );
        assert_eq!(
            classify_phone_usage(true, None, true, false),
            PhoneUsage::Unknown
        );
    }

    #[test]
    fn test_vulnerability_table() {
        use PhoneUsage as P;
        use UserActivity as A;
        use VulnerabilityLevel as V;

        for usage in [P::ActivelyUsing, P::ScreenOff, P::Unknown] {
            assert_eq!(vulnerability_level(A::OnBicycle, usage), V::Critical);
        }
        assert_eq!(vulnerability_level(A::InVehicle, P::ActivelyUsing), V::Critical);
        assert_eq!(vulnerability_level(A::InVehicle, P::Pocket), V::Unknown);
        for usage in [P::ActivelyUsing, P::ScreenOnIdle, P::Pocket] {
            assert_eq!(vulnerability_level(A::Walking, usage), V::High);
        }
        assert_eq!(vulnerability_level(A::Walking, P::ScreenOff), V::Unknown);
        assert_eq!(vulnerability_level(A::Still, P::ActivelyUsing), V::Moderate);
        assert_eq!(vulnerability_level(A::Still, P::ScreenOff), V::Safe);
        assert_eq!(vulnerability_level(A::Still, P::FaceDown), V::Safe);
        assert_eq!(vulnerability_level(A::Running, P::ActivelyUsing), V::Unknown);
    }

    #[test]
    fn test_cycling_with_screen_on_is_critical() {
        let mut classifier = ActivityClassifier::new();
        feed_accel(&mut classifier, &alternating(9.8, 4.0));
        feed_gyro(&mut classifier, 1.0, WINDOW_SIZE);
        classifier.ingest(SensorSample::Screen { on: true });

        let state = classifier.classify(Utc::now());
        assert_eq!(state.user_activity, UserActivity::OnBicycle);
        assert_eq!(state.phone_usage, PhoneUsage::ScreenOnIdle);
        assert_eq!(state.vulnerability_level, VulnerabilityLevel::Critical);
    }

    #[test]
    fn test_gyro_rule_confidence_uses_smaller_window() {
        let mut classifier = ActivityClassifier::new();
        feed_accel(&mut classifier, &alternating(9.8, 4.0));
        feed_gyro(&mut classifier, 1.0, 6);

        let state = classifier.classify(Utc::now());
        assert_eq!(state.user_activity, UserActivity::OnBicycle);
        assert_eq!(state.confidence, 60);
    }

    #[test]
    fn test_screen_off_clears_interaction() {
        let mut classifier = ActivityClassifier::new();
        classifier.ingest(SensorSample::Screen { on: true });
        classifier.ingest(SensorSample::Interaction { active: true });
        classifier.ingest(SensorSample::Screen { on: false });
        classifier.ingest(SensorSample::Screen { on: true });

        let state = classifier.classify(Utc::now());
        assert_eq!(state.phone_usage, PhoneUsage::ScreenOnIdle);
    }

    #[test]
    fn test_sample_wire_format() {
        let json = r#"{"type":"accelerometer","x":1.0,"y":2.0,"z":3.0}"#;
        let sample: SensorSample = serde_json::from_str(json).unwrap();
        assert_eq!(
            sample,
            SensorSample::Accelerometer {
                x: 1.0,
                y: 2.0,
                z: 3.0
            }
        );
    }

    #[test]
    fn test_tracker_emits_segment_on_change() {
        let t0 = Utc::now();
        let t1 = t0 + ChronoDuration::seconds(30);
        let t2 = t0 + ChronoDuration::seconds(60);
        let mut tracker = TransitionTracker::new("u1");

        assert!(tracker.observe(UserActivity::Walking, 80, t0).is_none());
        assert!(tracker.observe(UserActivity::Walking, 90, t1).is_none());
        let event = tracker
            .observe(UserActivity::Still, 100, t2)
            .expect("segment should close");

        assert_eq!(event.activity_type, ActivityType::Walking);
        assert_eq!(event.start_time, t0);
        assert_eq!(event.end_time, t2);
        assert_eq!(event.confidence, 90);
        assert!(tracker.open_activity().is_none());
    }

    #[test]
    fn test_tracker_ignores_low_confidence_transitions() {
        let t0 = Utc::now();
        let mut tracker = TransitionTracker::new("u1");

        assert!(tracker.observe(UserActivity::Running, 74, t0).is_none());
        assert!(tracker.open_activity().is_none());
        assert!(tracker.observe(UserActivity::Still, 100, t0).is_none());
    }

    #[test]
    fn test_tracker_switches_between_tracked_activities() {
        let t0 = Utc::now();
        let t1 = t0 + ChronoDuration::seconds(30);
        let mut tracker = TransitionTracker::new("u1");

        tracker.observe(UserActivity::OnBicycle, 100, t0);
        let event = tracker.observe(UserActivity::InVehicle, 100, t1).unwrap();

        assert_eq!(event.activity_type, ActivityType::Cycling);
        assert_eq!(tracker.open_activity(), Some(ActivityType::InVehicle));
    }
}
