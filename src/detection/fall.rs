// src/detection/fall.rs
//
// Sudden downward motion of the torso combined with a tilted/horizontal
// body. Velocity alone is not enough: a fast crouch moves the center of
// mass just as quickly but keeps the torso upright.
//
// Frames without a center of mass or a measurable height are skipped
// outright and never enter the history, so one garbage frame cannot fake
// a velocity spike on the next usable one.

use super::metrics::PersonMetrics;
use super::timing::Debounce;
use crate::types::{DetectionEvent, EventType, FallConfig, PoseFrame};
use std::collections::VecDeque;
use tracing::{debug, info};

const MIN_CONFIDENCE: f32 = 0.5;
const MAX_CONFIDENCE: f32 = 0.95;

pub struct FallDetector {
    config: FallConfig,
    /// Center-of-mass Y per usable frame, oldest first
    history: VecDeque<f32>,
    debounce: Debounce,
}

impl FallDetector {
    pub fn new(config: FallConfig) -> Self {
        let history_len = config.history_len.max(2);
        let debounce = Debounce::new(config.debounce_secs);
        Self {
            config,
            history: VecDeque::with_capacity(history_len),
            debounce,
        }
    }

    pub fn update(&mut self, frame: &PoseFrame, metrics: &PersonMetrics) -> Option<DetectionEvent> {
        let now = frame.timestamp;

        let com = match metrics.center_of_mass {
            Some(com) if metrics.has_height() => com,
            _ => {
                debug!("Fall: t={:.2} skipped, no center of mass or height", now);
                return None;
            }
        };

        self.history.push_back(com.y);
        while self.history.len() > self.config.history_len.max(2) {
            self.history.pop_front();
        }

        let velocity = self.latest_velocity()?;
        let threshold = metrics.height * self.config.velocity_ratio;
        if velocity <= threshold {
            return None;
        }

        // Undefined orientation is insufficient evidence, not a pass.
        let angle = metrics.body_angle?;
        if angle <= self.config.min_body_angle_deg {
            debug!(
                "Fall: t={:.2} fast drop {:.1}px (> {:.1}) but body angle {:.0}° still upright",
                now, velocity, threshold, angle
            );
            return None;
        }

        if !self.debounce.is_ready(now) {
            debug!(
                "Fall: t={:.2} candidate suppressed (last alert at {:.2}s)",
                now,
                self.debounce.last_alert().unwrap_or_default()
            );
            return None;
        }
        self.debounce.mark(now);

        let confidence = self.confidence(metrics, velocity, angle);
        let drop_pct = (velocity / metrics.height * 100.0).round();

        info!(
            "🚨 FALL at t={:.2}s | drop={:.1}px ({}% height) | angle={:.0}° | conf={:.2}",
            now, velocity, drop_pct, angle, confidence
        );

        Some(DetectionEvent::new(
            EventType::Fall,
            frame,
            confidence,
            format!("Person fall detected - {}% of body height drop", drop_pct),
        ))
    }

    /// Positive means the torso moved down the image between the two
    /// most recent usable frames.
    fn latest_velocity(&self) -> Option<f32> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }
        Some(self.history[n - 1] - self.history[n - 2])
    }

    fn confidence(&self, metrics: &PersonMetrics, velocity: f32, angle: f32) -> f32 {
        let keypoint_score = metrics.torso_confidence.clamp(0.0, 1.0);

        // Twice the trigger threshold saturates the velocity score.
        let full_scale = metrics.height * self.config.velocity_ratio * 2.0;
        let velocity_score = (velocity / full_scale).clamp(0.0, 1.0);

        let angle_span = (90.0 - self.config.min_body_angle_deg).max(f32::EPSILON);
        let angle_score = ((angle - self.config.min_body_angle_deg) / angle_span).clamp(0.0, 1.0);

        (0.4 * keypoint_score + 0.3 * velocity_score + 0.3 * angle_score)
            .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.debounce.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::test_support::{posed_frame, HEIGHT};

    fn run(detector: &mut FallDetector, frame: &PoseFrame) -> Option<DetectionEvent> {
        let metrics = PersonMetrics::compute(frame, 0.3);
        detector.update(frame, &metrics)
    }

    #[test]
    fn test_fast_drop_with_horizontal_body_fires() {
        let mut detector = FallDetector::new(FallConfig::default());
        assert!(run(&mut detector, &posed_frame(0.0, 100.0, 0.0)).is_none());
        let event = run(&mut detector, &posed_frame(0.1, 100.0 + HEIGHT * 0.2, 75.0))
            .expect("fall should fire");

        assert_eq!(event.event_type, EventType::Fall);
        assert_eq!(event.timestamp, 0.1);
        assert!((0.5..=0.95).contains(&event.confidence), "conf {}", event.confidence);
        assert!(event.description.contains("20%"), "{}", event.description);
    }

    #[test]
    fn test_fast_crouch_stays_silent() {
        let mut detector = FallDetector::new(FallConfig::default());
        run(&mut detector, &posed_frame(0.0, 100.0, 0.0));
        // Same drop, torso still near vertical
        assert!(run(&mut detector, &posed_frame(0.1, 100.0 + HEIGHT * 0.3, 20.0)).is_none());
    }

    #[test]
    fn test_slow_descent_stays_silent() {
        let mut detector = FallDetector::new(FallConfig::default());
        let mut y = 100.0;
        for i in 0..10 {
            assert!(run(&mut detector, &posed_frame(i as f64 * 0.1, y, 80.0)).is_none());
            y += HEIGHT * 0.05;
        }
    }

    #[test]
    fn test_unusable_frame_not_pushed() {
        let mut detector = FallDetector::new(FallConfig::default());
        run(&mut detector, &posed_frame(0.0, 100.0, 0.0));
        assert_eq!(detector.history_len(), 1);

        let empty = PoseFrame::new(0.1, Vec::new());
        assert!(run(&mut detector, &empty).is_none());
        assert_eq!(detector.history_len(), 1);
    }

    #[test]
    fn test_history_capped() {
        let mut detector = FallDetector::new(FallConfig::default());
        for i in 0..12 {
            run(&mut detector, &posed_frame(i as f64 * 0.1, 100.0, 0.0));
        }
        assert_eq!(detector.history_len(), 5);
    }

    #[test]
    fn test_confidence_clamped_to_ceiling() {
        let mut detector = FallDetector::new(FallConfig::default());
        run(&mut detector, &posed_frame(0.0, 50.0, 0.0));
        let event = run(&mut detector, &posed_frame(0.1, 50.0 + HEIGHT, 90.0)).unwrap();
        assert!(event.confidence <= 0.95);
        assert!(event.confidence >= 0.5);
    }

    #[test]
    fn test_reset_clears_history_and_debounce() {
        let mut detector = FallDetector::new(FallConfig::default());
        run(&mut detector, &posed_frame(0.0, 100.0, 0.0));
        assert!(run(&mut detector, &posed_frame(0.1, 150.0, 80.0)).is_some());

        detector.reset();
        assert_eq!(detector.history_len(), 0);

        run(&mut detector, &posed_frame(0.2, 100.0, 0.0));
        assert!(
            run(&mut detector, &posed_frame(0.3, 150.0, 80.0)).is_some(),
            "a reset detector must not carry the previous debounce window"
        );
    }
}
