// src/detection/head_tilt.rs
//
// Head thrown back for a sustained period (possible unconsciousness).
//
// Tilt is measured as how far the nose sits above the shoulder line,
// relative to body height. When both eyes are visible they must sit
// above the nose too; that rules out a forward-looking head whose nose
// was placed high by the pose model. Missing eyes never block detection.

use super::metrics::PersonMetrics;
use super::timing::{AccumulationTimer, Debounce};
use crate::types::{DetectionEvent, EventType, HeadTiltConfig, PoseFrame};
use tracing::{debug, info};

const MIN_CONFIDENCE: f32 = 0.70;
const MAX_CONFIDENCE: f32 = 0.95;
/// Tilt (as a fraction of height) that saturates the tilt sub-score
const FULL_TILT_RATIO: f32 = 0.4;
/// Duration that saturates the duration sub-score
const FULL_DURATION_SECS: f64 = 10.0;

pub struct HeadTiltBackDetector {
    config: HeadTiltConfig,
    timer: AccumulationTimer,
    debounce: Debounce,
}

impl HeadTiltBackDetector {
    pub fn new(config: HeadTiltConfig) -> Self {
        let debounce = Debounce::new(config.debounce_secs);
        Self {
            config,
            timer: AccumulationTimer::new(),
            debounce,
        }
    }

    pub fn update(&mut self, frame: &PoseFrame, metrics: &PersonMetrics) -> Option<DetectionEvent> {
        let now = frame.timestamp;

        let tilt = match self.tilt_amount(metrics) {
            Some(tilt) => tilt,
            None => {
                if self.timer.is_running() {
                    debug!("HeadTilt: t={:.2} head no longer tilted back, timer reset", now);
                }
                self.timer.reset();
                return None;
            }
        };

        let elapsed = self.timer.hold(now);
        if elapsed < self.config.min_duration_secs || !self.debounce.is_ready(now) {
            return None;
        }

        self.debounce.mark(now);
        self.timer.reset();

        let confidence = confidence(tilt, metrics.height, elapsed);

        info!(
            "🚨 HEAD_TILT_BACK at t={:.2}s | tilt={:.0}px (height {:.0}) for {:.1}s | conf={:.2}",
            now, tilt, metrics.height, elapsed, confidence
        );

        Some(DetectionEvent::new(
            EventType::HeadTiltBack,
            frame,
            confidence,
            format!(
                "Head tilted back for {}s - possible unconsciousness",
                elapsed.round() as u64
            ),
        ))
    }

    /// Nose-above-shoulders distance when it exceeds the threshold and
    /// the eyes (if visible) agree; None otherwise.
    fn tilt_amount(&self, metrics: &PersonMetrics) -> Option<f32> {
        if !metrics.has_height() {
            return None;
        }
        let nose = metrics.nose?;
        let shoulder_center = metrics.shoulder_center?;

        let tilt = shoulder_center.y - nose.y;
        if tilt <= metrics.height * self.config.tilt_ratio {
            return None;
        }

        if let Some(eyes) = metrics.eye_center {
            if eyes.y >= nose.y {
                return None;
            }
        }

        Some(tilt)
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.debounce.reset();
    }
}

fn confidence(tilt: f32, height: f32, elapsed_secs: f64) -> f32 {
    let tilt_score = (tilt / (height * FULL_TILT_RATIO)).min(1.0);
    let duration_score = (elapsed_secs / FULL_DURATION_SECS).min(1.0) as f32;
    (MIN_CONFIDENCE + 0.15 * tilt_score + 0.15 * duration_score).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
