// src/detection/manager.rs
//
// Runs the four safety detectors against one pose stream.
//
// Single entry point: call process_frame() once per incoming frame.
// PersonMetrics is computed once per frame and shared by every detector.
// One manager per stream; call reset() whenever the stream restarts
// (stop/start, camera switch, new video) so stale timers and debounce
// windows never leak into the next session.

use super::fall::FallDetector;
use super::ground::GroundDetector;
use super::hands_raised::HandsRaisedDetector;
use super::head_tilt::HeadTiltBackDetector;
use super::metrics::PersonMetrics;
use crate::types::{DetectionConfig, DetectionEvent, PoseFrame};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// At most one event per type, ordered FALL, GROUND, HANDS_RAISED, HEAD_TILT_BACK
    pub events: Vec<DetectionEvent>,
    /// Frame was refused (non-finite or non-increasing timestamp); no state moved
    pub rejected: bool,
    pub metrics: Option<PersonMetrics>,
}

impl FrameOutput {
    fn rejected() -> Self {
        Self {
            events: Vec::new(),
            rejected: true,
            metrics: None,
        }
    }
}

pub struct DetectionManager {
    config: DetectionConfig,
    fall: FallDetector,
    ground: GroundDetector,
    hands_raised: HandsRaisedDetector,
    head_tilt: HeadTiltBackDetector,
    last_timestamp: Option<f64>,
    frame_count: u64,
}

impl DetectionManager {
    /// Manager with default thresholds. The default config carries no
    /// fallback frame size, so GROUND only fires for frames that report
    /// their own `frame_size`; use `with_config` to supply one otherwise.
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            fall: FallDetector::new(config.fall.clone()),
            ground: GroundDetector::new(config.ground.clone()),
            hands_raised: HandsRaisedDetector::new(
                config.hands_raised.clone(),
                config.min_keypoint_score,
            ),
            head_tilt: HeadTiltBackDetector::new(config.head_tilt.clone()),
            last_timestamp: None,
            frame_count: 0,
            config,
        }
    }

    /// Process one frame through every enabled detector.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> FrameOutput {
        let now = frame.timestamp;

        if !now.is_finite() {
            warn!("Rejecting frame with non-finite timestamp {}", now);
            return FrameOutput::rejected();
        }
        if let Some(last) = self.last_timestamp {
            if now <= last {
                warn!(
                    "Rejecting out-of-order frame: t={:.3}s is not after t={:.3}s",
                    now, last
                );
                return FrameOutput::rejected();
            }
        }
        self.last_timestamp = Some(now);
        self.frame_count += 1;

        let metrics = PersonMetrics::compute(frame, self.config.min_keypoint_score);
        let frame_size = frame.frame_size.or(self.config.frame_size);

        let mut events = Vec::with_capacity(4);

        if self.config.fall.enabled {
            events.extend(self.fall.update(frame, &metrics));
        }
        if self.config.ground.enabled {
            events.extend(self.ground.update(frame, &metrics, frame_size));
        }
        if self.config.hands_raised.enabled {
            events.extend(self.hands_raised.update(frame));
        }
        if self.config.head_tilt.enabled {
            events.extend(self.head_tilt.update(frame, &metrics));
        }

        if self.frame_count % 100 == 0 {
            debug!(
                "F{} t={:.1}s: height={:.0} angle={:?} com={:?}",
                self.frame_count, now, metrics.height, metrics.body_angle, metrics.center_of_mass
            );
        }

        FrameOutput {
            events,
            rejected: false,
            metrics: Some(metrics),
        }
    }

    /// Convenience wrapper returning only the event batch.
    pub fn detect(&mut self, frame: &PoseFrame) -> Vec<DetectionEvent> {
        self.process_frame(frame).events
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Session boundary: clears every detector's timers, histories and
    /// debounce windows, and forgets the last timestamp so the next
    /// stream may start again from zero.
    pub fn reset(&mut self) {
        self.fall.reset();
        self.ground.reset();
        self.hands_raised.reset();
        self.head_tilt.reset();
        self.last_timestamp = None;
        self.frame_count = 0;
    }
}

impl Default for DetectionManager {
    fn default() -> Self {
        Self::new()
    }
}
