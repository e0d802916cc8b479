// src/detection/hands_raised.rs
//
// Both hands held up for a sustained period. Two postures count:
//   - wrists above the head (above the nose): read as a distress signal
//   - wrists only above the shoulders: read as a robbery / threat gesture
//
// NOTE: the shoulder offset is a fixed pixel count, unlike every other
// detector's height-relative threshold. A distant person (small in frame)
// needs proportionally higher hands to qualify. Kept as-is until there is
// data on how this should behave across camera distances.

use super::timing::{AccumulationTimer, Debounce};
use crate::types::{DetectionEvent, EventType, HandsRaisedConfig, Landmark, PoseFrame};
use tracing::{debug, info};

const ABOVE_HEAD_CONFIDENCE: f32 = 0.80;
const ABOVE_SHOULDERS_CONFIDENCE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaisedPosture {
    AboveHead,
    AboveShoulders,
}

impl RaisedPosture {
    pub fn confidence(&self) -> f32 {
        match self {
            Self::AboveHead => ABOVE_HEAD_CONFIDENCE,
            Self::AboveShoulders => ABOVE_SHOULDERS_CONFIDENCE,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AboveHead => "Hands raised above head - possible distress signal",
            Self::AboveShoulders => "Hands raised above shoulders - possible robbery or threat",
        }
    }
}

pub struct HandsRaisedDetector {
    config: HandsRaisedConfig,
    min_score: f32,
    timer: AccumulationTimer,
    debounce: Debounce,
}

impl HandsRaisedDetector {
    pub fn new(config: HandsRaisedConfig, min_score: f32) -> Self {
        let debounce = Debounce::new(config.debounce_secs);
        Self {
            config,
            min_score,
            timer: AccumulationTimer::new(),
            debounce,
        }
    }

    pub fn update(&mut self, frame: &PoseFrame) -> Option<DetectionEvent> {
        let now = frame.timestamp;

        let posture = match self.classify(frame) {
            Some(posture) => posture,
            None => {
                if self.timer.is_running() {
                    debug!("HandsRaised: t={:.2} hands down or not visible, timer reset", now);
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

        info!(
            "🚨 HANDS_RAISED at t={:.2}s | {:?} for {:.1}s",
            now, posture, elapsed
        );

        Some(DetectionEvent::new(
            EventType::HandsRaised,
            frame,
            posture.confidence(),
            posture.description().to_string(),
        ))
    }

    /// Posture on this frame, or None if hands are down or any required
    /// keypoint is missing. Above-head wins when both postures hold.
    pub fn classify(&self, frame: &PoseFrame) -> Option<RaisedPosture> {
        let get = |name| frame.usable(name, self.min_score);
        let left_wrist = get(Landmark::LeftWrist)?;
        let right_wrist = get(Landmark::RightWrist)?;
        let left_shoulder = get(Landmark::LeftShoulder)?;
        let right_shoulder = get(Landmark::RightShoulder)?;
        let nose = get(Landmark::Nose)?;

        let above_head = left_wrist.y < nose.y && right_wrist.y < nose.y;
        if above_head {
            return Some(RaisedPosture::AboveHead);
        }

        let offset = self.config.shoulder_offset_px;
        let above_shoulders =
            left_wrist.y <= left_shoulder.y - offset && right_wrist.y <= right_shoulder.y - offset;
        if above_shoulders {
            return Some(RaisedPosture::AboveShoulders);
        }

        None
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.debounce.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::test_support::{arms_frame, ticks};

    // arms_frame: shoulders at y=200, nose at y=160
    const ABOVE_HEAD_Y: f32 = 120.0;
    const ABOVE_SHOULDER_Y: f32 = 165.0;
    const HANDS_DOWN_Y: f32 = 300.0;

    fn detector() -> HandsRaisedDetector {
        HandsRaisedDetector::new(HandsRaisedConfig::default(), 0.3)
    }

    fn collect(detector: &mut HandsRaisedDetector, start: f64, count: usize, y: f32) -> Vec<DetectionEvent> {
        ticks(start, count)
            .filter_map(|t| detector.update(&arms_frame(t, y, y)))
            .collect()
    }

    #[test]
    fn test_classify_postures() {
        let d = detector();
        assert_eq!(d.classify(&arms_frame(0.0, ABOVE_HEAD_Y, ABOVE_HEAD_Y)), Some(RaisedPosture::AboveHead));
        assert_eq!(
            d.classify(&arms_frame(0.0, ABOVE_SHOULDER_Y, ABOVE_SHOULDER_Y)),
            Some(RaisedPosture::AboveShoulders)
        );
        // Only one hand up
        assert_eq!(d.classify(&arms_frame(0.0, ABOVE_HEAD_Y, HANDS_DOWN_Y)), None);
        // 25px above the shoulder is inside the 30px dead band
        assert_eq!(d.classify(&arms_frame(0.0, 175.0, 175.0)), None);
    }

    #[test]
    fn test_exactly_offset_above_shoulders_counts() {
        let d = detector();
        // Shoulders at y=200, wrists exactly 30px higher (still below the nose)
        assert_eq!(
            d.classify(&arms_frame(0.0, 170.0, 170.0)),
            Some(RaisedPosture::AboveShoulders)
        );
        // One wrist a pixel short of the offset
        assert_eq!(d.classify(&arms_frame(0.0, 170.0, 171.0)), None);
    }

    #[test]
    fn test_above_head_after_two_seconds() {
        let mut d = detector();
        let events = collect(&mut d, 0.0, 25, ABOVE_HEAD_Y);

        assert_eq!(events.len(), 1);
        assert!(events[0].timestamp >= 2.0 - 1e-9);
        assert_eq!(events[0].confidence, 0.80);
        assert!(events[0].description.contains("distress"));
    }

    #[test]
    fn test_above_shoulders_uses_threat_wording() {
        let mut d = detector();
        let events = collect(&mut d, 0.0, 25, ABOVE_SHOULDER_Y);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].confidence, 0.75);
        assert!(events[0].description.contains("robbery or threat"));
    }

    #[test]
    fn test_short_gesture_ignored() {
        let mut d = detector();
        assert!(collect(&mut d, 0.0, 15, ABOVE_HEAD_Y).is_empty());
        assert!(collect(&mut d, 1.5, 5, HANDS_DOWN_Y).is_empty());
        assert!(collect(&mut d, 2.0, 15, ABOVE_HEAD_Y).is_empty());
    }

    #[test]
    fn test_missing_wrist_resets_timer() {
        let mut d = detector();
        collect(&mut d, 0.0, 15, ABOVE_HEAD_Y);

        let mut frame = arms_frame(1.5, ABOVE_HEAD_Y, ABOVE_HEAD_Y);
        for k in frame.keypoints.iter_mut().filter(|k| k.name == Landmark::LeftWrist) {
            k.score = 0.2;
        }
        assert!(d.update(&frame).is_none());
        assert!(collect(&mut d, 1.6, 15, ABOVE_HEAD_Y).is_empty());
    }

    #[test]
    fn test_debounce_five_seconds() {
        let mut d = detector();
        // Hands held up for 6 seconds straight
        let events = collect(&mut d, 0.0, 60, ABOVE_HEAD_Y);
        assert_eq!(events.len(), 1);

        let later = collect(&mut d, 6.0, 30, ABOVE_HEAD_Y);
        assert_eq!(later.len(), 1);
        assert!(later[0].timestamp - events[0].timestamp >= 5.0);
    }
}
