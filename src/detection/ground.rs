// src/detection/ground.rs
//
// Sustained horizontal posture low in the frame: a person who collapsed
// and has not got back up. The person must stay continuously measurable;
// a single occluded frame or a brief stand-up restarts the count from zero.

use super::metrics::PersonMetrics;
use super::timing::{AccumulationTimer, Debounce};
use crate::types::{DetectionEvent, EventType, FrameSize, GroundConfig, PoseFrame};
use tracing::{debug, info};

pub struct GroundDetector {
    config: GroundConfig,
    timer: AccumulationTimer,
    debounce: Debounce,
}

impl GroundDetector {
    pub fn new(config: GroundConfig) -> Self {
        let debounce = Debounce::new(config.debounce_secs);
        Self {
            config,
            timer: AccumulationTimer::new(),
            debounce,
        }
    }

    /// `frame_size` is the resolved image size for this frame (the frame's
    /// own, or the configured fallback). Without it "low in frame" cannot
    /// be judged and the frame counts as insufficient evidence.
    pub fn update(
        &mut self,
        frame: &PoseFrame,
        metrics: &PersonMetrics,
        frame_size: Option<FrameSize>,
    ) -> Option<DetectionEvent> {
        let now = frame.timestamp;

        let (angle, hip_center, size) = match (metrics.body_angle, metrics.hip_center, frame_size) {
            (Some(angle), Some(hip), Some(size)) if size.height > 0.0 => (angle, hip, size),
            _ => {
                self.interrupt(now);
                return None;
            }
        };

        let horizontal = angle > self.config.min_body_angle_deg;
        let low = hip_center.y >= size.height * self.config.low_frame_fraction;

        if !(horizontal && low) {
            self.interrupt(now);
            return None;
        }

        if !self.timer.is_running() {
            debug!(
                "Ground: t={:.2} horizontal ({:.0}°) and low (hip y={:.0}/{:.0}), timer started",
                now, angle, hip_center.y, size.height
            );
        }
        let elapsed = self.timer.hold(now);
        if elapsed < self.config.min_duration_secs || !self.debounce.is_ready(now) {
            return None;
        }

        self.debounce.mark(now);
        self.timer.reset();

        info!(
            "🚨 GROUND at t={:.2}s | down for {:.1}s | angle={:.0}°",
            now, elapsed, angle
        );

        Some(DetectionEvent::new(
            EventType::Ground,
            frame,
            self.config.confidence,
            format!(
                "Person on ground for {}s - possible medical emergency",
                elapsed.round() as u64
            ),
        ))
    }

    fn interrupt(&mut self, now: f64) {
        if self.timer.is_running() {
            debug!("Ground: t={:.2} condition broken, timer reset", now);
        }
        self.timer.reset();
    }

    pub fn is_accumulating(&self) -> bool {
        self.timer.is_running()
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.debounce.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::test_support::{posed_frame, ticks, FRAME_H, FRAME_W};

    fn size() -> Option<FrameSize> {
        Some(FrameSize {
            width: FRAME_W,
            height: FRAME_H,
        })
    }

    fn run(detector: &mut GroundDetector, frame: &PoseFrame) -> Option<DetectionEvent> {
        let metrics = PersonMetrics::compute(frame, 0.3);
        detector.update(frame, &metrics, size())
    }

    #[test]
    fn test_fires_after_five_seconds_down() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        let mut events = Vec::new();
        for t in ticks(0.0, 60) {
            events.extend(run(&mut detector, &posed_frame(t, 400.0, 80.0)));
        }

        assert_eq!(events.len(), 1);
        assert!(events[0].timestamp >= 5.0 - 1e-9);
        assert_eq!(events[0].confidence, 0.85);
        assert!(events[0].description.contains("medical emergency"));
    }

    #[test]
    fn test_high_in_frame_does_not_count() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        for t in ticks(0.0, 80) {
            assert!(run(&mut detector, &posed_frame(t, 150.0, 85.0)).is_none());
        }
        assert!(!detector.is_accumulating());
    }

    #[test]
    fn test_brief_stand_up_restarts_count() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        for t in ticks(0.0, 40) {
            assert!(run(&mut detector, &posed_frame(t, 400.0, 80.0)).is_none());
        }
        // One upright frame cancels 4s of progress
        assert!(run(&mut detector, &posed_frame(4.0, 400.0, 10.0)).is_none());
        assert!(!detector.is_accumulating());

        let mut events = Vec::new();
        for t in ticks(4.1, 45) {
            events.extend(run(&mut detector, &posed_frame(t, 400.0, 80.0)));
        }
        assert!(events.is_empty(), "only 4.4s accumulated since the interruption");
    }

    #[test]
    fn test_occluded_frame_restarts_count() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        for t in ticks(0.0, 30) {
            run(&mut detector, &posed_frame(t, 400.0, 80.0));
        }
        assert!(detector.is_accumulating());
        assert!(run(&mut detector, &PoseFrame::new(3.0, Vec::new())).is_none());
        assert!(!detector.is_accumulating());
    }

    #[test]
    fn test_unknown_frame_size_is_insufficient_evidence() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        for t in ticks(0.0, 80) {
            let frame = posed_frame(t, 400.0, 80.0);
            let metrics = PersonMetrics::compute(&frame, 0.3);
            assert!(detector.update(&frame, &metrics, None).is_none());
        }
    }

    #[test]
    fn test_debounce_spacing_while_still_down() {
        let mut detector = GroundDetector::new(GroundConfig::default());
        let mut events = Vec::new();
        // 25 seconds lying still
        for t in ticks(0.0, 250) {
            events.extend(run(&mut detector, &posed_frame(t, 400.0, 80.0)));
        }

        assert_eq!(events.len(), 2, "got {:?}", events.iter().map(|e| e.timestamp).collect::<Vec<_>>());
        assert!(events[1].timestamp - events[0].timestamp >= 10.0 - 1e-9);
    }
}
