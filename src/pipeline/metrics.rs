// src/pipeline/metrics.rs
//
// Per-session counters. Handles are cheap to clone so a monitor on
// another thread can read progress while the session runs.

use crate::types::{EventCounts, EventType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub frames_processed: Arc<AtomicU64>,
    pub frames_rejected: Arc<AtomicU64>,
    /// Accepted frames with no measurable body (no height and no torso)
    pub frames_without_person: Arc<AtomicU64>,
    pub falls: Arc<AtomicU64>,
    pub ground: Arc<AtomicU64>,
    pub hands_raised: Arc<AtomicU64>,
    pub head_tilt_back: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            frames_processed: Arc::new(AtomicU64::new(0)),
            frames_rejected: Arc::new(AtomicU64::new(0)),
            frames_without_person: Arc::new(AtomicU64::new(0)),
            falls: Arc::new(AtomicU64::new(0)),
            ground: Arc::new(AtomicU64::new(0)),
            hands_raised: Arc::new(AtomicU64::new(0)),
            head_tilt_back: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self, event_type: EventType) {
        self.inc(self.counter_for(event_type));
    }

    fn counter_for(&self, event_type: EventType) -> &AtomicU64 {
        match event_type {
            EventType::Fall => &self.falls,
            EventType::Ground => &self.ground,
            EventType::HandsRaised => &self.hands_raised,
            EventType::HeadTiltBack => &self.head_tilt_back,
        }
    }

    pub fn events_by_type(&self) -> EventCounts {
        EventType::ALL
            .iter()
            .map(|&t| (t, self.counter_for(t).load(Ordering::Relaxed)))
            .collect()
    }

    /// Frames per second of wall-clock processing time.
    pub fn fps(&self) -> f64 {
        let frames = self.frames_processed.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            frames_without_person: self.frames_without_person.load(Ordering::Relaxed),
            events_by_type: self.events_by_type(),
            fps: self.fps(),
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub frames_without_person: u64,
    pub events_by_type: EventCounts,
    pub fps: f64,
}
