// src/pipeline/session.rs
//
// One monitored stream, from start to stop. Owns the detector state for
// that stream, so two sessions never share timers or debounce windows.

use super::event_bus::EventBus;
use super::metrics::{MetricsSummary, SessionMetrics};
use crate::detection::{DetectionManager, FrameOutput};
use crate::types::{Config, DetectionEvent, EventCounts, PoseFrame};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

pub struct DetectionSession {
    id: Uuid,
    stream: String,
    started_at: DateTime<Utc>,
    manager: DetectionManager,
    bus: EventBus,
    metrics: SessionMetrics,
    events: Vec<DetectionEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub stream: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Stream time of the last accepted frame, in seconds
    pub duration_secs: f64,
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub events_by_type: EventCounts,
    pub events: Vec<DetectionEvent>,
}

impl SessionSummary {
    pub fn total_events(&self) -> usize {
        self.events.len()
    }
}

impl DetectionSession {
    pub fn new(stream: impl Into<String>, config: &Config) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            stream: stream.into(),
            started_at: Utc::now(),
            manager: DetectionManager::with_config(config.detection.clone()),
            bus: EventBus::new(config.pipeline.event_bus_capacity),
            metrics: SessionMetrics::new(),
            events: Vec::new(),
        };
        info!("▶️  Session {} started for '{}'", session.id, session.stream);
        session
    }

    pub fn process_frame(&mut self, frame: &PoseFrame) -> FrameOutput {
        let output = self.manager.process_frame(frame);

        if output.rejected {
            self.metrics.inc(&self.metrics.frames_rejected);
            return output;
        }
        self.metrics.inc(&self.metrics.frames_processed);

        let no_person = output
            .metrics
            .as_ref()
            .map_or(true, |m| !m.has_height() && m.center_of_mass.is_none());
        if no_person {
            self.metrics.inc(&self.metrics.frames_without_person);
        }

        for event in &output.events {
            self.metrics.record_event(event.event_type);
            self.events.push(event.clone());
            self.bus.publish(event.clone());
        }

        output
    }

    /// Queued events not yet handed to a sink. Each event is returned once.
    pub fn drain_events(&mut self) -> Vec<DetectionEvent> {
        self.bus.drain()
    }

    /// Start a new session on the same detectors: fresh id and start time,
    /// all detector state and counters cleared.
    pub fn restart(&mut self, stream: impl Into<String>) {
        let previous = self.id;
        self.id = Uuid::new_v4();
        self.stream = stream.into();
        self.started_at = Utc::now();
        self.manager.reset();
        self.bus.clear();
        self.metrics = SessionMetrics::new();
        self.events.clear();
        info!(
            "🔄 Session {} restarted as {} for '{}'",
            previous, self.id, self.stream
        );
    }

    pub fn summary(&self) -> SessionSummary {
        let counters = self.metrics.summary();
        SessionSummary {
            id: self.id,
            stream: self.stream.clone(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration_secs: self.manager.last_timestamp().unwrap_or(0.0),
            frames_processed: counters.frames_processed,
            frames_rejected: counters.frames_rejected,
            events_by_type: counters.events_by_type,
            events: self.events.clone(),
        }
    }

    pub fn finish(self) -> SessionSummary {
        let summary = self.summary();
        let counters = self.metrics.summary();
        info!(
            "⏹️  Session {} finished: {} frames ({} rejected, {} without person), {} events, {:.0} fps",
            summary.id,
            summary.frames_processed,
            summary.frames_rejected,
            counters.frames_without_person,
            summary.total_events(),
            counters.fps
        );
        summary
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn counters(&self) -> MetricsSummary {
        self.metrics.summary()
    }
}
