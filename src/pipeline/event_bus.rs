// src/pipeline/event_bus.rs
//
// Decoupled hand-off between the detectors and whatever consumes alerts
// (UI, notification, VLM confirmation). The manager publishes; sinks
// drain. Each event is handed out exactly once.

use crate::types::DetectionEvent;
use std::collections::VecDeque;
use tracing::warn;

pub struct EventBus {
    events: VecDeque<DetectionEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: DetectionEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<DetectionEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}
