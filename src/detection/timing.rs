// src/detection/timing.rs
//
// Timer state shared by the detectors. All times are frame timestamps
// in seconds; nothing here reads a wall clock.

/// Minimum spacing between two alerts of the same type.
#[derive(Debug, Clone)]
pub struct Debounce {
    window_secs: f64,
    last_alert: Option<f64>,
}

impl Debounce {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs,
            last_alert: None,
        }
    }

    /// A session that has never alerted is always ready.
    pub fn is_ready(&self, now: f64) -> bool {
        match self.last_alert {
            Some(last) => now - last >= self.window_secs,
            None => true,
        }
    }

    pub fn mark(&mut self, now: f64) {
        self.last_alert = Some(now);
    }

    pub fn last_alert(&self) -> Option<f64> {
        self.last_alert
    }

    pub fn reset(&mut self) {
        self.last_alert = None;
    }
}

/// Tracks how long a condition has held without interruption.
/// Reset means back to zero, never paused.
#[derive(Debug, Clone, Default)]
pub struct AccumulationTimer {
    started_at: Option<f64>,
}

impl AccumulationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the condition holds at `now`; returns the elapsed seconds.
    pub fn hold(&mut self, now: f64) -> f64 {
        let start = *self.started_at.get_or_insert(now);
        now - start
    }

    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.started_at.map(|start| now - start)
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn reset(&mut self) {
        self.started_at = None;
    }
}
