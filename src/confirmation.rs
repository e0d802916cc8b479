// src/confirmation.rs
//
// Payload for the optional vision-language confirmation step.
//
// A detection event is turned into a self-contained request: the event
// itself, a stream timestamp in MM:SS, and a text summary of the visible
// keypoints. The model's reply is parsed back into a verdict. Sending the
// request (and attaching the video frame) is the caller's job; this module
// never touches the network.

use crate::types::{DetectionEvent, EventType, Keypoint};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// REQUEST
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationRequest {
    pub event_type: EventType,
    pub confidence: f32,
    pub description: String,
    /// Stream time of the event as MM:SS
    pub timestamp: String,
    /// One `name: (x, y) [confidence: NN%]` line per usable keypoint
    pub keypoint_summary: String,
}

impl ConfirmationRequest {
    pub fn from_event(event: &DetectionEvent, min_score: f32) -> Self {
        Self {
            event_type: event.event_type,
            confidence: event.confidence,
            description: event.description.clone(),
            timestamp: format_timestamp(event.timestamp),
            keypoint_summary: summarize_keypoints(&event.source_keypoints, min_score),
        }
    }

    /// Request fields plus the rendered `prompt`, as written to disk.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut value =
            serde_json::to_value(self).context("Failed to serialize confirmation request")?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("prompt".to_string(), serde_json::Value::String(self.prompt()));
        }
        Ok(value)
    }

    /// Text prompt sent alongside the frame image.
    pub fn prompt(&self) -> String {
        format!(
            "You are a security expert analyzing surveillance footage. \
An on-device pose detector raised the following alert:

  {} ({:.0}% confidence): {}

Identify concerning situations in these categories:

1. Medical emergencies (unconsciousness, chest pain, seizures, difficulty breathing)
2. Falls and injuries (person falling, lying on ground, visible injuries)
3. Distress signals (calls for help, panic, distress gestures, fainting)
4. Violence or threats (fighting, physical altercations, threatening behavior)

Current timestamp: {}

Pose keypoint data from the frame:
{}

Respond ONLY with valid JSON in this exact format (no additional text):
{{
  \"events\": [
    {{
      \"timestamp\": \"{}\",
      \"description\": \"Brief description of event (max 100 characters)\",
      \"isDangerous\": true or false
    }}
  ]
}}

If no concerning events are detected, return: {{\"events\": []}}",
            self.event_type.as_str(),
            self.confidence * 100.0,
            self.description,
            self.timestamp,
            self.keypoint_summary,
            self.timestamp,
        )
    }
}

/// Seconds to MM:SS. Minutes keep counting past 59.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn summarize_keypoints(keypoints: &[Keypoint], min_score: f32) -> String {
    keypoints
        .iter()
        .filter(|kp| kp.is_usable(min_score))
        .map(|kp| {
            format!(
                "{}: ({:.0}, {:.0}) [confidence: {:.0}%]",
                kp.name.as_str(),
                kp.x,
                kp.y,
                kp.score * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// RESPONSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedEvent {
    pub timestamp: String,
    pub description: String,
    pub is_dangerous: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmationVerdict {
    pub events: Vec<ConfirmedEvent>,
}

impl ConfirmationVerdict {
    /// Parse the model's reply. Tolerates prose around the JSON object;
    /// entries missing a field are dropped.
    pub fn parse(text: &str) -> Result<Self> {
        let (start, end) = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if end > start => (start, end),
            _ => bail!("No JSON object found in confirmation response"),
        };

        let raw: serde_json::Value = serde_json::from_str(&text[start..=end])
            .context("Failed to parse confirmation response JSON")?;
        let entries = match raw.get("events").and_then(|e| e.as_array()) {
            Some(entries) => entries,
            None => bail!("Invalid confirmation response: missing events array"),
        };

        let events: Vec<ConfirmedEvent> = entries
            .iter()
            .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Dropping malformed confirmation entry: {}", e);
                    None
                }
            })
            .collect();

        if events.is_empty() {
            info!("ℹ️  Confirmation: no concerning events in frame");
        } else {
            info!("✅ Confirmation returned {} event(s)", events.len());
        }

        Ok(Self { events })
    }

    pub fn is_dangerous(&self) -> bool {
        self.events.iter().any(|e| e.is_dangerous)
    }
}
