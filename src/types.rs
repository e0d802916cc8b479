// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub pipeline: PipelineConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Keypoints scoring below this are never read by any detector.
    pub min_keypoint_score: f32,
    /// Fallback image size for frames that do not report their own.
    pub frame_size: Option<FrameSize>,
    pub fall: FallConfig,
    pub ground: GroundConfig,
    pub hands_raised: HandsRaisedConfig,
    pub head_tilt: HeadTiltConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_keypoint_score: 0.3,
            frame_size: None,
            fall: FallConfig::default(),
            ground: GroundConfig::default(),
            hands_raised: HandsRaisedConfig::default(),
            head_tilt: HeadTiltConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    pub enabled: bool,
    /// Per-frame downward step, as a fraction of body height
    pub velocity_ratio: f32,
    pub min_body_angle_deg: f32,
    pub history_len: usize,
    pub debounce_secs: f64,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            velocity_ratio: 0.15,
            min_body_angle_deg: 60.0,
            history_len: 5,
            debounce_secs: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub enabled: bool,
    pub min_body_angle_deg: f32,
    /// Hip center must sit at or below this fraction of the frame height
    pub low_frame_fraction: f32,
    pub min_duration_secs: f64,
    pub debounce_secs: f64,
    pub confidence: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_body_angle_deg: 60.0,
            low_frame_fraction: 0.6,
            min_duration_secs: 5.0,
            debounce_secs: 10.0,
            confidence: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsRaisedConfig {
    pub enabled: bool,
    /// Fixed pixel offset, NOT scaled by body height
    pub shoulder_offset_px: f32,
    pub min_duration_secs: f64,
    pub debounce_secs: f64,
}

impl Default for HandsRaisedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shoulder_offset_px: 30.0,
            min_duration_secs: 2.0,
            debounce_secs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadTiltConfig {
    pub enabled: bool,
    /// Nose-above-shoulders distance, as a fraction of body height
    pub tilt_ratio: f32,
    pub min_duration_secs: f64,
    pub debounce_secs: f64,
}

impl Default for HeadTiltConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tilt_ratio: 0.20,
            min_duration_secs: 3.0,
            debounce_secs: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub event_bus_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub write_events: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input_dir: "poses".to_string(),
            output_dir: "events".to_string(),
            write_events: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// POSE INPUT
// ============================================================================

/// COCO-17 landmark set as produced by MoveNet-style estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Landmark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: Landmark,
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

impl Keypoint {
    pub fn new(name: Landmark, x: f32, y: f32, score: f32) -> Self {
        Self { name, x, y, score }
    }

    /// Usable keypoints are the only ones whose coordinates may be read.
    pub fn is_usable(&self, min_score: f32) -> bool {
        self.score.is_finite() && self.score >= min_score && self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Seconds since session start; strictly increasing within a session
    pub timestamp: f64,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<FrameSize>,
}

impl PoseFrame {
    pub fn new(timestamp: f64, keypoints: Vec<Keypoint>) -> Self {
        Self {
            timestamp,
            keypoints,
            frame_size: None,
        }
    }

    pub fn with_frame_size(mut self, width: f32, height: f32) -> Self {
        self.frame_size = Some(FrameSize { width, height });
        self
    }

    /// First keypoint carrying this landmark, regardless of score.
    pub fn get(&self, name: Landmark) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Landmark lookup that only yields keypoints safe to read.
    pub fn usable(&self, name: Landmark, min_score: f32) -> Option<&Keypoint> {
        self.get(name).filter(|kp| kp.is_usable(min_score))
    }
}

// ============================================================================
// OUTPUT EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Fall,
    Ground,
    HandsRaised,
    HeadTiltBack,
}

impl EventType {
    /// Emission order within one frame's batch.
    pub const ALL: [EventType; 4] = [
        EventType::Fall,
        EventType::Ground,
        EventType::HandsRaised,
        EventType::HeadTiltBack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "FALL",
            Self::Ground => "GROUND",
            Self::HandsRaised => "HANDS_RAISED",
            Self::HeadTiltBack => "HEAD_TILT_BACK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: f64,
    pub confidence: f32,
    pub description: String,
    pub source_keypoints: Vec<Keypoint>,
}

impl DetectionEvent {
    pub fn new(
        event_type: EventType,
        frame: &PoseFrame,
        confidence: f32,
        description: String,
    ) -> Self {
        Self {
            event_type,
            timestamp: frame.timestamp,
            confidence,
            description,
            source_keypoints: frame.keypoints.clone(),
        }
    }
}

/// Per-type event counts, kept ordered for stable JSON output.
pub type EventCounts = BTreeMap<EventType, u64>;
