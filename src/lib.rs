// src/lib.rs
//
// Pose-based safety event detection: falls, people down on the ground,
// raised hands and a head thrown back, from per-frame body keypoints.

pub mod config;
pub mod confirmation;
pub mod detection;
pub mod pipeline;
pub mod pose_source;
pub mod types;

pub use confirmation::{ConfirmationRequest, ConfirmationVerdict};
pub use detection::{DetectionManager, FrameOutput, PersonMetrics};
pub use pipeline::{DetectionSession, SessionSummary};
pub use types::{Config, DetectionEvent, EventType, FrameSize, Keypoint, Landmark, PoseFrame};
