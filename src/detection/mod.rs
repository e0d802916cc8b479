// src/detection/mod.rs
//
// Pose-stream safety detectors.
//
// Signal flow (per frame):
//   PoseFrame → metrics::PersonMetrics ─┬→ FallDetector ─────────┐
//                                       ├→ GroundDetector ───────┤
//                                       ├→ HandsRaisedDetector ──┼→ Vec<DetectionEvent>
//                                       └→ HeadTiltBackDetector ─┘
//
// Orchestrated by manager::DetectionManager.

mod fall;
mod ground;
mod hands_raised;
mod head_tilt;
mod manager;
pub mod metrics;
mod timing;

#[cfg(test)]
pub(crate) mod test_support;

pub use fall::FallDetector;
pub use ground::GroundDetector;
pub use hands_raised::{HandsRaisedDetector, RaisedPosture};
pub use head_tilt::HeadTiltBackDetector;
pub use manager::{DetectionManager, FrameOutput};
pub use metrics::{PersonMetrics, Point};
pub use timing::{AccumulationTimer, Debounce};
