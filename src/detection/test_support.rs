// src/detection/test_support.rs
//
// Synthetic pose builders for detector tests.

use crate::types::{Keypoint, Landmark, PoseFrame};

pub const HEIGHT: f32 = 200.0;
pub const FRAME_W: f32 = 640.0;
pub const FRAME_H: f32 = 480.0;
const TORSO_LEN: f32 = 80.0;
const COM_X: f32 = 320.0;

pub fn kp(name: Landmark, x: f32, y: f32) -> Keypoint {
    Keypoint::new(name, x, y, 0.9)
}

/// A body whose center of mass sits at (COM_X, `com_y`), torso rotated
/// `angle_deg` from vertical, nose just above the shoulders and both
/// ankles exactly HEIGHT below the nose. No eyes, no wrists.
pub fn posed_frame(timestamp: f64, com_y: f32, angle_deg: f32) -> PoseFrame {
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.sin() * TORSO_LEN / 2.0, rad.cos() * TORSO_LEN / 2.0);

    let shoulder = (COM_X - dx, com_y - dy);
    let hip = (COM_X + dx, com_y + dy);
    let nose = (shoulder.0, shoulder.1 - HEIGHT * 0.1);

    PoseFrame::new(
        timestamp,
        vec![
            kp(Landmark::Nose, nose.0, nose.1),
            kp(Landmark::LeftShoulder, shoulder.0 - 15.0, shoulder.1),
            kp(Landmark::RightShoulder, shoulder.0 + 15.0, shoulder.1),
            kp(Landmark::LeftHip, hip.0 - 12.0, hip.1),
            kp(Landmark::RightHip, hip.0 + 12.0, hip.1),
            kp(Landmark::LeftAnkle, nose.0, nose.1 + HEIGHT),
            kp(Landmark::RightAnkle, nose.0, nose.1 + HEIGHT),
        ],
    )
    .with_frame_size(FRAME_W, FRAME_H)
}

/// Upright person standing at the given shoulder height, with wrists
/// placed by the caller. Nose 40px above the shoulders.
pub fn arms_frame(timestamp: f64, left_wrist_y: f32, right_wrist_y: f32) -> PoseFrame {
    let shoulder_y = 200.0;
    PoseFrame::new(
        timestamp,
        vec![
            kp(Landmark::Nose, 320.0, shoulder_y - 40.0),
            kp(Landmark::LeftShoulder, 290.0, shoulder_y),
            kp(Landmark::RightShoulder, 350.0, shoulder_y),
            kp(Landmark::LeftWrist, 270.0, left_wrist_y),
            kp(Landmark::RightWrist, 370.0, right_wrist_y),
            kp(Landmark::LeftHip, 300.0, shoulder_y + 100.0),
            kp(Landmark::RightHip, 340.0, shoulder_y + 100.0),
            kp(Landmark::LeftAnkle, 300.0, shoulder_y + 240.0),
            kp(Landmark::RightAnkle, 340.0, shoulder_y + 240.0),
        ],
    )
    .with_frame_size(FRAME_W, FRAME_H)
}

/// Upright person with the nose `tilt_px` above the shoulder line and
/// optional eyes offset from the nose (negative = above).
pub fn tilt_frame(timestamp: f64, tilt_px: f32, eye_offset: Option<f32>) -> PoseFrame {
    let shoulder_y = 200.0;
    let nose_y = shoulder_y - tilt_px;
    let mut keypoints = vec![
        kp(Landmark::Nose, 320.0, nose_y),
        kp(Landmark::LeftShoulder, 290.0, shoulder_y),
        kp(Landmark::RightShoulder, 350.0, shoulder_y),
        kp(Landmark::LeftHip, 300.0, shoulder_y + 100.0),
        kp(Landmark::RightHip, 340.0, shoulder_y + 100.0),
        kp(Landmark::LeftAnkle, 320.0, nose_y + HEIGHT),
        kp(Landmark::RightAnkle, 320.0, nose_y + HEIGHT),
    ];
    if let Some(offset) = eye_offset {
        keypoints.push(kp(Landmark::LeftEye, 312.0, nose_y + offset));
        keypoints.push(kp(Landmark::RightEye, 328.0, nose_y + offset));
    }
    PoseFrame::new(timestamp, keypoints).with_frame_size(FRAME_W, FRAME_H)
}

/// Frame timestamps at 10 Hz starting from `start`.
pub fn ticks(start: f64, count: usize) -> impl Iterator<Item = f64> {
    (0..count).map(move |i| start + i as f64 * 0.1)
}
