// src/detection/metrics.rs
//
// Scale-invariant body measurements derived from a single pose frame.
// Everything here is stateless; detectors express their distance
// thresholds as fractions of `height` so the same config works at any
// camera distance or resolution.

use crate::types::{Landmark, PoseFrame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Measurements for one frame. Recomputed every frame, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonMetrics {
    /// Nose-to-lowest-ankle distance; 0.0 means "cannot scale this frame"
    pub height: f32,
    pub center_of_mass: Option<Point>,
    /// 0 = upright, 90 = lying flat. None without both shoulders and both hips.
    pub body_angle: Option<f32>,
    pub shoulder_center: Option<Point>,
    pub hip_center: Option<Point>,
    pub nose: Option<Point>,
    pub eye_center: Option<Point>,
    /// Mean score of the usable nose, shoulders and hips (0.0 if none)
    pub torso_confidence: f32,
}

impl PersonMetrics {
    pub fn compute(frame: &PoseFrame, min_score: f32) -> Self {
        let point = |name: Landmark| frame.usable(name, min_score).map(|kp| Point::new(kp.x, kp.y));
        let pair = |a: Landmark, b: Landmark| match (point(a), point(b)) {
            (Some(p), Some(q)) => Some(p.midpoint(&q)),
            _ => None,
        };

        let shoulder_center = pair(Landmark::LeftShoulder, Landmark::RightShoulder);
        let hip_center = pair(Landmark::LeftHip, Landmark::RightHip);

        let body_angle = match (shoulder_center, hip_center) {
            (Some(s), Some(h)) => body_angle(s, h),
            _ => None,
        };

        Self {
            height: person_height(frame, min_score),
            center_of_mass: center_of_mass(frame, min_score),
            body_angle,
            shoulder_center,
            hip_center,
            nose: point(Landmark::Nose),
            eye_center: pair(Landmark::LeftEye, Landmark::RightEye),
            torso_confidence: torso_confidence(frame, min_score),
        }
    }

    pub fn has_height(&self) -> bool {
        self.height > 0.0
    }
}

/// Distance from the nose to the lowest usable ankle (largest image Y).
pub fn person_height(frame: &PoseFrame, min_score: f32) -> f32 {
    let nose = match frame.usable(Landmark::Nose, min_score) {
        Some(kp) => Point::new(kp.x, kp.y),
        None => return 0.0,
    };

    let ankle = [Landmark::LeftAnkle, Landmark::RightAnkle]
        .iter()
        .filter_map(|&name| frame.usable(name, min_score))
        .max_by(|a, b| a.y.total_cmp(&b.y));

    match ankle {
        Some(kp) => nose.distance(&Point::new(kp.x, kp.y)),
        None => 0.0,
    }
}

/// Mean position of the usable shoulders and hips (up to four points).
pub fn center_of_mass(frame: &PoseFrame, min_score: f32) -> Option<Point> {
    let points: Vec<Point> = TORSO
        .iter()
        .filter_map(|&name| frame.usable(name, min_score))
        .map(|kp| Point::new(kp.x, kp.y))
        .collect();

    if points.is_empty() {
        return None;
    }

    let n = points.len() as f32;
    Some(Point::new(
        points.iter().map(|p| p.x).sum::<f32>() / n,
        points.iter().map(|p| p.y).sum::<f32>() / n,
    ))
}

/// Angle between the shoulder→hip vector and vertical, in [0, 90] degrees.
/// A zero-length torso has no orientation.
pub fn body_angle(shoulder_center: Point, hip_center: Point) -> Option<f32> {
    let dx = (hip_center.x - shoulder_center.x).abs();
    let dy = (hip_center.y - shoulder_center.y).abs();
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(dx.atan2(dy).to_degrees())
}

fn torso_confidence(frame: &PoseFrame, min_score: f32) -> f32 {
    let scores: Vec<f32> = std::iter::once(Landmark::Nose)
        .chain(TORSO.iter().copied())
        .filter_map(|name| frame.usable(name, min_score))
        .map(|kp| kp.score)
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f32>() / scores.len() as f32
    }
}

const TORSO: [Landmark; 4] = [
    Landmark::LeftShoulder,
    Landmark::RightShoulder,
    Landmark::LeftHip,
    Landmark::RightHip,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Keypoint;

    fn kp(name: Landmark, x: f32, y: f32) -> Keypoint {
        Keypoint::new(name, x, y, 0.9)
    }

    fn standing() -> PoseFrame {
        PoseFrame::new(
            0.0,
            vec![
                kp(Landmark::Nose, 100.0, 50.0),
                kp(Landmark::LeftShoulder, 90.0, 100.0),
                kp(Landmark::RightShoulder, 110.0, 100.0),
                kp(Landmark::LeftHip, 92.0, 200.0),
                kp(Landmark::RightHip, 108.0, 200.0),
                kp(Landmark::LeftAnkle, 95.0, 330.0),
                kp(Landmark::RightAnkle, 105.0, 350.0),
            ],
        )
    }

    #[test]
    fn test_height_uses_lowest_ankle() {
        let height = person_height(&standing(), 0.3);
        let expected = Point::new(100.0, 50.0).distance(&Point::new(105.0, 350.0));
        assert!((height - expected).abs() < 1e-3, "got {}", height);
    }

    #[test]
    fn test_height_zero_without_ankles() {
        let mut frame = standing();
        for k in frame.keypoints.iter_mut() {
            if matches!(k.name, Landmark::LeftAnkle | Landmark::RightAnkle) {
                k.score = 0.1;
            }
        }
        assert_eq!(person_height(&frame, 0.3), 0.0);
    }

    #[test]
    fn test_center_of_mass_averages_torso() {
        let com = center_of_mass(&standing(), 0.3).unwrap();
        assert!((com.x - 100.0).abs() < 1e-3);
        assert!((com.y - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_center_of_mass_absent_when_torso_hidden() {
        let frame = PoseFrame::new(0.0, vec![kp(Landmark::Nose, 1.0, 1.0)]);
        assert!(center_of_mass(&frame, 0.3).is_none());
    }

    #[test]
    fn test_body_angle_upright_and_flat() {
        let upright = body_angle(Point::new(0.0, 0.0), Point::new(0.0, 100.0)).unwrap();
        assert!(upright.abs() < 1e-3);

        let flat = body_angle(Point::new(0.0, 0.0), Point::new(-100.0, 0.0)).unwrap();
        assert!((flat - 90.0).abs() < 1e-3);

        let diagonal = body_angle(Point::new(0.0, 0.0), Point::new(50.0, -50.0)).unwrap();
        assert!((diagonal - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_body_angle_requires_both_shoulders_and_hips() {
        let mut frame = standing();
        frame.keypoints.retain(|k| k.name != Landmark::RightHip);
        let metrics = PersonMetrics::compute(&frame, 0.3);
        assert!(metrics.body_angle.is_none());
        assert!(metrics.center_of_mass.is_some());
    }

    #[test]
    fn test_non_finite_keypoint_is_ignored() {
        let mut frame = standing();
        frame.keypoints[0].y = f32::NAN;
        let metrics = PersonMetrics::compute(&frame, 0.3);
        assert!(metrics.nose.is_none());
        assert_eq!(metrics.height, 0.0);
    }
}
