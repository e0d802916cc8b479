// src/config.rs

use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;

        if !(0.0..=1.0).contains(&d.min_keypoint_score) {
            bail!(
                "detection.min_keypoint_score must be within [0, 1], got {}",
                d.min_keypoint_score
            );
        }
        if let Some(size) = d.frame_size {
            if size.width <= 0.0 || size.height <= 0.0 {
                bail!(
                    "detection.frame_size must be positive, got {}x{}",
                    size.width,
                    size.height
                );
            }
        }

        if d.fall.history_len < 2 {
            bail!("detection.fall.history_len must be >= 2 to compute velocity");
        }
        check_fraction("detection.fall.velocity_ratio", d.fall.velocity_ratio)?;
        check_angle("detection.fall.min_body_angle_deg", d.fall.min_body_angle_deg)?;
        check_window("detection.fall.debounce_secs", d.fall.debounce_secs)?;

        check_angle("detection.ground.min_body_angle_deg", d.ground.min_body_angle_deg)?;
        check_fraction("detection.ground.low_frame_fraction", d.ground.low_frame_fraction)?;
        check_duration("detection.ground.min_duration_secs", d.ground.min_duration_secs)?;
        check_window("detection.ground.debounce_secs", d.ground.debounce_secs)?;
        check_fraction("detection.ground.confidence", d.ground.confidence)?;

        if !d.hands_raised.shoulder_offset_px.is_finite() || d.hands_raised.shoulder_offset_px < 0.0 {
            bail!("detection.hands_raised.shoulder_offset_px must be a non-negative pixel count");
        }
        check_duration(
            "detection.hands_raised.min_duration_secs",
            d.hands_raised.min_duration_secs,
        )?;
        check_window("detection.hands_raised.debounce_secs", d.hands_raised.debounce_secs)?;

        check_fraction("detection.head_tilt.tilt_ratio", d.head_tilt.tilt_ratio)?;
        check_duration("detection.head_tilt.min_duration_secs", d.head_tilt.min_duration_secs)?;
        check_window("detection.head_tilt.debounce_secs", d.head_tilt.debounce_secs)?;

        if self.pipeline.event_bus_capacity == 0 {
            bail!("pipeline.event_bus_capacity must be at least 1");
        }

        Ok(())
    }
}

fn check_fraction(name: &str, value: f32) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        bail!("{} must be within (0, 1], got {}", name, value);
    }
    Ok(())
}

fn check_angle(name: &str, value: f32) -> Result<()> {
    if !(0.0..=90.0).contains(&value) {
        bail!("{} must be within [0, 90] degrees, got {}", name, value);
    }
    Ok(())
}

fn check_duration(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{} must be positive, got {}", name, value);
    }
    Ok(())
}

fn check_window(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("{} must be non-negative, got {}", name, value);
    }
    Ok(())
}
