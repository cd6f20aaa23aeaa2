use std::path::{Path, PathBuf};

use assets::ScalePolicy;
use serde::{Deserialize, Serialize};

use crate::error::GraspError;

/// Tunables of the grasp search. Every field has a default, so a config file
/// only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspConfig {
    /// Distance from a bounding-box face to the approach point, in meters.
    pub grasp_length: f64,
    /// Summed finger joint position below which a closed gripper is
    /// considered empty. Depends on the gripper geometry.
    pub closed_gripper_threshold: f64,
    /// Decimal digits kept when grasps are persisted.
    pub round_digits: u32,
    pub grasps_dir: PathBuf,
    pub handle_filter: bool,
    pub scale_policy: ScalePolicy,
    /// Offsets tried, in order, to pull a candidate toward the object.
    pub length_variants: Vec<f64>,
    pub models_dir: PathBuf,
    pub extents_file: PathBuf,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            grasp_length: 0.02,
            closed_gripper_threshold: 0.01,
            round_digits: 4,
            grasps_dir: PathBuf::from("grasps"),
            handle_filter: false,
            scale_policy: ScalePolicy::Reject,
            length_variants: vec![0.0],
            models_dir: PathBuf::from("models"),
            extents_file: PathBuf::from("aabb_extents.json"),
        }
    }
}

impl GraspConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self, GraspError> {
        let json = std::fs::read_to_string(path).map_err(|e| GraspError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: GraspConfig =
            serde_json::from_str(r#"{ "grasp_length": 0.03, "scale_policy": "midpoint" }"#).unwrap();
        assert!((config.grasp_length - 0.03).abs() < 1e-12);
        assert_eq!(config.scale_policy, ScalePolicy::Midpoint);
        assert!((config.closed_gripper_threshold - 0.01).abs() < 1e-12);
        assert_eq!(config.length_variants, vec![0.0]);
        assert_eq!(config.round_digits, 4);
    }

    #[test]
    fn unknown_scale_policy_is_rejected() {
        let parsed = serde_json::from_str::<GraspConfig>(r#"{ "scale_policy": "clamp" }"#);
        assert!(parsed.is_err());
    }
}
