use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CountError;

/// How detections are paired with active tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStrategy {
    /// Tracks in ascending id order each take their best remaining detection.
    #[default]
    Greedy,
    /// Globally optimal IoU assignment (Jonker-Volgenant).
    Optimal,
}

/// Configuration for the tracking session and zone counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU (exclusive) for a detection to continue an active track.
    pub iou_threshold: f32,
    /// Minimum appearance similarity (exclusive) to reinstate a lost track.
    pub reid_threshold: f32,
    /// Frames an active track may go unmatched before it is demoted to lost.
    pub max_unmatched_frames: u64,
    /// Frames a lost track is kept for re-identification before it expires.
    pub max_lost_frames: u64,
    /// Matches a track needs before it can be counted.
    pub min_track_age: u32,
    /// Net vertical displacement (exclusive, pixels) required to count.
    pub min_displacement: i32,
    pub assignment: AssignmentStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.4,
            reid_threshold: 0.45,
            max_unmatched_frames: 5,
            max_lost_frames: 50,
            min_track_age: 6,
            min_displacement: 10,
            assignment: AssignmentStrategy::Greedy,
        }
    }
}

impl TrackerConfig {
    /// Parse a (possibly partial) JSON configuration; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CountError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CountError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            TrackerConfig::from_json_str(r#"{"iou_threshold": 0.5, "assignment": "optimal"}"#)
                .unwrap();
        assert_eq!(config.iou_threshold, 0.5);
        assert_eq!(config.assignment, AssignmentStrategy::Optimal);
        assert_eq!(config.max_lost_frames, 50);
        assert_eq!(config.min_track_age, 6);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = TrackerConfig::from_json_str("{iou_threshold: }").unwrap_err();
        assert!(matches!(err, CountError::Json(_)));
    }
}
