//! Detector collaborator contract.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CountError;
use crate::tracker::Detection;

/// COCO class index of "person".
pub const PERSON_CLASS_ID: usize = 0;

/// Box reported by a detector, before class filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding box in TLBR format [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    pub class_id: usize,
    /// Confidence score; carried for completeness, tracking ignores it
    #[serde(default)]
    pub score: f32,
}

impl RawDetection {
    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }

    fn has_area(&self) -> bool {
        let [x1, y1, x2, y2] = self.bbox;
        x1 < x2 && y1 < y2
    }

    /// Tracker input with the box snapped to whole pixels, truncating toward zero.
    pub fn to_detection(&self) -> Detection {
        let [x1, y1, x2, y2] = self.bbox.map(f32::trunc);
        Detection::new(x1, y1, x2, y2)
    }
}

/// Trait for object detection backends.
///
/// Implement this to feed any detection model into the counting pipeline.
///
/// # Example
///
/// ```
/// use image::RgbImage;
/// use passenger_count::{DetectionSource, RawDetection};
///
/// struct FixedDetector;
///
/// impl DetectionSource for FixedDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<RawDetection>, Self::Error> {
///         Ok(vec![RawDetection { bbox: [10.0, 20.0, 50.0, 120.0], class_id: 0, score: 0.9 }])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: fmt::Display;

    /// Run inference on one frame.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<RawDetection>, Self::Error>;
}

/// Conversion of detector output into tracker input.
pub trait IntoDetections {
    /// Keep only well-formed person boxes.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<RawDetection> {
    fn into_detections(self) -> Vec<Detection> {
        self.iter()
            .filter(|d| d.is_person() && d.has_area())
            .map(RawDetection::to_detection)
            .collect()
    }
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Replays detections computed offline, one list per frame.
///
/// The JSON input is an array with one entry per frame; each entry is an array
/// of [`RawDetection`] objects. Entries that do not parse are replayed as
/// empty frames, and frames past the end of the file have no detections.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDetections {
    frames: VecDeque<Vec<RawDetection>>,
}

impl PrecomputedDetections {
    pub fn new(frames: Vec<Vec<RawDetection>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CountError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let frames = entries
            .into_iter()
            .enumerate()
            .map(|(frame, entry)| {
                serde_json::from_value::<Vec<RawDetection>>(entry).unwrap_or_else(|e| {
                    warn!(frame, error = %e, "malformed detection list, treating frame as empty");
                    Vec::new()
                })
            })
            .collect();
        Ok(Self { frames })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CountError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Frames still queued.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionSource for PrecomputedDetections {
    type Error = Infallible;

    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<RawDetection>, Self::Error> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
