//! Builder for creating RawDetection objects from various box formats.

use crate::integration::detector::{PERSON_CLASS_ID, RawDetection};

/// Builder for [`RawDetection`] values; defaults to the person class.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class_id: usize,
    score: f32,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            class_id: PERSON_CLASS_ID,
            score: 1.0,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Set the class label.
    pub fn class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the final `RawDetection`.
    pub fn build(self) -> RawDetection {
        RawDetection {
            bbox: [self.x1, self.y1, self.x2, self.y2],
            class_id: self.class_id,
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .xywh(100.0, 500.0, 80.0, 200.0)
            .score(0.95)
            .build();

        assert_eq!(det.bbox, [60.0, 400.0, 140.0, 600.0]);
        assert_eq!(det.score, 0.95);
        assert!(det.is_person());
    }

    #[test]
    fn test_non_person_class() {
        let det = DetectionBuilder::new().tlwh(0.0, 0.0, 10.0, 10.0).class_id(2).build();
        assert_eq!(det.bbox, [0.0, 0.0, 10.0, 10.0]);
        assert!(!det.is_person());
    }
}
