/// Smallest union area used by [`Rect::iou`], so degenerate boxes never divide by zero.
const UNION_EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box in pixel space.
///
/// Stored as top-left corner plus size (TLWH); detectors usually hand boxes
/// over as corner pairs (TLBR), see [`Rect::from_tlbr`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Center snapped down to whole pixels.
    #[inline]
    pub fn center_px(&self) -> (i32, i32) {
        let (cx, cy) = self.center();
        (cx.floor() as i32, cy.floor() as i32)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = (self.area() + other.area() - inter_area).max(UNION_EPSILON);
        inter_area / union_area
    }
}

use ndarray::Array2;

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_center_px_floors() {
        let rect = Rect::from_tlbr(60.0, 400.0, 141.0, 601.0);
        assert_eq!(rect.center(), (100.5, 500.5));
        assert_eq!(rect.center_px(), (100, 500));
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection: 5x5 = 25
        // Union: 100 + 100 - 25 = 175
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_is_symmetric() {
        let a = Rect::from_tlbr(3.0, 7.0, 40.0, 90.0);
        let b = Rect::from_tlbr(20.0, 10.0, 70.0, 120.0);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = Rect::new(5.0, 5.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 10.0, 10.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let ious = iou_batch(&a, &b);
        assert_eq!(ious.dim(), (2, 1));
        assert!((ious[[0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(ious[[1, 0]], 0.0);
    }
}
