//! Colour-distribution appearance descriptors for re-identification.

use image::RgbImage;
use ndarray::Array1;

use crate::tracker::rect::Rect;

/// Bins per HSV channel.
const BINS: usize = 8;

/// Length of every descriptor produced by [`HsvHistogram`]: 8 x 8 x 8 joint bins.
pub const DESCRIPTOR_LEN: usize = BINS * BINS * BINS;

/// Hue range of the 8-bit HSV encoding (degrees halved).
const HUE_RANGE: f32 = 180.0;

/// Fixed-size appearance summary of an image region.
///
/// An all-zero descriptor is the "no signal" sentinel returned for empty
/// crops; it never matches anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor(Array1<f32>);

impl Descriptor {
    /// The "no signal" sentinel of the given length.
    pub fn zeros(len: usize) -> Self {
        Self(Array1::zeros(len))
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Self(Array1::from_vec(values))
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for zero-length descriptors and the all-zero sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.iter().all(|&v| v == 0.0)
    }
}

/// Appearance strategy injected into a tracking session.
pub trait AppearanceModel {
    /// Describe the region `bbox` of `image`.
    fn descriptor(&self, image: &RgbImage, bbox: &Rect) -> Descriptor;

    /// Score in `[-1, 1]`; `-1.0` means "definitely not the same".
    fn similarity(&self, a: &Descriptor, b: &Descriptor) -> f32;
}

/// Joint hue/saturation/value histogram compared by correlation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HsvHistogram;

impl HsvHistogram {
    pub fn new() -> Self {
        Self
    }
}

impl AppearanceModel for HsvHistogram {
    fn descriptor(&self, image: &RgbImage, bbox: &Rect) -> Descriptor {
        let Some((x1, y1, x2, y2)) = crop_bounds(image, bbox) else {
            return Descriptor::zeros(DESCRIPTOR_LEN);
        };

        let mut hist = vec![0.0f32; DESCRIPTOR_LEN];
        for y in y1..y2 {
            for x in x1..x2 {
                let [r, g, b] = image.get_pixel(x, y).0;
                let (h, s, v) = rgb_to_hsv8(r, g, b);
                hist[bin_index(h, s, v)] += 1.0;
            }
        }

        let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            hist.iter_mut().for_each(|v| *v /= norm);
        }
        Descriptor::from_vec(hist)
    }

    fn similarity(&self, a: &Descriptor, b: &Descriptor) -> f32 {
        correlation(a, b)
    }
}

/// Pearson correlation between two histograms.
///
/// Empty descriptors, sentinels and mismatched lengths score `-1.0`.
pub fn correlation(a: &Descriptor, b: &Descriptor) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return -1.0;
    }

    let n = a.len() as f64;
    let mean_a = a.0.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.0.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut num = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&va, &vb) in a.0.iter().zip(b.0.iter()) {
        let da = va as f64 - mean_a;
        let db = vb as f64 - mean_b;
        num += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > f64::EPSILON {
        (num / denom).clamp(-1.0, 1.0) as f32
    } else {
        // Two flat histograms carry no shape to disagree on.
        1.0
    }
}

/// Pixel bounds of the crop, `None` when nothing is left after clamping.
fn crop_bounds(image: &RgbImage, bbox: &Rect) -> Option<(u32, u32, u32, u32)> {
    let [bx1, by1, bx2, by2] = bbox.to_tlbr();
    let (width, height) = image.dimensions();

    let x1 = (bx1 as i64).max(0).min(width as i64) as u32;
    let y1 = (by1 as i64).max(0).min(height as i64) as u32;
    let x2 = (bx2 as i64).max(1).min(width as i64) as u32;
    let y2 = (by2 as i64).max(1).min(height as i64) as u32;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2, y2))
}

/// RGB to 8-bit HSV: hue in `[0, 180)`, saturation and value in `[0, 255]`.
fn rgb_to_hsv8(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (h / 2.0, s, max)
}

fn bin_index(h: f32, s: f32, v: f32) -> usize {
    let hb = ((h / HUE_RANGE * BINS as f32) as usize).min(BINS - 1);
    let sb = ((s / 256.0 * BINS as f32) as usize).min(BINS - 1);
    let vb = ((v / 256.0 * BINS as f32) as usize).min(BINS - 1);
    hb * BINS * BINS + sb * BINS + vb
}
