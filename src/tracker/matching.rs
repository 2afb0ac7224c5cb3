//! Spatial assignment of detections to active tracks.

use ndarray::Array2;

use crate::tracker::rect::Rect;

/// Person detection for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Bounding box, built from TLBR corners (x1, y1, x2, y2)
    pub bbox: Rect,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
        }
    }

    pub fn from_rect(bbox: Rect) -> Self {
        Self { bbox }
    }
}

/// Row (track) / column (detection) pairs plus the detections left over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// First-processed-track-wins assignment.
///
/// Rows are visited in order; each takes the unconsumed column with the
/// highest IoU (first one on ties) and keeps it if the IoU exceeds `thresh`.
/// A column consumed by an earlier row is unavailable to later rows.
pub fn greedy_assignment(ious: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = ious.dim();
    let mut consumed = vec![false; num_cols];
    let mut matches = Vec::new();
    let mut unmatched_tracks = Vec::new();

    for row in 0..num_rows {
        let mut best_iou = 0.0;
        let mut best_col = None;
        for col in 0..num_cols {
            if consumed[col] {
                continue;
            }
            let iou = ious[[row, col]];
            if iou > best_iou {
                best_iou = iou;
                best_col = Some(col);
            }
        }

        match best_col {
            Some(col) if best_iou > thresh => {
                consumed[col] = true;
                matches.push((row, col));
            }
            _ => unmatched_tracks.push(row),
        }
    }

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections: unconsumed(&consumed),
    }
}

/// Globally optimal assignment maximising total IoU.
///
/// Pairs at or below `thresh` are rejected afterwards, so the IoU gate stays a
/// hard floor.
pub fn optimal_assignment(ious: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = ious.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);
    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = 1.0 - ious[[i, j]] as f64;
        }
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut consumed = vec![false; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(num_rows) {
                if col < num_cols && ious[[row, col]] > thresh {
                    matches.push((row, col));
                    consumed[col] = true;
                } else {
                    unmatched_tracks.push(row);
                }
            }
        }
        Err(_) => return greedy_assignment(ious, thresh),
    }

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections: unconsumed(&consumed),
    }
}

fn unconsumed(consumed: &[bool]) -> Vec<usize> {
    consumed
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c { None } else { Some(i) })
        .collect()
}
