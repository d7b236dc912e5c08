//! Matching utilities for multi-object tracking.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::tracker::appearance::{Feature, cosine_distance_matrix};
use crate::tracker::rect::{Rect, iou_batch};

/// Cost given to padding cells and unusable entries in optimal assignment.
const PADDING_COST: f64 = 1e6;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in TLWH format (x, y, width, height)
    pub bbox: Rect,
    /// Detection confidence score, carried through but not used for matching
    pub score: Option<f32>,
    /// Class label, carried through but not used for matching
    pub class_id: Option<usize>,
}

impl Detection {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_rect(Rect::new(x, y, width, height))
    }

    pub fn from_rect(bbox: Rect) -> Self {
        Self {
            bbox,
            score: None,
            class_id: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_class(mut self, class_id: usize) -> Self {
        self.class_id = Some(class_id);
        self
    }
}

/// Algorithm used to solve the track/detection assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssignmentStrategy {
    /// Accept pairs in ascending cost order, skipping already claimed rows
    /// and columns.
    #[default]
    Greedy,
    /// Minimum total cost assignment (Jonker-Volgenant).
    Optimal,
}

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

/// Association cost between tracks (rows) and detections (columns).
///
/// With `appearance_weight == 0` this is exactly `1 - IoU`. A positive weight
/// blends in the cosine distance between each track's stored descriptor and
/// each detection's descriptor: `(1 - w) * (1 - IoU) + w * cosine`.
pub fn cost_matrix(
    track_boxes: &[Rect],
    track_features: &[&[f32]],
    det_boxes: &[Rect],
    det_features: &[Feature],
    appearance_weight: f32,
) -> Array2<f32> {
    let mut cost = iou_distance(track_boxes, det_boxes);
    let weight = appearance_weight.clamp(0.0, 1.0);
    if weight > 0.0 {
        let appearance = cosine_distance_matrix(track_features, det_features);
        if appearance.dim() == cost.dim() {
            cost.zip_mut_with(&appearance, |c, &a| *c = (1.0 - weight) * *c + weight * a);
        }
    }
    cost
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn all_unmatched(num_rows: usize, num_cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        }
    }

    fn from_claims(matches: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        let mut track_used = vec![false; num_rows];
        let mut det_used = vec![false; num_cols];
        for &(i, j) in &matches {
            track_used[i] = true;
            det_used[j] = true;
        }
        Self {
            matches,
            unmatched_tracks: (0..num_rows).filter(|&i| !track_used[i]).collect(),
            unmatched_detections: (0..num_cols).filter(|&j| !det_used[j]).collect(),
        }
    }
}

#[inline]
fn passes_gate(cost: f32, thresh: f32) -> bool {
    !cost.is_nan() && (thresh <= 0.0 || cost <= thresh)
}

/// Solve the assignment with the chosen strategy.
///
/// Pairs whose cost exceeds `thresh` are never matched; `thresh <= 0`
/// disables the gate.
pub fn assign(cost_matrix: &Array2<f32>, thresh: f32, strategy: AssignmentStrategy) -> AssignmentResult {
    match strategy {
        AssignmentStrategy::Greedy => greedy_assignment(cost_matrix, thresh),
        AssignmentStrategy::Optimal => linear_assignment(cost_matrix, thresh),
    }
}

/// Greedy sort-and-claim assignment.
///
/// Candidates passing the gate are sorted by `(cost, row, column)` and
/// accepted in that order unless their row or column is already claimed.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult::all_unmatched(num_rows, num_cols);
    }

    let mut candidates: Vec<(f32, usize, usize)> = cost_matrix
        .indexed_iter()
        .filter(|&(_, &cost)| passes_gate(cost, thresh))
        .map(|((i, j), &cost)| (cost, i, j))
        .collect();
    candidates.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let mut track_used = vec![false; num_rows];
    let mut det_used = vec![false; num_cols];
    let mut matches = vec![];
    for (_, i, j) in candidates {
        if !track_used[i] && !det_used[j] {
            track_used[i] = true;
            det_used[j] = true;
            matches.push((i, j));
        }
    }

    AssignmentResult::from_claims(matches, num_rows, num_cols)
}

/// Minimum total cost assignment via lapjv, gated after solving.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult::all_unmatched(num_rows, num_cols);
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), PADDING_COST);

    for ((i, j), &cost) in cost_matrix.indexed_iter() {
        if cost.is_finite() {
            padded[[i, j]] = cost as f64;
        }
    }

    let mut matches = vec![];
    if let Ok((row_to_col, _)) = lapjv::lapjv(&padded) {
        for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
            if col_idx < num_cols && passes_gate(cost_matrix[[row_idx, col_idx]], thresh) {
                matches.push((row_idx, col_idx));
            }
        }
    }

    AssignmentResult::from_claims(matches, num_rows, num_cols)
}
