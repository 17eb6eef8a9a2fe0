//! Merging of overlapping detections
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Detected window in source image pixels
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector score of the window
    pub score: f32,
}

impl Detection {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Intersection over union of two detections
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    if x1 >= x2 || y1 >= y2 {
        return 0.0;
    }
    let inter = (x2 - x1) * (y2 - y1);
    inter / (a.area() + b.area() - inter)
}

/// Greedy non-maximum suppression
///
/// Detections are visited by decreasing score and kept unless they overlap an already kept
/// detection by more than `threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept.iter().all(|k| iou(k, &candidate) <= threshold) {
            kept.push(candidate);
        }
    }
    kept
}
