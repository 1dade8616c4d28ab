use crate::types::{Correspondence, Keypoint};
use crate::util::{median, pixel_distance};

/// Guards applied to each keypoint pair before its scale ratio is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioThresholds {
    /// Previous-frame distances at or below this are rejected.
    pub epsilon: f64,
    /// Current-frame distances below this (pixels) are rejected.
    pub min_pixel_distance: f64,
}

impl Default for RatioThresholds {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
            min_pixel_distance: 100.0,
        }
    }
}

/// `distCurr / distPrev` for every unordered pair of correspondences that
/// passes `thresholds`.
pub fn distance_ratios(
    keypoints_prev: &[Keypoint],
    keypoints_curr: &[Keypoint],
    correspondences: &[Correspondence],
    thresholds: &RatioThresholds,
) -> Vec<f64> {
    let resolved: Vec<_> = correspondences
        .iter()
        .filter_map(|m| {
            Some((
                keypoints_prev.get(m.previous_idx)?.pt,
                keypoints_curr.get(m.current_idx)?.pt,
            ))
        })
        .collect();

    let mut ratios = Vec::new();
    for (i, (prev_outer, curr_outer)) in resolved.iter().enumerate() {
        for (prev_inner, curr_inner) in &resolved[i + 1..] {
            let dist_curr = pixel_distance(*curr_outer, *curr_inner);
            let dist_prev = pixel_distance(*prev_outer, *prev_inner);
            if dist_prev > thresholds.epsilon && dist_curr >= thresholds.min_pixel_distance {
                ratios.push(dist_curr / dist_prev);
            }
        }
    }
    ratios
}

/// Time-to-collision from the median scale change of keypoint pairs.
///
/// NaN when no pair survives the thresholds. A median ratio below one
/// (shrinking object) gives a negative value.
pub fn compute_ttc_camera(
    keypoints_prev: &[Keypoint],
    keypoints_curr: &[Keypoint],
    correspondences: &[Correspondence],
    frame_rate: f64,
    thresholds: &RatioThresholds,
) -> f64 {
    let mut ratios = distance_ratios(keypoints_prev, keypoints_curr, correspondences, thresholds);
    match median(&mut ratios) {
        Some(ratio) => ttc_from_ratio(ratio, frame_rate),
        None => f64::NAN,
    }
}

pub fn ttc_from_ratio(median_ratio: f64, frame_rate: f64) -> f64 {
    let dt = 1.0 / frame_rate;
    -dt / (1.0 - median_ratio)
}
