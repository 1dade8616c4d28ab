use log::debug;

use crate::types::{Correspondence, DetectionRegion, Keypoint};
use crate::util::mean;

/// Attaches to `region` every correspondence whose current keypoint lies in
/// its bounds, then drops those with `distance < outlier_ratio * mean`.
///
/// Correspondences pointing past the end of `keypoints_curr` are skipped.
/// The surviving current-frame keypoints are stored alongside.
pub fn cluster_correspondences_with_roi(
    region: &mut DetectionRegion,
    keypoints_curr: &[Keypoint],
    correspondences: &[Correspondence],
    outlier_ratio: f64,
) {
    let inside: Vec<Correspondence> = correspondences
        .iter()
        .filter(|m| {
            keypoints_curr
                .get(m.current_idx)
                .is_some_and(|kp| region.bounds.contains(kp.pt))
        })
        .copied()
        .collect();

    let kept = filter_low_distance(&inside, outlier_ratio);
    debug!(
        "region {}: {} correspondences inside, {} kept",
        region.id,
        inside.len(),
        kept.len()
    );

    region
        .assigned_keypoints
        .extend(kept.iter().map(|m| keypoints_curr[m.current_idx]));
    region.assigned_correspondences.extend(kept);
}

/// Drops correspondences whose current keypoint lies inside the bounds of
/// more than one region, so each one can reach at most one region.
pub fn drop_ambiguous_correspondences(
    regions: &[DetectionRegion],
    keypoints_curr: &[Keypoint],
    correspondences: &[Correspondence],
) -> Vec<Correspondence> {
    correspondences
        .iter()
        .filter(|m| {
            keypoints_curr.get(m.current_idx).is_none_or(|kp| {
                regions.iter().filter(|r| r.bounds.contains(kp.pt)).nth(1).is_none()
            })
        })
        .copied()
        .collect()
}

/// Removes correspondences whose matching cost is below
/// `outlier_ratio` times the group's mean cost. Empty input stays empty.
pub fn filter_low_distance(
    correspondences: &[Correspondence],
    outlier_ratio: f64,
) -> Vec<Correspondence> {
    let Some(mean_distance) = mean(correspondences.iter().map(|m| m.distance)) else {
        return Vec::new();
    };
    let threshold = outlier_ratio * mean_distance;
    correspondences
        .iter()
        .filter(|m| m.distance >= threshold)
        .copied()
        .collect()
}
