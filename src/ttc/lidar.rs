use log::warn;

use crate::config::LidarReference;
use crate::types::SpatialPoint3D;
use crate::util::median;

/// Forward distance representing a point cloud.
pub fn reference_distance(points: &[SpatialPoint3D], reference: LidarReference) -> Option<f64> {
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    match reference {
        LidarReference::Median => median(&mut xs),
        LidarReference::Nearest => xs.into_iter().min_by(|a, b| a.total_cmp(b)),
    }
}

/// Time-to-collision from the change of forward distance between frames,
/// assuming a constant closing velocity.
///
/// Positive only when the object closes in. A receding or static object
/// gives a negative or infinite value. Either set being empty gives NaN.
pub fn compute_ttc_lidar(
    points_prev: &[SpatialPoint3D],
    points_curr: &[SpatialPoint3D],
    frame_rate: f64,
    reference: LidarReference,
) -> f64 {
    let (Some(prev_x), Some(curr_x)) = (
        reference_distance(points_prev, reference),
        reference_distance(points_curr, reference),
    ) else {
        warn!(
            "lidar ttc needs points in both frames ({} previous, {} current)",
            points_prev.len(),
            points_curr.len()
        );
        return f64::NAN;
    };
    ttc_from_distances(prev_x, curr_x, frame_rate)
}

pub fn ttc_from_distances(prev_x: f64, curr_x: f64, frame_rate: f64) -> f64 {
    let dt = 1.0 / frame_rate;
    dt * curr_x / (prev_x - curr_x)
}
