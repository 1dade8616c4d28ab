use log::trace;

use crate::calibration::Calibration;
use crate::types::{DetectionRegion, SpatialPoint3D};

/// Assigns every lidar point to the one region whose shrunk bounds contain
/// its projection.
///
/// Points enclosed by several shrunk regions, by none, or projecting behind
/// the camera are dropped. Returns the number of assigned points.
pub fn cluster_points_with_roi(
    regions: &mut [DetectionRegion],
    points: &[SpatialPoint3D],
    shrink_factor: f64,
    calibration: &Calibration,
) -> usize {
    let shrunk: Vec<_> = regions.iter().map(|r| r.bounds.shrink(shrink_factor)).collect();
    let mut assigned = 0;
    for point in points {
        let Some((px, py)) = calibration.project(point) else {
            continue;
        };
        let mut enclosing = shrunk
            .iter()
            .enumerate()
            .filter(|(_, b)| b.contains_xy(px, py))
            .map(|(i, _)| i);
        match (enclosing.next(), enclosing.next()) {
            (Some(idx), None) => {
                regions[idx].assigned_points.push(*point);
                assigned += 1;
            }
            (Some(_), Some(_)) => trace!("point ({:.2}, {:.2}) is ambiguous", px, py),
            _ => {}
        }
    }
    trace!("assigned {} of {} lidar points", assigned, points.len());
    assigned
}
