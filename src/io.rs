use std::io::Write;
use std::path::Path;

use serde::{Serialize, Serializer, de::DeserializeOwned};

use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::pipeline::{PairResult, TtcEstimate};
use crate::types::DetectionRegion;

/// Writes a TTC as a number, or as `"inf"`, `"-inf"` or `"nan"` when it is not
/// finite. JSON has no non-finite numbers and `null` would merge "not
/// approaching" with "no estimate".
pub fn serialize_ttc<S: Serializer>(ttc: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if ttc.is_finite() {
        serializer.serialize_f64(*ttc)
    } else if ttc.is_nan() {
        serializer.serialize_str("nan")
    } else if ttc.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: impl AsRef<Path>, object: &T) -> Result<(), FusionError> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T, FusionError> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Top-view extent of the lidar points attached to one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub id: i32,
    pub class_label: i32,
    pub point_count: usize,
    /// Closest forward distance in meters, `None` without points.
    pub x_min: Option<f64>,
    /// Lateral extent in meters.
    pub y_width: Option<f64>,
}

impl RegionSummary {
    pub fn from_region(region: &DetectionRegion) -> RegionSummary {
        let pts = &region.assigned_points;
        let x_min = pts.iter().map(|p| p.x).min_by(|a, b| a.total_cmp(b));
        let y_min = pts.iter().map(|p| p.y).min_by(|a, b| a.total_cmp(b));
        let y_max = pts.iter().map(|p| p.y).max_by(|a, b| a.total_cmp(b));
        RegionSummary {
            id: region.id,
            class_label: region.class_label,
            point_count: pts.len(),
            x_min,
            y_width: y_min.zip(y_max).map(|(lo, hi)| hi - lo),
        }
    }
}

#[derive(Serialize)]
struct PairReport<'a> {
    frame_index: usize,
    matches: Vec<(i32, i32)>,
    estimates: &'a [TtcEstimate],
    regions: Vec<RegionSummary>,
}

#[derive(Serialize)]
struct TtcReport<'a> {
    timestamp: String,
    config: &'a FusionConfig,
    pairs: Vec<PairReport<'a>>,
}

fn report_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Writes all pair results as one JSON report. Non-finite TTCs are written
/// as strings, see [`serialize_ttc`].
pub fn write_report(
    output_path: impl AsRef<Path>,
    config: &FusionConfig,
    results: &[PairResult],
) -> Result<(), FusionError> {
    let pairs = results
        .iter()
        .map(|r| PairReport {
            frame_index: r.frame_index,
            matches: r.matches.iter().map(|(p, c)| (*p, *c)).collect(),
            estimates: &r.estimates,
            regions: r.regions.iter().map(RegionSummary::from_region).collect(),
        })
        .collect();
    let report = TtcReport {
        timestamp: report_timestamp(),
        config,
        pairs,
    };
    object_to_json(output_path, &report)
}
