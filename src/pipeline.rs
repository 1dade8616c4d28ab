use std::collections::BTreeMap;

use indicatif::ParallelProgressIterator;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::association::{
    cluster_correspondences_with_roi, cluster_points_with_roi, drop_ambiguous_correspondences,
};
use crate::calibration::Calibration;
use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::matching::match_regions;
use crate::ttc::{compute_ttc_camera, compute_ttc_lidar};
use crate::types::{DataFrame, DetectionRegion, FramePair};

/// TTC of one object tracked from the previous into the current frame.
/// NaN marks a missing estimate; infinite or negative values mean the object
/// is not approaching.
#[derive(Debug, Clone, Serialize)]
pub struct TtcEstimate {
    pub previous_id: i32,
    pub current_id: i32,
    pub class_label: i32,
    pub points_prev: usize,
    pub points_curr: usize,
    pub correspondences: usize,
    #[serde(serialize_with = "crate::io::serialize_ttc")]
    pub ttc_lidar: f64,
    #[serde(serialize_with = "crate::io::serialize_ttc")]
    pub ttc_camera: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairResult {
    /// Index of the current frame within its sequence.
    pub frame_index: usize,
    pub matches: BTreeMap<i32, i32>,
    pub estimates: Vec<TtcEstimate>,
    pub regions: Vec<DetectionRegion>,
}

/// Assign-all-then-estimate-all driver over frame pairs.
pub struct FusionPipeline {
    pub config: FusionConfig,
    pub calibration: Calibration,
}

impl FusionPipeline {
    pub fn new(config: FusionConfig, calibration: Calibration) -> Result<FusionPipeline, FusionError> {
        config.validate()?;
        Ok(FusionPipeline {
            config,
            calibration,
        })
    }

    /// Copy of `frame` whose regions carry their lidar points.
    pub fn associate_frame(&self, frame: &DataFrame) -> DataFrame {
        let mut enriched = frame.clone();
        for region in enriched.regions.iter_mut() {
            region.assigned_points.clear();
        }
        let cropped;
        let points = match &self.config.crop {
            Some(crop) => {
                cropped = crop.crop(&frame.points);
                &cropped
            }
            None => &frame.points,
        };
        cluster_points_with_roi(
            &mut enriched.regions,
            points,
            self.config.shrink_factor,
            &self.calibration,
        );
        enriched
    }

    /// Estimates TTC for every matched region of a pair whose frames already
    /// went through [`FusionPipeline::associate_frame`].
    pub fn process_pair(
        &self,
        pair: FramePair<'_>,
        frame_index: usize,
    ) -> Result<PairResult, FusionError> {
        pair.validate()?;

        let unique = drop_ambiguous_correspondences(
            &pair.current.regions,
            &pair.current.keypoints,
            pair.correspondences(),
        );
        let mut regions = pair.current.regions.clone();
        for region in regions.iter_mut() {
            region.assigned_keypoints.clear();
            region.assigned_correspondences.clear();
            cluster_correspondences_with_roi(
                region,
                &pair.current.keypoints,
                &unique,
                self.config.outlier_ratio,
            );
        }

        let matches = match_regions(pair.correspondences(), pair.previous, pair.current);
        debug!("frame {}: {} region matches", frame_index, matches.len());

        let thresholds = self.config.ratio_thresholds();
        let estimates: Vec<TtcEstimate> = matches
            .par_iter()
            .filter_map(|(prev_id, curr_id)| {
                let prev = pair.previous.region(*prev_id)?;
                let curr = regions.iter().find(|r| r.id == *curr_id)?;
                let ttc_lidar = if prev.assigned_points.is_empty() || curr.assigned_points.is_empty() {
                    f64::NAN
                } else {
                    compute_ttc_lidar(
                        &prev.assigned_points,
                        &curr.assigned_points,
                        self.config.frame_rate,
                        self.config.lidar_reference,
                    )
                };
                let ttc_camera = compute_ttc_camera(
                    &pair.previous.keypoints,
                    &pair.current.keypoints,
                    &curr.assigned_correspondences,
                    self.config.frame_rate,
                    &thresholds,
                );
                Some(TtcEstimate {
                    previous_id: *prev_id,
                    current_id: *curr_id,
                    class_label: curr.class_label,
                    points_prev: prev.assigned_points.len(),
                    points_curr: curr.assigned_points.len(),
                    correspondences: curr.assigned_correspondences.len(),
                    ttc_lidar,
                    ttc_camera,
                })
            })
            .collect();

        Ok(PairResult {
            frame_index,
            matches,
            estimates,
            regions,
        })
    }

    /// Runs both phases over consecutive frames. The first frame only serves
    /// as the previous frame of the second.
    pub fn process_sequence(&self, frames: &[DataFrame]) -> Result<Vec<PairResult>, FusionError> {
        let associated: Vec<DataFrame> = frames
            .par_iter()
            .progress_count(frames.len() as u64)
            .map(|f| self.associate_frame(f))
            .collect();

        let results = associated
            .windows(2)
            .enumerate()
            .map(|(i, w)| self.process_pair(FramePair::new(&w[0], &w[1]), i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        for result in &results {
            for e in &result.estimates {
                info!(
                    "frame {} region {} -> {}: ttc lidar {:.3} s, camera {:.3} s",
                    result.frame_index, e.previous_id, e.current_id, e.ttc_lidar, e.ttc_camera
                );
            }
        }
        Ok(results)
    }
}
