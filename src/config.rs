use serde::{Deserialize, Serialize};

use crate::error::FusionError;
use crate::ttc::RatioThresholds;
use crate::types::SpatialPoint3D;

/// Which forward distance of a region's point cloud drives the lidar TTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LidarReference {
    #[default]
    Median,
    /// Closest return only. Sensitive to stray reflections.
    Nearest,
}

/// Box around the ego lane applied to raw lidar returns before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    pub min_x: f64,
    pub max_x: f64,
    pub max_abs_y: f64,
    pub min_z: f64,
    pub max_z: f64,
    pub min_reflectivity: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            min_x: 2.0,
            max_x: 20.0,
            max_abs_y: 2.0,
            min_z: -1.5,
            max_z: -0.9,
            min_reflectivity: 0.1,
        }
    }
}

impl CropConfig {
    pub fn keeps(&self, p: &SpatialPoint3D) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.y.abs() <= self.max_abs_y
            && p.z >= self.min_z
            && p.z <= self.max_z
            && p.r >= self.min_reflectivity
    }

    pub fn crop(&self, points: &[SpatialPoint3D]) -> Vec<SpatialPoint3D> {
        points.iter().filter(|p| self.keeps(p)).copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Frames per second; `dT = 1 / frame_rate`.
    pub frame_rate: f64,
    /// Fraction of a region's width/height removed before lidar clustering.
    pub shrink_factor: f64,
    /// Correspondences with `distance < outlier_ratio * mean` are dropped.
    pub outlier_ratio: f64,
    /// Minimum current-frame keypoint distance (pixels) for a camera ratio.
    pub min_pixel_distance: f64,
    /// Previous-frame keypoint distances at or below this are skipped.
    pub ratio_epsilon: f64,
    pub lidar_reference: LidarReference,
    pub crop: Option<CropConfig>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            shrink_factor: 0.10,
            outlier_ratio: 0.7,
            min_pixel_distance: 100.0,
            ratio_epsilon: f64::EPSILON,
            lidar_reference: LidarReference::Median,
            crop: None,
        }
    }
}

impl FusionConfig {
    pub fn delta_t(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn ratio_thresholds(&self) -> RatioThresholds {
        RatioThresholds {
            epsilon: self.ratio_epsilon,
            min_pixel_distance: self.min_pixel_distance,
        }
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        if !(self.frame_rate > 0.0) || !self.frame_rate.is_finite() {
            return Err(FusionError::InvalidConfig(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(0.0..1.0).contains(&self.shrink_factor) {
            return Err(FusionError::InvalidConfig(format!(
                "shrink_factor must be in [0, 1), got {}",
                self.shrink_factor
            )));
        }
        if !(self.outlier_ratio > 0.0) {
            return Err(FusionError::InvalidConfig(format!(
                "outlier_ratio must be positive, got {}",
                self.outlier_ratio
            )));
        }
        if !(self.min_pixel_distance >= 0.0) || !(self.ratio_epsilon >= 0.0) {
            return Err(FusionError::InvalidConfig(
                "camera distance thresholds must not be negative".to_string(),
            ));
        }
        if let Some(crop) = &self.crop {
            if crop.min_x > crop.max_x || crop.min_z > crop.max_z || crop.max_abs_y < 0.0 {
                return Err(FusionError::InvalidConfig(format!(
                    "crop box is empty: {:?}",
                    crop
                )));
            }
        }
        Ok(())
    }
}
