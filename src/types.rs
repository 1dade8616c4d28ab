use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::FusionError;

fn default_reflectivity() -> f64 {
    1.0
}

/// Range return in the ego frame. `x` points forward, `y` left, `z` up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "default_reflectivity")]
    pub r: f64,
}

impl SpatialPoint3D {
    pub fn new(x: f64, y: f64, z: f64) -> SpatialPoint3D {
        SpatialPoint3D { x, y, z, r: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub pt: Vec2,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub response: f32,
    #[serde(default)]
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Keypoint {
        Keypoint {
            pt: Vec2::new(x, y),
            size: 0.0,
            angle: 0.0,
            response: 0.0,
            octave: 0,
        }
    }
}

/// Keypoint match between two consecutive frames.
///
/// `previous_idx` indexes the previous frame's keypoints, `current_idx` the
/// current frame's. Lower `distance` means a more confident match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub previous_idx: usize,
    pub current_idx: usize,
    pub distance: f64,
}

impl Correspondence {
    pub fn new(previous_idx: usize, current_idx: usize, distance: f64) -> Correspondence {
        Correspondence {
            previous_idx,
            current_idx,
            distance,
        }
    }
}

/// Axis-aligned pixel rectangle with half-open containment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> RegionBounds {
        RegionBounds {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains_xy(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.contains_xy(p.x as f64, p.y as f64)
    }

    /// Removes `shrink_factor / 2` of the width and height from each side.
    pub fn shrink(&self, shrink_factor: f64) -> RegionBounds {
        RegionBounds {
            x: self.x + shrink_factor * self.width / 2.0,
            y: self.y + shrink_factor * self.height / 2.0,
            width: self.width * (1.0 - shrink_factor),
            height: self.height * (1.0 - shrink_factor),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// One detected object in one frame, enriched with the observations
/// attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRegion {
    pub id: i32,
    pub class_label: i32,
    pub confidence: f64,
    pub bounds: RegionBounds,
    #[serde(default)]
    pub assigned_points: Vec<SpatialPoint3D>,
    #[serde(default)]
    pub assigned_keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub assigned_correspondences: Vec<Correspondence>,
}

impl DetectionRegion {
    pub fn new(id: i32, class_label: i32, confidence: f64, bounds: RegionBounds) -> DetectionRegion {
        DetectionRegion {
            id,
            class_label,
            confidence,
            bounds,
            assigned_points: Vec::new(),
            assigned_keypoints: Vec::new(),
            assigned_correspondences: Vec::new(),
        }
    }
}

/// Everything the external collaborators deliver for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub regions: Vec<DetectionRegion>,
    #[serde(default)]
    pub points: Vec<SpatialPoint3D>,
    /// Correspondences from the previous frame's keypoints to this frame's.
    #[serde(default)]
    pub matches: Vec<Correspondence>,
}

impl DataFrame {
    pub fn region(&self, id: i32) -> Option<&DetectionRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn validate_regions(&self, side: &str) -> Result<(), FusionError> {
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.id) {
                return Err(FusionError::InvalidFrame(format!(
                    "duplicate region id {} in {} frame",
                    region.id, side
                )));
            }
            if !region.bounds.is_valid() {
                return Err(FusionError::InvalidFrame(format!(
                    "region {} in {} frame has non-positive bounds",
                    region.id, side
                )));
            }
        }
        Ok(())
    }
}

/// Two consecutive frames; the correspondences are the current frame's
/// `matches`.
#[derive(Debug, Clone, Copy)]
pub struct FramePair<'a> {
    pub previous: &'a DataFrame,
    pub current: &'a DataFrame,
}

impl<'a> FramePair<'a> {
    pub fn new(previous: &'a DataFrame, current: &'a DataFrame) -> FramePair<'a> {
        FramePair { previous, current }
    }

    pub fn correspondences(&self) -> &'a [Correspondence] {
        &self.current.matches
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        self.previous.validate_regions("previous")?;
        self.current.validate_regions("current")?;
        let n_prev = self.previous.keypoints.len();
        let n_curr = self.current.keypoints.len();
        for (i, m) in self.correspondences().iter().enumerate() {
            if m.previous_idx >= n_prev || m.current_idx >= n_curr {
                return Err(FusionError::InvalidFrame(format!(
                    "correspondence {} ({} -> {}) out of range ({} previous, {} current keypoints)",
                    i, m.previous_idx, m.current_idx, n_prev, n_curr
                )));
            }
        }
        Ok(())
    }
}
