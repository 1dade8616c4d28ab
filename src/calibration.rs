use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::FusionError;
use crate::types::SpatialPoint3D;

/// Row-major matrices as delivered by the calibration files.
///
/// `r_rect` may be 3x3 or 4x4, `rt` may be 3x4 or 4x4; the smaller forms are
/// padded to homogeneous 4x4 matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub p_rect: Vec<f64>,
    pub r_rect: Vec<f64>,
    pub rt: Vec<f64>,
}

impl Default for CalibrationConfig {
    /// KITTI camera 02 / velodyne calibration of the 2011-09-26 drives.
    fn default() -> Self {
        Self {
            p_rect: vec![
                7.215377e+02, 0.000000e+00, 6.095593e+02, 4.485728e+01, 0.000000e+00,
                7.215377e+02, 1.728540e+02, 2.163791e-01, 0.000000e+00, 0.000000e+00,
                1.000000e+00, 2.745884e-03,
            ],
            r_rect: vec![
                9.999239e-01, 9.837760e-03, -7.445048e-03, -9.869795e-03, 9.999421e-01,
                -4.278459e-03, 7.402527e-03, 4.351614e-03, 9.999631e-01,
            ],
            rt: vec![
                7.533745e-03, -9.999714e-01, -6.166020e-04, -4.069766e-03, 1.480249e-02,
                7.280733e-04, -9.998902e-01, -7.631618e-02, 9.998621e-01, 7.523790e-03,
                1.480755e-02, -2.717806e-01,
            ],
        }
    }
}

fn homogeneous4(values: &[f64], name: &str) -> Result<na::Matrix4<f64>, FusionError> {
    match values.len() {
        16 => Ok(na::Matrix4::from_row_slice(values)),
        12 => {
            let mut m = na::Matrix4::identity();
            m.fixed_view_mut::<3, 4>(0, 0)
                .copy_from(&na::Matrix3x4::from_row_slice(values));
            Ok(m)
        }
        9 => {
            let mut m = na::Matrix4::identity();
            m.fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&na::Matrix3::from_row_slice(values));
            Ok(m)
        }
        n => Err(FusionError::InvalidConfig(format!(
            "{} needs 9, 12 or 16 values, got {}",
            name, n
        ))),
    }
}

/// Composed `P_rect * R_rect * RT` mapping ego-frame points to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub projection: na::Matrix3x4<f64>,
}

impl Calibration {
    pub fn new(
        p_rect: &na::Matrix3x4<f64>,
        r_rect: &na::Matrix4<f64>,
        rt: &na::Matrix4<f64>,
    ) -> Calibration {
        Calibration {
            projection: p_rect * r_rect * rt,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Result<Calibration, FusionError> {
        if config.p_rect.len() != 12 {
            return Err(FusionError::InvalidConfig(format!(
                "p_rect needs 12 values, got {}",
                config.p_rect.len()
            )));
        }
        let p_rect = na::Matrix3x4::from_row_slice(&config.p_rect);
        let r_rect = homogeneous4(&config.r_rect, "r_rect")?;
        let rt = homogeneous4(&config.rt, "rt")?;
        Ok(Calibration::new(&p_rect, &r_rect, &rt))
    }

    /// Pixel location of `p`, or `None` when it lies on or behind the image plane.
    pub fn project(&self, p: &SpatialPoint3D) -> Option<(f64, f64)> {
        let y = self.projection * na::Vector4::new(p.x, p.y, p.z, 1.0);
        if y[2] <= 0.0 {
            return None;
        }
        Some((y[0] / y[2], y[1] / y[2]))
    }
}
