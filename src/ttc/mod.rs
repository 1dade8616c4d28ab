pub mod camera;
pub mod lidar;

pub use camera::*;
pub use lidar::*;
