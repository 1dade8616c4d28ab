pub mod association;
pub mod calibration;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod io;
pub mod matching;
pub mod pipeline;
pub mod ttc;
pub mod types;
pub mod util;

pub use error::FusionError;
