use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use lidar_camera_ttc::FusionError;
use lidar_camera_ttc::calibration::{Calibration, CalibrationConfig};
use lidar_camera_ttc::config::FusionConfig;
use lidar_camera_ttc::data_loader::load_sequence;
use lidar_camera_ttc::io::{object_from_json, write_report};
use lidar_camera_ttc::pipeline::FusionPipeline;

#[derive(Parser)]
#[command(version, about, author)]
struct TtcCli {
    /// folder with one json file per frame
    path: PathBuf,

    /// fusion config json, defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// calibration json with p_rect, r_rect, rt
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// report output path
    #[arg(short, long, default_value = "ttc_report.json")]
    output: PathBuf,
}

fn main() -> Result<(), FusionError> {
    env_logger::init();
    let cli = TtcCli::parse();

    let config: FusionConfig = match &cli.config {
        Some(p) => object_from_json(p)?,
        None => FusionConfig::default(),
    };
    let calibration_config: CalibrationConfig = match &cli.calibration {
        Some(p) => object_from_json(p)?,
        None => CalibrationConfig::default(),
    };
    let pipeline = FusionPipeline::new(config, Calibration::from_config(&calibration_config)?)?;

    let now = Instant::now();
    let frames = load_sequence(&cli.path)?;
    log::info!("loaded {} frames in {:.3} sec", frames.len(), now.elapsed().as_secs_f64());

    let now = Instant::now();
    let results = pipeline.process_sequence(&frames)?;
    let duration_sec = now.elapsed().as_secs_f64();
    log::info!(
        "processed {} frame pairs in {:.6} sec",
        results.len(),
        duration_sec
    );

    write_report(&cli.output, &pipeline.config, &results)?;
    log::info!("report written to {}", cli.output.display());
    Ok(())
}
