use lidar_camera_ttc::FusionError;
use lidar_camera_ttc::calibration::Calibration;
use lidar_camera_ttc::config::{CropConfig, FusionConfig};
use lidar_camera_ttc::pipeline::FusionPipeline;
use lidar_camera_ttc::types::{
    Correspondence, DataFrame, DetectionRegion, FramePair, Keypoint, RegionBounds, SpatialPoint3D,
};
use nalgebra as na;

/// pixel = (y, z)
fn planar_calibration() -> Calibration {
    Calibration {
        projection: na::Matrix3x4::new(
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ),
    }
}

const CORNERS: [(f32, f32); 4] = [(100.0, 100.0), (400.0, 100.0), (100.0, 400.0), (400.0, 400.0)];

/// One vehicle filling a 1000x1000 box, seen at forward distances `xs`, with
/// its corner keypoints scaled by `scale` about (250, 250).
fn vehicle_frame(region_id: i32, xs: &[f64], scale: f32, with_matches: bool) -> DataFrame {
    let points = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| SpatialPoint3D::new(x, 200.0 + 50.0 * i as f64, 500.0))
        .collect();
    let keypoints = CORNERS
        .iter()
        .map(|&(x, y)| Keypoint::new(250.0 + scale * (x - 250.0), 250.0 + scale * (y - 250.0)))
        .collect();
    let matches = if with_matches {
        (0..CORNERS.len()).map(|i| Correspondence::new(i, i, 10.0)).collect()
    } else {
        Vec::new()
    };
    DataFrame {
        keypoints,
        regions: vec![DetectionRegion::new(
            region_id,
            2,
            0.95,
            RegionBounds::new(0.0, 0.0, 1000.0, 1000.0),
        )],
        points,
        matches,
    }
}

fn pipeline() -> FusionPipeline {
    FusionPipeline::new(FusionConfig::default(), planar_calibration()).unwrap()
}

#[test]
fn test_process_pair_estimates_both_ttcs() {
    let pipeline = pipeline();
    let prev = pipeline.associate_frame(&vehicle_frame(0, &[9.9, 10.0, 10.1], 1.0, false));
    let curr = pipeline.associate_frame(&vehicle_frame(3, &[9.4, 9.5, 9.6], 1.05, true));
    assert_eq!(prev.regions[0].assigned_points.len(), 3);

    let result = pipeline.process_pair(FramePair::new(&prev, &curr), 1).unwrap();
    assert_eq!(result.matches.get(&0), Some(&3));
    assert_eq!(result.estimates.len(), 1);

    let e = &result.estimates[0];
    assert_eq!((e.previous_id, e.current_id, e.class_label), (0, 3, 2));
    assert_eq!((e.points_prev, e.points_curr, e.correspondences), (3, 3, 4));
    assert!((e.ttc_lidar - 1.9).abs() < 1e-9, "lidar ttc = {}", e.ttc_lidar);
    assert!((e.ttc_camera - 2.0).abs() < 1e-3, "camera ttc = {}", e.ttc_camera);

    // the input frame is untouched, the result carries the enriched copy
    assert!(curr.regions[0].assigned_correspondences.is_empty());
    assert_eq!(result.regions[0].assigned_correspondences.len(), 4);
    assert_eq!(result.regions[0].assigned_keypoints.len(), 4);
}

#[test]
fn test_process_pair_without_points_reports_nan() {
    let pipeline = pipeline();
    let prev = pipeline.associate_frame(&vehicle_frame(0, &[], 1.0, false));
    let curr = pipeline.associate_frame(&vehicle_frame(0, &[9.5], 1.05, true));
    let result = pipeline.process_pair(FramePair::new(&prev, &curr), 1).unwrap();
    assert!(result.estimates[0].ttc_lidar.is_nan());
    assert!(result.estimates[0].ttc_camera.is_finite());
}

#[test]
fn test_process_pair_rejects_invalid_frames() {
    let pipeline = pipeline();
    let prev = vehicle_frame(0, &[10.0], 1.0, false);
    let mut curr = vehicle_frame(0, &[9.5], 1.05, true);
    curr.matches.push(Correspondence::new(42, 0, 1.0));
    let result = pipeline.process_pair(FramePair::new(&prev, &curr), 1);
    assert!(matches!(result, Err(FusionError::InvalidFrame(_))));
}

#[test]
fn test_process_sequence() {
    let pipeline = pipeline();
    let frames = vec![
        vehicle_frame(0, &[10.0], 1.0, false),
        vehicle_frame(1, &[9.5], 1.05, true),
        vehicle_frame(2, &[9.0], 1.05 * 1.05, true),
    ];
    let results = pipeline.process_sequence(&frames).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].frame_index, 1);
    assert_eq!(results[1].frame_index, 2);
    assert_eq!(results[1].matches.get(&1), Some(&2));
    // 0.1 * 9.0 / 0.5
    assert!((results[1].estimates[0].ttc_lidar - 1.8).abs() < 1e-9);

    assert!(pipeline.process_sequence(&frames[..1]).unwrap().is_empty());
}

#[test]
fn test_crop_removes_points_before_clustering() {
    let config = FusionConfig {
        crop: Some(CropConfig {
            min_x: 9.45,
            max_x: 20.0,
            max_abs_y: 1000.0,
            min_z: 0.0,
            max_z: 1000.0,
            min_reflectivity: 0.0,
        }),
        ..Default::default()
    };
    let pipeline = FusionPipeline::new(config, planar_calibration()).unwrap();
    let frame = pipeline.associate_frame(&vehicle_frame(0, &[9.4, 9.5, 9.6], 1.0, false));
    assert_eq!(frame.regions[0].assigned_points.len(), 2);
}

#[test]
fn test_pipeline_rejects_invalid_config() {
    let bad = [
        FusionConfig {
            frame_rate: 0.0,
            ..Default::default()
        },
        FusionConfig {
            shrink_factor: 1.0,
            ..Default::default()
        },
        FusionConfig {
            outlier_ratio: -0.5,
            ..Default::default()
        },
        FusionConfig {
            min_pixel_distance: f64::NAN,
            ..Default::default()
        },
        FusionConfig {
            ratio_epsilon: f64::NAN,
            ..Default::default()
        },
        FusionConfig {
            crop: Some(CropConfig {
                min_x: 5.0,
                max_x: 1.0,
                ..Default::default()
            }),
            ..Default::default()
        },
    ];
    for config in bad {
        let result = FusionPipeline::new(config, planar_calibration());
        assert!(matches!(result, Err(FusionError::InvalidConfig(_))));
    }
}

#[test]
fn test_process_pair_overlapping_regions_keep_correspondences_apart() {
    let region_pair = || {
        vec![
            DetectionRegion::new(1, 2, 0.9, RegionBounds::new(0.0, 0.0, 100.0, 100.0)),
            DetectionRegion::new(2, 2, 0.9, RegionBounds::new(50.0, 0.0, 100.0, 100.0)),
        ]
    };
    let keypoints: Vec<Keypoint> = [(20.0, 50.0), (60.0, 50.0), (120.0, 50.0)]
        .iter()
        .map(|&(x, y)| Keypoint::new(x, y))
        .collect();
    let prev = DataFrame {
        keypoints: keypoints.clone(),
        regions: region_pair(),
        ..Default::default()
    };
    let curr = DataFrame {
        keypoints,
        regions: region_pair(),
        matches: (0..3).map(|i| Correspondence::new(i, i, 10.0)).collect(),
        ..Default::default()
    };

    let result = pipeline().process_pair(FramePair::new(&prev, &curr), 1).unwrap();
    let assigned: Vec<Vec<usize>> = result
        .regions
        .iter()
        .map(|r| r.assigned_correspondences.iter().map(|m| m.current_idx).collect())
        .collect();
    assert_eq!(assigned, vec![vec![0], vec![2]]);
}
