//! Adversarial edge-case integration tests.
//!
//! Degenerate, boundary, and pathological inputs pushed through the full
//! stack to verify no panics, no index duplication, and consistent error
//! classification.

use fpsample_batch::{run_batch, BatchOptions, FailReason, JobOutcome};
use fpsample_core::PointCloud;
use fpsample_io::{read_cloud_stack, read_pcd, read_points, write_pcd, write_points, PcdFormat};
use fpsample_sampling::{select, Device, FpsConfig, SeedPolicy, SelectError};
use ndarray::Array3;
use ndarray_npy::WriteNpyExt;
use tempfile::TempDir;

// ────────────────── selector ──────────────────

#[test]
fn all_points_coincident_still_selects_distinct_indices() {
    let cloud = PointCloud::from_xyz(vec![7.0; 100], vec![7.0; 100], vec![7.0; 100]);

    for device in [Device::Sequential, Device::Parallel] {
        let cfg = FpsConfig {
            seed: SeedPolicy::FirstIndex,
            device,
        };
        let picked = select(&cloud, 10, &cfg).unwrap();
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10, "device {device:?} picked {picked:?}");
    }
}

#[test]
fn symmetric_square_breaks_ties_toward_lowest_index() {
    // Four corners of a square: after the corner at index 0 is taken, the
    // opposite corner (index 3) is farthest; the two remaining corners tie
    // exactly and index 1 must win.
    let cloud = PointCloud::from_xyz(
        vec![0.0, 1.0, 0.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.0; 4],
    );

    for device in [Device::Sequential, Device::Parallel] {
        let cfg = FpsConfig {
            seed: SeedPolicy::FirstIndex,
            device,
        };
        let picked = select(&cloud, 3, &cfg).unwrap();
        assert_eq!(picked, vec![0, 3, 1], "device {device:?}");
    }
}

#[test]
fn huge_coordinates_do_not_produce_nan_selections() {
    let cloud = PointCloud::from_xyz(
        vec![1e30, -1e30, 0.0, 1e30],
        vec![1e30, 1e30, 0.0, -1e30],
        vec![0.0; 4],
    );
    // Squared distances overflow f32 to +inf; selection must still finish
    // with distinct indices.
    let picked = select(&cloud, 3, &FpsConfig::default()).unwrap();
    let mut sorted = picked.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 3);
}

#[test]
fn two_points_k_two_is_identity() {
    let cloud = PointCloud::from_xyz(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2]);
    assert_eq!(select(&cloud, 2, &FpsConfig::default()).unwrap(), vec![0, 1]);
}

#[test]
fn single_point_cloud_k_one() {
    let cloud = PointCloud::from_xyz(vec![42.0], vec![-1.0], vec![0.5]);
    assert_eq!(select(&cloud, 1, &FpsConfig::default()).unwrap(), vec![0]);
}

#[test]
fn every_seed_policy_yields_distinct_indices() {
    let cloud = PointCloud::from_xyz(
        (0..30).map(|i| i as f32).collect(),
        (0..30).map(|i| (i * i % 11) as f32).collect(),
        vec![0.0; 30],
    );

    for policy in [
        SeedPolicy::FirstIndex,
        SeedPolicy::FarthestFromCentroid,
        SeedPolicy::Random(7),
    ] {
        let cfg = FpsConfig {
            seed: policy,
            device: Device::Sequential,
        };
        let picked = select(&cloud, 8, &cfg).unwrap();
        assert_eq!(picked.len(), 8);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 8, "policy {policy:?} picked duplicates");
    }
}

// ────────────────── batch over hostile files ──────────────────

#[test]
fn wrong_width_array_is_classified_corrupt() {
    let dir = TempDir::new().unwrap();
    let arr = ndarray::Array2::<f32>::zeros((10, 4));
    arr.write_npy(std::fs::File::create(dir.path().join("wide.npy")).unwrap())
        .unwrap();

    let report = run_batch(dir.path(), 5, &BatchOptions::default()).unwrap();
    assert!(matches!(
        report.records[0].outcome,
        JobOutcome::Failed(FailReason::Corrupt(_))
    ));
}

#[test]
fn three_dimensional_array_is_rejected_by_batch() {
    let dir = TempDir::new().unwrap();
    let arr = Array3::<f32>::zeros((2, 10, 3));
    arr.write_npy(std::fs::File::create(dir.path().join("stack.npy")).unwrap())
        .unwrap();

    let report = run_batch(dir.path(), 5, &BatchOptions::default()).unwrap();
    assert!(matches!(
        report.records[0].outcome,
        JobOutcome::Failed(FailReason::Corrupt(_))
    ));
}

#[test]
fn f64_file_is_narrowed_and_sampled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("double.npy");

    let mut arr = ndarray::Array2::<f64>::zeros((30, 3));
    for i in 0..30 {
        arr[[i, 0]] = i as f64;
        arr[[i, 1]] = (i % 4) as f64;
    }
    arr.write_npy(std::fs::File::create(&path).unwrap()).unwrap();

    let report = run_batch(dir.path(), 6, &BatchOptions::default()).unwrap();
    assert_eq!(report.sampled(), 1);
    assert_eq!(read_points(&path).unwrap().len(), 6);
}

#[test]
fn target_larger_than_every_file_skips_everything() {
    let dir = TempDir::new().unwrap();
    for f in 0..3 {
        let cloud = PointCloud::from_xyz(vec![0.0; 20], vec![0.0; 20], vec![0.0; 20]);
        write_points(dir.path().join(format!("c{f}.npy")), &cloud).unwrap();
    }

    let report = run_batch(dir.path(), 1000, &BatchOptions::default()).unwrap();
    assert_eq!(report.seen(), 3);
    assert_eq!(report.skipped(), 3);
    assert_eq!(report.sampled(), 0);
}

// ────────────────── visualization export ──────────────────

#[test]
fn stack_file_converts_to_one_pcd_per_sample() {
    let dir = TempDir::new().unwrap();
    let npy = dir.path().join("stack.npy");

    let mut arr = Array3::<f32>::zeros((3, 5, 3));
    for s in 0..3 {
        for i in 0..5 {
            arr[[s, i, 0]] = (s * 100 + i) as f32;
            arr[[s, i, 2]] = 1.0;
        }
    }
    arr.write_npy(std::fs::File::create(&npy).unwrap()).unwrap();

    let clouds = read_cloud_stack(&npy).unwrap();
    assert_eq!(clouds.len(), 3);

    for (i, cloud) in clouds.iter().enumerate() {
        let pcd = dir.path().join(format!("cloud_{i}.pcd"));
        write_pcd(&pcd, cloud, PcdFormat::Binary).unwrap();
        assert_eq!(&read_pcd(&pcd).unwrap(), cloud);
    }
}

#[test]
fn sampled_output_survives_pcd_export() {
    let cloud = PointCloud::from_xyz(
        (0..50).map(|i| i as f32 * 0.5).collect(),
        (0..50).map(|i| (i % 9) as f32).collect(),
        (0..50).map(|i| (i % 4) as f32 * 2.0).collect(),
    );
    let picked = select(&cloud, 12, &FpsConfig::default()).unwrap();
    let sampled = cloud.select(&picked);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sampled.pcd");
    write_pcd(&path, &sampled, PcdFormat::Ascii).unwrap();
    assert_eq!(read_pcd(&path).unwrap(), sampled);
}

// ────────────────── selector error surface ──────────────────

#[test]
fn error_classification_is_stable() {
    let empty = PointCloud::new();
    assert_eq!(
        select(&empty, 1, &FpsConfig::default()).unwrap_err(),
        SelectError::EmptyInput
    );

    let two = PointCloud::from_xyz(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2]);
    assert_eq!(
        select(&two, 5, &FpsConfig::default()).unwrap_err(),
        SelectError::InsufficientPoints { have: 2, want: 5 }
    );

    let bad = PointCloud::from_xyz(vec![0.0, f32::NEG_INFINITY], vec![0.0; 2], vec![0.0; 2]);
    assert_eq!(
        select(&bad, 2, &FpsConfig::default()).unwrap_err(),
        SelectError::NonFiniteCoordinate { index: 1 }
    );
}
