use crate::report::{BatchReport, FailReason, JobOutcome, JobRecord, SkipReason};
use fpsample_io::{read_points, write_points, FileError};
use fpsample_sampling::{select, FpsConfig, SelectError};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    /// The input directory itself cannot be read. The one fatal condition;
    /// everything below it is isolated per file.
    #[error("cannot read dataset directory {path}: {source}")]
    DirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub fps: FpsConfig,
    /// Process files on the rayon pool instead of one at a time. Each file
    /// is an independent unit of work; records come back in enumeration
    /// order either way.
    pub parallel_files: bool,
    /// Cooperative stop flag, checked between files. Files not yet started
    /// when it flips are left untouched.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Downsample every `.npy` file directly inside `dir` to `target` points,
/// overwriting each file in place.
///
/// Per-file errors (malformed content, undersized clouds, non-finite
/// coordinates, write failures) become that file's [`JobOutcome`]; the rest
/// of the batch always runs. Nothing is retried.
pub fn run_batch(
    dir: impl AsRef<Path>,
    target: usize,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    let dir = dir.as_ref();
    let files = enumerate_npy(dir)?;
    info!(
        "found {} .npy files in {}, downsampling to {} points",
        files.len(),
        dir.display(),
        target
    );

    let cancelled = || {
        options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    };

    let mut report = BatchReport::default();

    if options.parallel_files {
        report.records = files
            .into_par_iter()
            .filter_map(|path| {
                if cancelled() {
                    return None;
                }
                Some(process_file(&path, target, &options.fps))
            })
            .collect();
        report.cancelled = cancelled();
    } else {
        for path in files {
            if cancelled() {
                report.cancelled = true;
                break;
            }
            report.records.push(process_file(&path, target, &options.fps));
        }
    }

    info!(
        "batch complete: {} sampled, {} skipped, {} failed of {} files ({:.4} s/file avg, {:.2} s total)",
        report.sampled(),
        report.skipped(),
        report.failed(),
        report.seen(),
        report.mean_elapsed().as_secs_f64(),
        report.total_elapsed().as_secs_f64(),
    );

    Ok(report)
}

/// All `.npy` files directly inside `dir`, sorted by name so batch output
/// order does not depend on directory enumeration order.
fn enumerate_npy(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = std::fs::read_dir(dir).map_err(|source| BatchError::DirUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "npy"))
        .collect();
    files.sort();

    Ok(files)
}

fn process_file(path: &Path, target: usize, fps: &FpsConfig) -> JobRecord {
    let started = Instant::now();
    let outcome = sample_file(path, target, fps);
    let elapsed = started.elapsed();

    match &outcome {
        JobOutcome::Sampled {
            points_in,
            points_out,
        } => debug!(
            "{}: {} -> {} points in {:.4} s",
            path.display(),
            points_in,
            points_out,
            elapsed.as_secs_f64()
        ),
        JobOutcome::Skipped(SkipReason::Empty) => {
            warn!("{}: empty cloud, skipping", path.display())
        }
        JobOutcome::Skipped(SkipReason::TooSmall { have, want }) => warn!(
            "{}: only {} points (need {}), skipping",
            path.display(),
            have,
            want
        ),
        JobOutcome::Failed(reason) => {
            error!("{}: {:?}", path.display(), reason)
        }
    }

    JobRecord {
        path: path.to_path_buf(),
        elapsed,
        outcome,
    }
}

fn sample_file(path: &Path, target: usize, fps: &FpsConfig) -> JobOutcome {
    let cloud = match read_points(path) {
        Ok(cloud) => cloud,
        Err(FileError::Io(e)) => return JobOutcome::Failed(FailReason::Io(e.to_string())),
        Err(e) => return JobOutcome::Failed(FailReason::Corrupt(e.to_string())),
    };

    let indices = match select(&cloud, target, fps) {
        Ok(indices) => indices,
        Err(SelectError::EmptyInput) => return JobOutcome::Skipped(SkipReason::Empty),
        Err(SelectError::InsufficientPoints { have, want }) => {
            return JobOutcome::Skipped(SkipReason::TooSmall { have, want })
        }
        Err(SelectError::NonFiniteCoordinate { index }) => {
            return JobOutcome::Failed(FailReason::NonFinite { index })
        }
    };

    let sampled = cloud.select(&indices);
    match write_points(path, &sampled) {
        Ok(()) => JobOutcome::Sampled {
            points_in: cloud.len(),
            points_out: sampled.len(),
        },
        Err(e) => JobOutcome::Failed(FailReason::Io(e.to_string())),
    }
}
