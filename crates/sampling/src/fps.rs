use crate::device::Device;
use crate::distance::{arg_max, dist_sq, update_min_dists};
use fpsample_core::PointCloud;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("point cloud is empty")]
    EmptyInput,

    #[error("point cloud has {have} points, need at least {want}")]
    InsufficientPoints { have: usize, want: usize },

    #[error("non-finite coordinate at point {index}")]
    NonFiniteCoordinate { index: usize },
}

/// How the first point of the selection is chosen.
///
/// Every policy is deterministic: `Random` takes an explicit seed, so the
/// same seed reproduces the same selection run after run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Index 0, the first point in input order. The stable default.
    #[default]
    FirstIndex,
    /// The point farthest from the cloud centroid (lowest index on ties).
    FarthestFromCentroid,
    /// A uniformly drawn point from a seeded generator.
    Random(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpsConfig {
    pub seed: SeedPolicy,
    pub device: Device,
}

/// Greedy farthest point sampling: select `k` indices into `cloud` that
/// maximize the minimum pairwise distance of the chosen subset.
///
/// Returns the indices in selection order: element 0 is the seed pick, each
/// later element is the point farthest from everything chosen before it,
/// with exact ties resolved toward the lowest index. The result contains no
/// duplicate index, even when the cloud itself contains duplicate points.
///
/// `k == cloud.len()` short-circuits to `[0, n)` in input order without
/// running the greedy loop, so re-sampling an already-downsampled cloud is a
/// true no-op. `k == 0` returns an empty selection.
pub fn select(cloud: &PointCloud, k: usize, config: &FpsConfig) -> Result<Vec<usize>, SelectError> {
    let n = cloud.len();
    if n == 0 {
        return Err(SelectError::EmptyInput);
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    if n < k {
        return Err(SelectError::InsufficientPoints { have: n, want: k });
    }
    if let Some(index) = cloud.first_non_finite() {
        return Err(SelectError::NonFiniteCoordinate { index });
    }
    if k == n {
        return Ok((0..n).collect());
    }

    // Contiguous copy for cache-friendly kernel passes.
    let points: Vec<[f32; 3]> = cloud.iter_points().collect();

    let first = seed_index(cloud, &points, config);

    // table[i] holds the squared distance from point i to the nearest
    // selected point. Selected entries are pinned to -inf so the arg-max
    // can never revisit them, which keeps the k indices distinct even for
    // clouds of coincident points.
    let mut table = vec![f32::INFINITY; n];
    let mut picked = Vec::with_capacity(k);

    table[first] = f32::NEG_INFINITY;
    picked.push(first);
    let mut latest = first;

    for _ in 1..k {
        update_min_dists(&mut table, &points, points[latest], config.device);
        latest = arg_max(&table, config.device);
        table[latest] = f32::NEG_INFINITY;
        picked.push(latest);
    }

    Ok(picked)
}

fn seed_index(cloud: &PointCloud, points: &[[f32; 3]], config: &FpsConfig) -> usize {
    match config.seed {
        SeedPolicy::FirstIndex => 0,
        SeedPolicy::FarthestFromCentroid => {
            let centroid = cloud.centroid();
            let dists: Vec<f32> = points.iter().map(|p| dist_sq(*p, centroid)).collect();
            arg_max(&dists, config.device)
        }
        SeedPolicy::Random(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            rng.gen_range(0..cloud.len())
        }
    }
}
