use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use fpsample_batch::{run_batch, BatchOptions};
use fpsample_io::{describe, read_cloud_stack, write_pcd, PcdFormat};
use fpsample_sampling::{Device, FpsConfig, SeedPolicy};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// The dataset splits searched beneath the root directory.
const SPLITS: [&str; 3] = ["train", "test", "val"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Farthest point sampling for .npy point-cloud datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Downsample every .npy cloud under <ROOT>/{train,test,val} in place.
    Downsample {
        /// Dataset root containing the split subfolders.
        root: PathBuf,

        /// Number of points to keep per cloud.
        #[arg(short, long, default_value_t = 15_000)]
        target: usize,

        /// Execution path for the distance kernel.
        #[arg(long, value_enum, default_value = "parallel")]
        device: DeviceArg,

        /// How the first point of each selection is chosen.
        #[arg(long, value_enum, default_value = "first")]
        seed_policy: SeedPolicyArg,

        /// Seed for the random first-point policy.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Process files one at a time instead of on the thread pool.
        #[arg(long)]
        sequential_files: bool,

        /// Exit non-zero if more than this many files fail.
        #[arg(long)]
        max_failures: Option<usize>,
    },

    /// Convert a [N,3] or [S,N,3] .npy file to PCD files for visualization.
    Convert {
        /// Source .npy file.
        input: PathBuf,

        /// Directory to write the PCD files into (created if missing).
        out_dir: PathBuf,

        /// Output file name stem.
        #[arg(long, default_value = "point_cloud")]
        prefix: String,

        /// Write binary PCD instead of ASCII.
        #[arg(long)]
        binary: bool,
    },

    /// Print the shape and element type of .npy files.
    Info {
        /// Files to inspect.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DeviceArg {
    Sequential,
    Parallel,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SeedPolicyArg {
    /// Always start from index 0.
    First,
    /// Start from the point farthest from the centroid.
    Centroid,
    /// Start from a seeded random point.
    Random,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Downsample {
            root,
            target,
            device,
            seed_policy,
            seed,
            sequential_files,
            max_failures,
        } => {
            let fps = FpsConfig {
                seed: match seed_policy {
                    SeedPolicyArg::First => SeedPolicy::FirstIndex,
                    SeedPolicyArg::Centroid => SeedPolicy::FarthestFromCentroid,
                    SeedPolicyArg::Random => SeedPolicy::Random(seed),
                },
                device: match device {
                    DeviceArg::Sequential => Device::Sequential,
                    DeviceArg::Parallel => Device::Parallel,
                },
            };
            downsample(&root, target, fps, sequential_files, max_failures)
        }
        Command::Convert {
            input,
            out_dir,
            prefix,
            binary,
        } => convert(&input, &out_dir, &prefix, binary),
        Command::Info { files } => {
            for path in &files {
                let info = describe(path)
                    .with_context(|| format!("cannot inspect {}", path.display()))?;
                println!("{}: shape {:?}, dtype {}", path.display(), info.shape, info.dtype);
            }
            Ok(())
        }
    }
}

fn downsample(
    root: &Path,
    target: usize,
    fps: FpsConfig,
    sequential_files: bool,
    max_failures: Option<usize>,
) -> anyhow::Result<()> {
    if !root.is_dir() {
        bail!("dataset root {} does not exist", root.display());
    }

    let options = BatchOptions {
        fps,
        parallel_files: !sequential_files,
        cancel: None,
    };

    let mut sampled = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for split in SPLITS {
        let dir = root.join(split);
        if !dir.is_dir() {
            warn!("split folder {} does not exist, skipping", dir.display());
            continue;
        }

        info!("processing split folder {}", dir.display());
        let report = run_batch(&dir, target, &options)
            .with_context(|| format!("batch failed for {}", dir.display()))?;
        sampled += report.sampled();
        skipped += report.skipped();
        failed += report.failed();
    }

    info!(
        "all splits done: {} sampled, {} skipped, {} failed",
        sampled, skipped, failed
    );

    // Per-file failures are reported, not fatal; the threshold flag is the
    // only way they can affect the exit status.
    if let Some(limit) = max_failures {
        if failed > limit {
            bail!("{} files failed (limit {})", failed, limit);
        }
    }

    Ok(())
}

fn convert(input: &Path, out_dir: &Path, prefix: &str, binary: bool) -> anyhow::Result<()> {
    let clouds = read_cloud_stack(input)
        .with_context(|| format!("cannot load {}", input.display()))?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let format = if binary {
        PcdFormat::Binary
    } else {
        PcdFormat::Ascii
    };

    let single = clouds.len() == 1;
    for (i, cloud) in clouds.iter().enumerate() {
        let name = if single {
            format!("{prefix}.pcd")
        } else {
            format!("{prefix}_{i}.pcd")
        };
        let path = out_dir.join(&name);
        write_pcd(&path, cloud, format)
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!("saved {} ({} points)", path.display(), cloud.len());
    }

    info!("converted {} cloud(s) to {}", clouds.len(), out_dir.display());
    Ok(())
}
