use std::path::PathBuf;
use std::time::Duration;

/// Why a file was passed over without touching its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file holds zero points.
    Empty,
    /// The cloud is smaller than the requested sample count.
    TooSmall { have: usize, want: usize },
}

/// Why processing a file failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// The file could not be parsed as a `[N, 3]` array.
    Corrupt(String),
    /// A NaN or infinite coordinate was found at the given point index.
    NonFinite { index: usize },
    /// Reading or writing the file failed.
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Sampled { points_in: usize, points_out: usize },
    Skipped(SkipReason),
    Failed(FailReason),
}

/// Final outcome for one enumerated file. Records are never retried.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub path: PathBuf,
    pub elapsed: Duration,
    pub outcome: JobOutcome,
}

/// Aggregate result of one batch run, reduced from the per-file records
/// after all workers have finished.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<JobRecord>,
    /// True when the cooperative stop flag ended the run before every
    /// enumerated file was processed.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn seen(&self) -> usize {
        self.records.len()
    }

    pub fn sampled(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Sampled { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Failed(_)))
            .count()
    }

    /// Total wall time spent on files that were actually sampled.
    pub fn total_elapsed(&self) -> Duration {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Sampled { .. }))
            .map(|r| r.elapsed)
            .sum()
    }

    /// Mean wall time per sampled file, or zero when nothing was sampled.
    pub fn mean_elapsed(&self) -> Duration {
        let sampled = self.sampled();
        if sampled == 0 {
            Duration::ZERO
        } else {
            self.total_elapsed() / sampled as u32
        }
    }
}
