//! Interestingness scores normalized against the scan root.

use serde::{Deserialize, Serialize};

use rstat_core::{AggregateNode, Counts, ScoreConfig};

/// Per-column contributions to a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Directory count relative to the baseline.
    pub dirs: f64,
    /// Error count relative to the baseline.
    pub errors: f64,
    /// File count relative to the baseline.
    pub files: f64,
    /// Byte count relative to the baseline.
    pub bytes: f64,
}

impl ScoreBreakdown {
    /// Sum of all contributions.
    pub fn total(&self) -> f64 {
        self.dirs + self.errors + self.files + self.bytes
    }
}

/// Converts aggregates into comparable scores.
///
/// The baseline is the root's totals with each count clamped up to its
/// configured floor.
#[derive(Debug, Clone)]
pub struct ScoreComputer {
    baseline: Counts,
}

impl ScoreComputer {
    /// Create a computer from the root aggregate.
    pub fn new(root: &AggregateNode, config: &ScoreConfig) -> Self {
        let totals = root.counts;
        Self {
            baseline: Counts {
                dirs: totals.dirs.max(config.min_dirs),
                errors: totals.errors.max(config.min_errors),
                files: totals.files.max(config.min_files),
                bytes: totals.bytes.max(config.min_bytes),
            },
        }
    }

    /// Normalization baseline.
    pub fn baseline(&self) -> &Counts {
        &self.baseline
    }

    /// Score an aggregate.
    pub fn score(&self, node: &AggregateNode) -> f64 {
        self.breakdown(&node.counts).total()
    }

    /// Score each column of `counts` separately.
    pub fn breakdown(&self, counts: &Counts) -> ScoreBreakdown {
        ScoreBreakdown {
            dirs: ratio(counts.dirs, self.baseline.dirs),
            errors: ratio(counts.errors, self.baseline.errors),
            files: ratio(counts.files, self.baseline.files),
            bytes: ratio(counts.bytes, self.baseline.bytes),
        }
    }
}

fn ratio(value: u64, base: u64) -> f64 {
    value as f64 / base.max(1) as f64
}
