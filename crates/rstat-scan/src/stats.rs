//! Scan statistics and results.

use std::path::PathBuf;
use std::time::Duration;

use rstat_core::{AggregateTree, EntryKind, TraversalRecord};

/// Counters collected during a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Number of directories visited.
    pub dirs_scanned: u64,
    /// Number of files visited.
    pub files_scanned: u64,
    /// Total bytes counted.
    pub bytes_scanned: u64,
    /// Number of entries that failed to be visited.
    pub errors_count: u64,
    /// Number of entries pruned by ignore rules.
    pub ignored_count: u64,
    /// Number of per-directory ignore files loaded.
    pub ignore_files_loaded: u64,
    /// Time the traversal took.
    pub elapsed: Duration,
}

impl ScanStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with one traversal record.
    pub fn record(&mut self, record: &TraversalRecord) {
        if record.error.is_some() {
            self.errors_count += 1;
            return;
        }
        match record.kind {
            EntryKind::Directory => self.dirs_scanned += 1,
            EntryKind::File => {
                self.files_scanned += 1;
                self.bytes_scanned += record.size;
            }
        }
    }

    /// Get total records seen (dirs + files + errors).
    pub fn total_items(&self) -> u64 {
        self.dirs_scanned + self.files_scanned + self.errors_count
    }

    /// Calculate scan rate in entries per second.
    pub fn entries_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_items() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Completed scan: the aggregation tree plus bookkeeping.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Cumulative per-directory aggregates.
    pub tree: AggregateTree,

    /// Root path that was scanned.
    pub root_path: PathBuf,

    /// Traversal counters.
    pub stats: ScanStats,
}
