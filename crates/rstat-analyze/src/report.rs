//! Report rows for a selection, plus number formatting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use rstat_core::{AggregateNode, AggregateTree, EntryError};

use crate::score::ScoreComputer;
use crate::select::Selection;

/// A numeric column with an optional share-of-root annotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Raw count.
    pub value: u64,
    /// Percentage of the root's count, when it is worth showing.
    pub percent: Option<f64>,
}

/// One line of the summary table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    /// Directory path as displayed.
    pub label: String,
    /// Whether this row is the grand total (the scan root).
    pub is_total: bool,
    /// Raw score of the directory.
    pub score: f64,
    /// Directory count.
    pub dirs: Column,
    /// File count.
    pub files: Column,
    /// Byte count.
    pub bytes: Column,
}

/// A directory that had traversal errors somewhere below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorCallout {
    /// Directory path.
    pub path: PathBuf,
    /// Number of errors in the subtree.
    pub count: u64,
    /// First error encountered.
    pub first_error: Option<EntryError>,
}

/// Rows in report order plus error callouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Summary rows, grand total first.
    pub rows: Vec<ReportRow>,
    /// Every directory with a non-zero error count, in path order.
    pub errors: Vec<ErrorCallout>,
}

impl Report {
    /// Build the report for a selection.
    pub fn build(tree: &AggregateTree, selection: &Selection, scorer: &ScoreComputer) -> Self {
        let root = tree.root();
        let rows = selection
            .picks()
            .iter()
            .map(|pick| report_row(&tree[pick.node], root, scorer))
            .collect();

        let mut errors: Vec<ErrorCallout> = tree
            .iter()
            .filter(|node| node.counts.errors > 0)
            .map(|node| ErrorCallout {
                path: node.path.clone(),
                count: node.counts.errors,
                first_error: node.first_error.clone(),
            })
            .collect();
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        Self { rows, errors }
    }

    /// Check if any directory had errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn report_row(node: &AggregateNode, root: &AggregateNode, scorer: &ScoreComputer) -> ReportRow {
    let is_total = node.is_root();
    let breakdown = scorer.breakdown(&node.counts);
    let total = breakdown.total();

    // A column is annotated when it carries more than 1% of the row's score
    // and at least half a percent of the root's count.
    let column = |value: u64, root_value: u64, part: f64| {
        let percent = (!is_total && root_value > 0)
            .then(|| 100.0 * value as f64 / root_value as f64)
            .filter(|&percent| part > 0.01 * total && percent >= 0.5);
        Column { value, percent }
    };

    ReportRow {
        label: node.path.display().to_string(),
        is_total,
        score: total,
        dirs: column(node.counts.dirs, root.counts.dirs, breakdown.dirs),
        files: column(node.counts.files, root.counts.files, breakdown.files),
        bytes: column(node.counts.bytes, root.counts.bytes, breakdown.bytes),
    }
}

const BYTE_SCALES: [&str; 6] = ["", "k", "M", "G", "T", "P"];

/// Format a byte count with decimal scale suffixes.
///
/// Unscaled values have no decimals; scaled values keep one decimal from
/// 10 upwards and two below.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut scale = 0;
    while value >= 1000.0 && scale + 1 < BYTE_SCALES.len() {
        value /= 1000.0;
        scale += 1;
    }

    let decimals = match scale {
        0 => 0,
        _ if value < 10.0 => 2,
        _ => 1,
    };
    format!("{value:.decimals$}{}", BYTE_SCALES[scale])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::GreedySelector;
    use rstat_core::{AggregateTreeBuilder, EntryKind, ErrorKind, ScoreConfig, TraversalRecord};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0");
        assert_eq!(format_bytes(999), "999");
        assert_eq!(format_bytes(1000), "1.00k");
        assert_eq!(format_bytes(1500), "1.50k");
        assert_eq!(format_bytes(15_000), "15.0k");
        assert_eq!(format_bytes(150_000), "150.0k");
        assert_eq!(format_bytes(1_000_000_000), "1.00G");
        assert_eq!(format_bytes(2_500_000_000_000_000), "2.50P");
        assert_eq!(format_bytes(u64::MAX), "18446.7P");
    }

    fn sample_tree() -> AggregateTree {
        let mut builder = AggregateTreeBuilder::new("/r");
        let records = [
            TraversalRecord::directory("/r"),
            TraversalRecord::directory("/r/big"),
            TraversalRecord::file("/r/big/blob", 20_000_000),
            TraversalRecord::directory("/r/small"),
            TraversalRecord::file("/r/small/f", 10),
            TraversalRecord::failed(
                "/r/small/locked",
                EntryKind::Directory,
                EntryError::new("/r/small/locked", "denied", ErrorKind::PermissionDenied),
            ),
        ];
        for record in &records {
            builder.ingest(record).unwrap();
        }
        builder.finish()
    }

    fn report_for(tree: &AggregateTree) -> Report {
        let config = ScoreConfig::default();
        let scorer = ScoreComputer::new(tree.root(), &config);
        let selection = GreedySelector::new(&config).select(tree, &scorer);
        Report::build(tree, &selection, &scorer)
    }

    #[test]
    fn test_rows_and_annotations() {
        let tree = sample_tree();
        let report = report_for(&tree);

        let total = &report.rows[0];
        assert!(total.is_total);
        assert_eq!(total.label, "/r");
        assert_eq!(total.bytes.value, 20_000_010);
        assert!(total.bytes.percent.is_none());

        let big = report.rows.iter().find(|r| r.label == "/r/big").unwrap();
        assert!(!big.is_total);
        let percent = big.bytes.percent.unwrap();
        assert!((percent - 100.0 * 20_000_000.0 / 20_000_010.0).abs() < 1e-9);
        // Files and dirs contribute well under 1% of big's score.
        assert!(big.files.percent.is_none());
        assert!(big.dirs.percent.is_none());
    }

    #[test]
    fn test_error_callouts_include_unselected_dirs() {
        let tree = sample_tree();
        let report = report_for(&tree);

        assert!(report.has_errors());
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/r"),
                PathBuf::from("/r/small"),
                PathBuf::from("/r/small/locked"),
            ]
        );
        assert!(report.errors.iter().all(|e| e.count == 1));
        assert_eq!(
            report.errors[1].first_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::PermissionDenied)
        );
    }
}
