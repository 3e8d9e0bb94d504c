//! Analysis passes for rstat.
//!
//! Turns an [`AggregateTree`] into a short list of directories worth
//! looking at:
//!
//! - **Scoring** - each aggregate's counts are divided by the root's
//!   (floor-clamped) totals and summed into one number
//! - **Selection** - a greedy loop picks the most specific directory that
//!   explains a share of the tree, never listing a directory together with
//!   one of its own descendants
//! - **Reporting** - rows with share-of-root annotations and error callouts
//!
//! ```rust,ignore
//! use rstat_analyze::{GreedySelector, Report, ScoreComputer};
//! use rstat_core::ScoreConfig;
//! use rstat_scan::{JwalkScanner, ScanConfig};
//!
//! let result = JwalkScanner::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//! let config = ScoreConfig::default();
//!
//! let scorer = ScoreComputer::new(result.tree.root(), &config);
//! let selection = GreedySelector::new(&config).select(&result.tree, &scorer);
//! let report = Report::build(&result.tree, &selection, &scorer);
//!
//! for row in &report.rows {
//!     println!("{} {}", row.label, rstat_analyze::format_bytes(row.bytes.value));
//! }
//! ```

mod report;
pub mod score;
pub mod select;

pub use report::{Column, ErrorCallout, Report, ReportRow, format_bytes};
pub use score::{ScoreBreakdown, ScoreComputer};
pub use select::{GreedySelector, Pick, Selection};

// Re-export core types
pub use rstat_core::{AggregateTree, ScoreConfig};
