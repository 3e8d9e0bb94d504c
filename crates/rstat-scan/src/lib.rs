//! Directory traversal for rstat.
//!
//! This crate walks a directory tree once with jwalk and rolls every entry
//! into an [`AggregateTree`]. Key pieces:
//!
//! - **Serial traversal** via jwalk, one pass per run
//! - **Cascading ignore rules** via a trie of per-directory pattern sets
//! - **Root resolution** from the working directory and a CLI argument
//!
//! # Example
//!
//! ```rust,no_run
//! use rstat_scan::{JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let result = JwalkScanner::new().scan(&config).unwrap();
//!
//! let root = result.tree.root();
//! println!("{} files, {} bytes", root.counts.files, root.counts.bytes);
//! ```

pub mod ignores;
mod root;
mod scanner;
mod stats;

pub use ignores::{GitignoreSet, IgnoreMatcher, IgnoreVerdict, PatternSet};
pub use root::{ScanTarget, clean};
pub use scanner::JwalkScanner;
pub use stats::{ScanResult, ScanStats};

// Re-export core types for convenience
pub use rstat_core::{
    AggregateNode, AggregateTree, Counts, EntryError, ErrorKind, NodeId, ScanConfig, ScanError,
    TraversalRecord,
};
