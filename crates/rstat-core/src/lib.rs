//! Core types for rstat.
//!
//! This crate provides the data structures shared by the scanner and the
//! analysis passes: traversal records, cumulative per-directory aggregates,
//! the arena-backed aggregation tree, and configuration.

mod config;
mod error;
mod node;
mod tree;

pub use config::{ScanConfig, ScanConfigBuilder, ScoreConfig, ScoreConfigBuilder};
pub use error::{AggregateError, EntryError, ErrorKind, ScanError};
pub use node::{AggregateNode, Counts, EntryKind, NodeId, TraversalRecord};
pub use tree::{AggregateTree, AggregateTreeBuilder, Ancestors};
