//! Traversal records and aggregate node types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EntryError;

/// Unique identifier for an aggregate node within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a u32.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Id for the arena slot at `index`, if it fits in a `u32`.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Position of this node in the tree's arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type of a traversal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Directory.
    Directory,
    /// Anything that is not a directory (regular files, symlinks, devices).
    File,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// A single entry produced by the traversal.
#[derive(Debug, Clone)]
pub struct TraversalRecord {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories and failed entries).
    pub size: u64,
    /// Error encountered while visiting the entry, if any.
    pub error: Option<EntryError>,
}

impl TraversalRecord {
    /// Create a record for a successfully visited directory.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            error: None,
        }
    }

    /// Create a record for a successfully visited file.
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            error: None,
        }
    }

    /// Create a record for an entry that could not be visited.
    pub fn failed(path: impl Into<PathBuf>, kind: EntryKind, error: EntryError) -> Self {
        Self {
            path: path.into(),
            kind,
            size: 0,
            error: Some(error),
        }
    }

    /// Directory whose aggregate this record is counted on first.
    ///
    /// Directories own themselves; everything else is owned by its parent.
    pub fn owning_dir(&self) -> Option<&Path> {
        if self.kind.is_dir() {
            Some(&self.path)
        } else {
            self.path.parent()
        }
    }
}

/// Cumulative counts for a directory subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Number of directory entries, including the directory itself.
    pub dirs: u64,
    /// Number of non-directory entries.
    pub files: u64,
    /// Sum of file sizes in bytes.
    pub bytes: u64,
    /// Number of entries that failed to be visited.
    pub errors: u64,
}

impl Counts {
    /// Create counts from explicit values.
    pub fn new(dirs: u64, files: u64, bytes: u64, errors: u64) -> Self {
        Self {
            dirs,
            files,
            bytes,
            errors,
        }
    }

    /// Check if nothing has been counted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Cumulative aggregate for one directory and everything beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateNode {
    /// Identifier of this node.
    pub id: NodeId,

    /// Parent directory's node (`None` only for the root).
    pub parent: Option<NodeId>,

    /// Full directory path.
    pub path: PathBuf,

    /// Number of path segments below the root.
    pub depth: u32,

    /// Counts for this directory's subtree.
    pub counts: Counts,

    /// First error encountered in this subtree.
    pub first_error: Option<EntryError>,
}

impl AggregateNode {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, path: PathBuf, depth: u32) -> Self {
        Self {
            id,
            parent,
            path,
            depth,
            counts: Counts::default(),
            first_error: None,
        }
    }

    /// Check if this node is the tree root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Apply one record's contribution to this node.
    pub(crate) fn apply(&mut self, record: &TraversalRecord) {
        if let Some(error) = &record.error {
            self.counts.errors += 1;
            if self.first_error.is_none() {
                self.first_error = Some(error.clone());
            }
            return;
        }

        self.counts.bytes += record.size;
        match record.kind {
            EntryKind::Directory => self.counts.dirs += 1,
            EntryKind::File => self.counts.files += 1,
        }
    }
}
