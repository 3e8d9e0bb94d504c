//! Arena-backed aggregation tree.

use std::collections::HashMap;
use std::ops::Index;
use std::path::{Component, Path, PathBuf};

use crate::error::AggregateError;
use crate::node::{AggregateNode, NodeId, TraversalRecord};

/// Builds an [`AggregateTree`] from a stream of traversal records.
///
/// Every record is counted on its owning directory and on each ancestor up
/// to and including the root, so each node ends up holding totals for its
/// whole subtree. Nodes are created the first time a path is touched and
/// linked to their parent, which makes the upward walk a chain of index hops.
#[derive(Debug)]
pub struct AggregateTreeBuilder {
    root: PathBuf,
    nodes: Vec<AggregateNode>,
    index: HashMap<PathBuf, NodeId>,
}

impl AggregateTreeBuilder {
    /// Create a builder rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut index = HashMap::new();
        index.insert(root.clone(), AggregateTree::ROOT);
        Self {
            nodes: vec![AggregateNode::new(AggregateTree::ROOT, None, root.clone(), 0)],
            root,
            index,
        }
    }

    /// Root path of the tree being built.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of aggregates created so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from the start.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Count one record on its owning directory and every ancestor.
    pub fn ingest(&mut self, record: &TraversalRecord) -> Result<(), AggregateError> {
        let owner = record.owning_dir().ok_or_else(|| AggregateError::OutsideRoot {
            path: record.path.clone(),
            root: self.root.clone(),
        })?;
        let mut id = self.get_or_create(owner)?;

        let max_steps = self.nodes[id.index()].depth as usize + 1;
        for _ in 0..max_steps {
            let node = &mut self.nodes[id.index()];
            node.apply(record);
            if id == AggregateTree::ROOT {
                return Ok(());
            }
            match node.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }

        Err(AggregateError::UnterminatedWalk {
            path: record.path.clone(),
            steps: max_steps,
        })
    }

    /// Finish the traversal pass. The returned tree is read-only.
    pub fn finish(self) -> AggregateTree {
        AggregateTree {
            root: self.root,
            nodes: self.nodes,
            index: self.index,
        }
    }

    fn get_or_create(&mut self, dir: &Path) -> Result<NodeId, AggregateError> {
        if let Some(&id) = self.index.get(dir) {
            return Ok(id);
        }

        let relative = dir
            .strip_prefix(&self.root)
            .map_err(|_| outside_root(dir, &self.root))?;

        let mut current = AggregateTree::ROOT;
        let mut path = self.root.clone();
        for (depth, component) in relative.components().enumerate() {
            let Component::Normal(segment) = component else {
                return Err(outside_root(dir, &self.root));
            };
            path.push(segment);
            current = match self.index.get(&path) {
                Some(&id) => id,
                None => self.insert(path.clone(), current, depth as u32 + 1)?,
            };
        }
        Ok(current)
    }

    fn insert(&mut self, path: PathBuf, parent: NodeId, depth: u32) -> Result<NodeId, AggregateError> {
        let id = NodeId::from_index(self.nodes.len())
            .ok_or_else(|| AggregateError::TooManyNodes { path: path.clone() })?;
        self.nodes
            .push(AggregateNode::new(id, Some(parent), path.clone(), depth));
        self.index.insert(path, id);
        Ok(id)
    }
}

fn outside_root(path: &Path, root: &Path) -> AggregateError {
    AggregateError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    }
}

/// Cumulative per-directory aggregates for a scanned subtree.
#[derive(Debug, Clone)]
pub struct AggregateTree {
    root: PathBuf,
    nodes: Vec<AggregateNode>,
    index: HashMap<PathBuf, NodeId>,
}

impl AggregateTree {
    /// Identifier of the root aggregate.
    pub const ROOT: NodeId = NodeId(0);

    /// Root path of the tree.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// The root aggregate (grand totals).
    pub fn root(&self) -> &AggregateNode {
        &self.nodes[Self::ROOT.index()]
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&AggregateNode> {
        self.nodes.get(id.index())
    }

    /// Look up the aggregate for a directory path.
    pub fn find(&self, path: &Path) -> Option<&AggregateNode> {
        self.index.get(path).map(|&id| &self.nodes[id.index()])
    }

    /// Number of aggregates, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A finished tree always holds at least the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all aggregates in creation order (root first).
    pub fn iter(&self) -> impl Iterator<Item = &AggregateNode> {
        self.nodes.iter()
    }

    /// Iterate over the strict ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    /// Check whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }
}

impl Index<NodeId> for AggregateTree {
    type Output = AggregateNode;

    fn index(&self, id: NodeId) -> &AggregateNode {
        &self.nodes[id.index()]
    }
}

/// Iterator over a node's ancestors following parent links.
pub struct Ancestors<'a> {
    tree: &'a AggregateTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.parent);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntryError;
    use crate::node::{Counts, EntryKind};

    #[test]
    fn test_counts_propagate_to_root() {
        let mut builder = AggregateTreeBuilder::new("/r");
        builder.ingest(&TraversalRecord::directory("/r")).unwrap();
        builder.ingest(&TraversalRecord::directory("/r/a")).unwrap();
        builder.ingest(&TraversalRecord::file("/r/a/f", 10)).unwrap();
        builder.ingest(&TraversalRecord::file("/r/g", 5)).unwrap();
        let tree = builder.finish();

        assert_eq!(tree.root().counts, Counts::new(2, 2, 15, 0));
        let a = tree.find(Path::new("/r/a")).unwrap();
        assert_eq!(a.counts, Counts::new(1, 1, 10, 0));
        assert_eq!(a.parent, Some(AggregateTree::ROOT));
    }

    #[test]
    fn test_nodes_created_once() {
        let mut builder = AggregateTreeBuilder::new("/r");
        builder.ingest(&TraversalRecord::file("/r/a/b/f1", 1)).unwrap();
        builder.ingest(&TraversalRecord::file("/r/a/b/f2", 1)).unwrap();
        builder.ingest(&TraversalRecord::directory("/r/a")).unwrap();
        assert_eq!(builder.len(), 3);

        let tree = builder.finish();
        let b = tree.find(Path::new("/r/a/b")).unwrap();
        assert_eq!(b.depth, 2);
        assert_eq!(b.counts.files, 2);
        assert_eq!(tree.find(Path::new("/r/a")).unwrap().counts.files, 2);
    }

    #[test]
    fn test_errors_cascade() {
        let mut builder = AggregateTreeBuilder::new("/r");
        let err = EntryError::permission_denied("/r/a/locked");
        builder
            .ingest(&TraversalRecord::failed("/r/a/locked", EntryKind::Directory, err.clone()))
            .unwrap();
        let tree = builder.finish();

        for path in ["/r", "/r/a", "/r/a/locked"] {
            let node = tree.find(Path::new(path)).unwrap();
            assert_eq!(node.counts.errors, 1, "{path}");
            assert_eq!(node.counts.dirs, 0);
            assert_eq!(node.first_error.as_ref(), Some(&err));
        }
    }

    #[test]
    fn test_outside_root_rejected() {
        let mut builder = AggregateTreeBuilder::new("/r");
        let result = builder.ingest(&TraversalRecord::file("/elsewhere/f", 1));
        assert!(matches!(result, Err(AggregateError::OutsideRoot { .. })));

        let result = builder.ingest(&TraversalRecord::directory("/r/../x"));
        assert!(matches!(result, Err(AggregateError::OutsideRoot { .. })));
    }

    #[test]
    fn test_ancestors() {
        let mut builder = AggregateTreeBuilder::new("/r");
        builder.ingest(&TraversalRecord::directory("/r/a/b/c")).unwrap();
        let tree = builder.finish();

        let c = tree.find(Path::new("/r/a/b/c")).unwrap().id;
        let chain: Vec<_> = tree
            .ancestors(c)
            .map(|id| tree[id].path.clone())
            .collect();
        assert_eq!(
            chain,
            vec![PathBuf::from("/r/a/b"), PathBuf::from("/r/a"), PathBuf::from("/r")]
        );

        let a = tree.find(Path::new("/r/a")).unwrap().id;
        assert!(tree.is_ancestor(a, c));
        assert!(!tree.is_ancestor(c, a));
        assert!(!tree.is_ancestor(a, a));
        assert_eq!(tree.ancestors(AggregateTree::ROOT).count(), 0);
    }
}
