//! Greedy selection of non-overlapping interesting directories.
//!
//! Each round every candidate's unexplained score is pushed up to its
//! ancestors, a candidate is penalized by the best score among its own
//! remaining descendants, and the best adjusted candidate is picked. The
//! pick's score is then taken out of its ancestors' unexplained score and
//! the pick's whole subtree leaves the pool.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rstat_core::{AggregateTree, NodeId, ScoreConfig};

use crate::score::ScoreComputer;

/// One selected directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Selected aggregate.
    pub node: NodeId,
    /// Raw score of the aggregate.
    pub score: f64,
    /// Adjusted score it won its round with (equal to `score` for the root).
    pub adjusted: f64,
}

/// Ordered selection: the root first, then picks in the order they were made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    picks: Vec<Pick>,
}

impl Selection {
    /// The root entry.
    pub fn root(&self) -> &Pick {
        &self.picks[0]
    }

    /// All entries, root first.
    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    /// Selected directories other than the root, in priority order.
    pub fn interesting(&self) -> &[Pick] {
        &self.picks[1..]
    }

    /// Node ids in report order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.picks.iter().map(|p| p.node)
    }

    /// Number of entries, including the root.
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    /// A selection always contains the root.
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

/// Picks the smallest set of directories that explains the tree's bulk.
#[derive(Debug, Clone)]
pub struct GreedySelector {
    threshold: f64,
    specificity_preference: f64,
}

impl GreedySelector {
    /// Create a selector from the scoring thresholds.
    pub fn new(config: &ScoreConfig) -> Self {
        Self {
            threshold: config.interestingness_threshold,
            specificity_preference: config.specificity_preference,
        }
    }

    /// Select directories worth reporting.
    pub fn select(&self, tree: &AggregateTree, scorer: &ScoreComputer) -> Selection {
        let root = tree.root();
        let root_score = scorer.score(root);
        let mut picks = vec![Pick {
            node: root.id,
            score: root_score,
            adjusted: root_score,
        }];

        let scores: HashMap<NodeId, f64> = tree
            .iter()
            .filter(|node| !node.is_root())
            .map(|node| (node.id, scorer.score(node)))
            .filter(|&(_, score)| score >= self.threshold)
            .collect();

        // Path order doubles as the tie-break: the first of equal scores wins.
        let mut pool: Vec<NodeId> = scores
            .keys()
            .copied()
            .sorted_by(|a, b| tree[*a].path.cmp(&tree[*b].path))
            .collect();
        let mut unexplained = scores.clone();

        debug!(candidates = pool.len(), "selecting interesting directories");

        for _ in 0..pool.len() {
            let best_descendant = best_descendant_scores(tree, &pool, &unexplained);

            let mut winner: Option<(NodeId, f64)> = None;
            for &id in &pool {
                let penalty = best_descendant.get(&id).copied().unwrap_or(0.0);
                let adjusted = unexplained[&id] - self.specificity_preference * penalty;
                let bar = winner.map_or(self.threshold, |(_, best)| best);
                if adjusted > bar {
                    winner = Some((id, adjusted));
                }
            }
            let Some((winner, adjusted)) = winner else {
                break;
            };

            let explained = unexplained[&winner];
            for ancestor in strict_ancestors(tree, winner) {
                if let Some(score) = unexplained.get_mut(&ancestor) {
                    *score -= explained;
                }
            }

            let before = pool.len();
            pool.retain(|&id| id != winner && !tree.is_ancestor(winner, id));
            debug_assert!(pool.len() < before);

            debug!(
                path = %tree[winner].path.display(),
                score = scores[&winner],
                adjusted,
                covered = before - pool.len(),
                "picked"
            );
            picks.push(Pick {
                node: winner,
                score: scores[&winner],
                adjusted,
            });
        }

        Selection { picks }
    }
}

/// For every ancestor of a pool member, the highest unexplained score
/// among its pooled descendants.
fn best_descendant_scores(
    tree: &AggregateTree,
    pool: &[NodeId],
    unexplained: &HashMap<NodeId, f64>,
) -> HashMap<NodeId, f64> {
    let mut best: HashMap<NodeId, f64> = HashMap::new();
    for &id in pool {
        let score = unexplained[&id];
        for ancestor in strict_ancestors(tree, id) {
            let entry = best.entry(ancestor).or_insert(0.0);
            if score > *entry {
                *entry = score;
            }
        }
    }
    best
}

/// Ancestors of `id`, nearest first, stopping short of the root.
fn strict_ancestors(tree: &AggregateTree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    tree.ancestors(id)
        .take_while(|&ancestor| ancestor != AggregateTree::ROOT)
}
