//! Predecessor trees
//!
//! For every closure of a target kind, walks backwards along pointer edges to
//! show what keeps it alive: its direct predecessors, their predecessors, and
//! so on down to a fixed depth. A predecessor shared by several parents is
//! listed under each of them, so the output is a tree rather than a DAG.
//!
//! Cycles are not cut, so a tree's height is its depth. Depth is capped at
//! [`MAX_EXPLORE_DEPTH`] and trees are built and walked with explicit stacks.

use super::{AnalysisError, AnalysisResult};
use crate::graph::{ClosureId, HeapGraph, NodeIx};
use serde::Serialize;

/// Largest accepted explore depth
pub const MAX_EXPLORE_DEPTH: usize = 1024;

/// One closure and the closures pointing to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredecessorTree {
    pub id: ClosureId,
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PredecessorTree>,
}

/// A flattened tree line, in pre-order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub id: ClosureId,
    pub kind: String,
}

impl PredecessorTree {
    /// Flatten to `(depth, id, kind)` rows, parents before children
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, tree)) = stack.pop() {
            rows.push(TreeRow {
                depth,
                id: tree.id.clone(),
                kind: tree.kind.clone(),
            });
            // Reverse so the first child is popped first
            for child in tree.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        rows
    }

    /// Number of lines the tree renders to
    pub fn line_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            count += 1;
            stack.extend(tree.children.iter());
        }
        count
    }

    fn leaf(graph: &HeapGraph, ix: NodeIx) -> Self {
        let node = graph.node(ix);
        Self {
            id: node.id.clone(),
            kind: node.kind.clone(),
            children: Vec::new(),
        }
    }
}

/// A tree under construction and the next predecessor to descend into
struct Pending {
    ix: NodeIx,
    remaining: usize,
    next_pred: usize,
    tree: PredecessorTree,
}

impl Pending {
    fn new(graph: &HeapGraph, ix: NodeIx, remaining: usize) -> Self {
        Self {
            ix,
            remaining,
            next_pred: 0,
            tree: PredecessorTree::leaf(graph, ix),
        }
    }
}

fn expand(graph: &HeapGraph, start: NodeIx, depth: usize) -> PredecessorTree {
    let mut stack = vec![Pending::new(graph, start, depth)];

    while let Some(top) = stack.last_mut() {
        if top.remaining > 0 {
            if let Some(&pred) = graph.predecessors(top.ix).get(top.next_pred) {
                top.next_pred += 1;
                let remaining = top.remaining - 1;
                stack.push(Pending::new(graph, pred, remaining));
                continue;
            }
        }

        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.tree.children.push(done.tree),
                None => return done.tree,
            }
        }
    }

    PredecessorTree::leaf(graph, start)
}

/// Build a predecessor tree for every closure of `target_kind`
///
/// Trees come out in ascending id order of their start node. `depth` counts
/// predecessor levels below the start node and must be between 1 and
/// [`MAX_EXPLORE_DEPTH`].
pub fn explore(
    graph: &HeapGraph,
    target_kind: &str,
    depth: usize,
) -> AnalysisResult<Vec<PredecessorTree>> {
    if depth == 0 || depth > MAX_EXPLORE_DEPTH {
        return Err(AnalysisError::InvalidDepth {
            depth,
            max: MAX_EXPLORE_DEPTH,
        });
    }

    let starts = graph.nodes_of_kind(target_kind);
    tracing::info!(
        "Exploring predecessors of {} closure(s) of kind {} to depth {}",
        starts.len(),
        target_kind,
        depth
    );

    let trees: Vec<PredecessorTree> = starts
        .into_iter()
        .map(|ix| expand(graph, ix, depth))
        .collect();

    tracing::debug!(
        "Predecessor trees hold {} line(s) in total",
        trees.iter().map(PredecessorTree::line_count).sum::<usize>()
    );

    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ClosureRecord, Edge};

    fn graph(records: &[(&str, &str)], edges: &[(&str, &str)]) -> HeapGraph {
        let records: Vec<_> = records
            .iter()
            .map(|(id, kind)| ClosureRecord::new(*id, 8, *kind))
            .collect();
        let edges: Vec<_> = edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect();
        HeapGraph::build(&records, &edges, &[]).unwrap()
    }

    #[test]
    fn test_zero_depth_rejected() {
        let g = graph(&[("n", "T")], &[]);
        assert!(matches!(
            explore(&g, "T", 0),
            Err(AnalysisError::InvalidDepth { depth: 0, .. })
        ));
    }

    #[test]
    fn test_start_without_predecessors() {
        let g = graph(&[("n", "T")], &[]);
        let trees = explore(&g, "T", 3).unwrap();
        assert_eq!(trees.len(), 1);
        assert!(trees[0].children.is_empty());
        assert_eq!(trees[0].line_count(), 1);
    }

    #[test]
    fn test_depth_bounds_expansion() {
        // d -> c -> b -> a, a is the target
        let g = graph(
            &[("a", "T"), ("b", "U"), ("c", "U"), ("d", "U")],
            &[("b", "a"), ("c", "b"), ("d", "c")],
        );

        let rows = explore(&g, "T", 2).unwrap()[0].rows();
        let ids: Vec<_> = rows.iter().map(|r| (r.depth, r.id.as_str())).collect();
        assert_eq!(ids, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_shared_predecessor_listed_per_parent() {
        // s points at both p1 and p2, which both point at n
        let g = graph(
            &[("n", "T"), ("p1", "U"), ("p2", "U"), ("s", "S")],
            &[("p1", "n"), ("p2", "n"), ("s", "p1"), ("s", "p2")],
        );

        let trees = explore(&g, "T", 3).unwrap();
        let rows = trees[0].rows();
        assert_eq!(rows.iter().filter(|r| r.id.as_str() == "s").count(), 2);
        assert_eq!(trees[0].line_count(), 5);
    }

    #[test]
    fn test_cycle_terminates_at_depth() {
        let g = graph(&[("a", "T"), ("b", "U")], &[("a", "b"), ("b", "a")]);
        let rows = explore(&g, "T", 3).unwrap()[0].rows();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_deep_cycle_at_depth_cap() {
        let g = graph(&[("a", "T"), ("b", "U")], &[("a", "b"), ("b", "a")]);
        let trees = explore(&g, "T", MAX_EXPLORE_DEPTH).unwrap();

        assert_eq!(trees[0].line_count(), MAX_EXPLORE_DEPTH + 1);
        let rows = trees[0].rows();
        assert_eq!(rows.len(), MAX_EXPLORE_DEPTH + 1);
        assert_eq!(rows.last().unwrap().depth, MAX_EXPLORE_DEPTH);
    }

    #[test]
    fn test_depth_beyond_cap_rejected() {
        let g = graph(&[("a", "T"), ("b", "U")], &[("a", "b"), ("b", "a")]);
        let err = explore(&g, "T", 500_000).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidDepth {
                depth: 500_000,
                max: MAX_EXPLORE_DEPTH
            }
        ));
        assert_eq!(
            err.to_string(),
            "Explore depth must be between 1 and 1024, got 500000"
        );
    }

    #[test]
    fn test_no_matching_kind() {
        let g = graph(&[("a", "U")], &[]);
        assert!(explore(&g, "T", 3).unwrap().is_empty());
    }
}
