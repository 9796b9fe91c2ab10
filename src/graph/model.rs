//! Graph data structures for heap snapshots
//!
//! Nodes are stored densely and indexed in ascending id order, so every
//! enumeration the analyses do (start nodes, successors, predecessors) is
//! deterministic for a fixed input regardless of how the input was ordered.

use super::{GraphError, GraphResult, RecordField};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Kind given to closures whose info pointer did not resolve to a symbol
pub const UNKNOWN_KIND: &str = "???";

/// Dense index of a node inside a [`HeapGraph`]
pub type NodeIx = usize;

/// Opaque identifier of one heap object, stable within a single snapshot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClosureId(String);

impl ClosureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClosureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClosureId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClosureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClosureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Size and kind asserted for a closure by the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureRecord {
    pub id: ClosureId,
    pub size: u64,
    pub kind: String,
}

impl ClosureRecord {
    pub fn new(id: impl Into<ClosureId>, size: u64, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size,
            kind: kind.into(),
        }
    }
}

/// `from` holds a live pointer to `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: ClosureId,
    pub to: ClosureId,
}

impl Edge {
    pub fn new(from: impl Into<ClosureId>, to: impl Into<ClosureId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A node in the heap graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Closure identifier
    pub id: ClosureId,
    /// Closure size as reported by the dump
    pub size: u64,
    /// Closure kind (constructor or info table symbol), `"???"` if unresolved
    pub kind: String,
    /// False when the closure only appeared as a root or edge endpoint
    pub recorded: bool,
}

impl Node {
    pub fn is_synthetic(&self) -> bool {
        !self.recorded
    }
}

/// Immutable heap graph for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapGraph {
    nodes: Vec<Node>,
    index: HashMap<ClosureId, NodeIx>,
    successors: Vec<Vec<NodeIx>>,
    predecessors: Vec<Vec<NodeIx>>,
    roots: Vec<NodeIx>,
    edge_count: usize,
}

impl HeapGraph {
    /// Build the graph from ingested records, edges and roots
    ///
    /// Every id mentioned anywhere becomes a node; ids without a record get
    /// kind `"???"` and size 0. Two records for the same id must agree.
    pub fn build(
        records: &[ClosureRecord],
        edges: &[Edge],
        roots: &[ClosureId],
    ) -> GraphResult<Self> {
        let mut known: BTreeMap<&ClosureId, Option<(u64, &str)>> = BTreeMap::new();

        for record in records {
            match known.get(&record.id) {
                Some(Some((size, kind))) => {
                    if *size != record.size {
                        return Err(GraphError::InconsistentRecord {
                            id: record.id.clone(),
                            field: RecordField::Size,
                            first: size.to_string(),
                            second: record.size.to_string(),
                        });
                    }
                    if *kind != record.kind {
                        return Err(GraphError::InconsistentRecord {
                            id: record.id.clone(),
                            field: RecordField::Kind,
                            first: kind.to_string(),
                            second: record.kind.clone(),
                        });
                    }
                }
                _ => {
                    known.insert(&record.id, Some((record.size, record.kind.as_str())));
                }
            }
        }

        for edge in edges {
            known.entry(&edge.from).or_insert(None);
            known.entry(&edge.to).or_insert(None);
        }
        for root in roots {
            known.entry(root).or_insert(None);
        }

        let mut nodes = Vec::with_capacity(known.len());
        let mut index = HashMap::with_capacity(known.len());
        for (ix, (id, record)) in known.into_iter().enumerate() {
            let node = match record {
                Some((size, kind)) => Node {
                    id: id.clone(),
                    size,
                    kind: kind.to_string(),
                    recorded: true,
                },
                None => Node {
                    id: id.clone(),
                    size: 0,
                    kind: UNKNOWN_KIND.to_string(),
                    recorded: false,
                },
            };
            index.insert(id.clone(), ix);
            nodes.push(node);
        }

        let mut successors = vec![Vec::new(); nodes.len()];
        let mut predecessors = vec![Vec::new(); nodes.len()];
        for edge in edges {
            // Both endpoints were inserted above
            let from = index[&edge.from];
            let to = index[&edge.to];
            successors[from].push(to);
            predecessors[to].push(from);
        }
        for list in successors.iter_mut().chain(predecessors.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        let edge_count = successors.iter().map(Vec::len).sum();

        let roots = roots.iter().map(|root| index[root]).collect();

        let graph = Self {
            nodes,
            index,
            successors,
            predecessors,
            roots,
            edge_count,
        };

        tracing::debug!(
            "Built heap graph: {} node(s) ({} synthetic), {} distinct edge(s), {} root(s)",
            graph.len(),
            graph.nodes.iter().filter(|n| n.is_synthetic()).count(),
            graph.edge_count,
            graph.roots.len()
        );

        Ok(graph)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct `(from, to)` pairs
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, ix: NodeIx) -> &Node {
        &self.nodes[ix]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node index by closure id
    pub fn index_of(&self, id: &str) -> Option<NodeIx> {
        self.index.get(id).copied()
    }

    /// Look up a node by closure id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|ix| &self.nodes[ix])
    }

    /// Outgoing edges of `ix`, ascending id order, no duplicates
    pub fn successors(&self, ix: NodeIx) -> &[NodeIx] {
        &self.successors[ix]
    }

    /// Incoming edges of `ix`, ascending id order, no duplicates
    pub fn predecessors(&self, ix: NodeIx) -> &[NodeIx] {
        &self.predecessors[ix]
    }

    /// Roots in declaration order (duplicates preserved)
    pub fn roots(&self) -> &[NodeIx] {
        &self.roots
    }

    /// All nodes of the given kind, ascending id order
    pub fn nodes_of_kind(&self, kind: &str) -> Vec<NodeIx> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == kind)
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Every distinct edge, ordered by `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeIx, NodeIx)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, kids)| kids.iter().map(move |&to| (from, to)))
    }

    /// Ids of a list of node indices, in the same order
    pub fn ids(&self, ixs: &[NodeIx]) -> Vec<ClosureId> {
        ixs.iter().map(|&ix| self.nodes[ix].id.clone()).collect()
    }
}
