//! Retainer analysis
//!
//! Computes, for every root, the set of sentinel-kind closures reachable from
//! it, and flags closures whose reachable sentinel set reaches a threshold.
//!
//! The traversal is a memoized depth-first search driven by an explicit work
//! stack. Each closure moves through `Unvisited -> InProgress -> Done`:
//!
//! - a sentinel is a leaf: it contributes itself and is never expanded;
//! - an `InProgress` closure is on the active path, so reaching it again
//!   closes a cycle and contributes nothing;
//! - a `Done` closure contributes its cached set.
//!
//! When a closure's set reaches the threshold it is flagged and contributes
//! the empty set to the caller that expanded it, so one heavily retained
//! closure yields one flag instead of a flag for every ancestor. Counts are
//! therefore lower bounds whenever cycles or nested flags are involved.

use super::{AnalysisError, AnalysisResult};
use crate::graph::{ClosureId, HeapGraph, NodeIx};
use serde::Serialize;
use std::collections::HashSet;
use std::rc::Rc;

/// Default cap on the active path length
pub const DEFAULT_MAX_DEPTH: usize = 100_000;

/// Sentinel closures reachable from a closure
pub type Reach = Rc<HashSet<NodeIx>>;

/// A closure whose reachable sentinel set reached the threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flag {
    /// The flagged closure
    pub node: ClosureId,
    /// Number of ancestors between the root and the flagged closure
    pub path_depth: usize,
    /// Size of the placeholder set when expansion started
    pub reachable_before: usize,
    /// Size of the reachable sentinel set after expansion
    pub reachable_after: usize,
    /// Sentinel count contributed by each child, in child order
    pub per_child_counts: Vec<usize>,
    /// Direct successors of the flagged closure, ascending id order
    pub children: Vec<ClosureId>,
    /// Root first, flagged closure last
    pub path: Vec<ClosureId>,
}

/// Receives flags as the analyzer produces them
pub trait FlagSink {
    fn emit(&mut self, flag: Flag);
}

impl FlagSink for Vec<Flag> {
    fn emit(&mut self, flag: Flag) {
        self.push(flag);
    }
}

/// Per-closure traversal state, scoped to one analysis run
#[derive(Debug, Clone, Default)]
enum VisitState {
    #[default]
    Unvisited,
    InProgress,
    Done(Reach),
}

/// A closure being expanded
struct Frame {
    node: NodeIx,
    next_child: usize,
    reachable_before: usize,
    found: HashSet<NodeIx>,
    per_child_counts: Vec<usize>,
}

impl Frame {
    fn absorb(&mut self, reach: &HashSet<NodeIx>) {
        self.per_child_counts.push(reach.len());
        self.found.extend(reach.iter().copied());
    }
}

/// Outcome of stepping into a closure
enum Step {
    /// The closure's contribution is known without expanding it
    Ready(Reach),
    /// A frame was pushed; its contribution arrives when it completes
    Pushed,
}

/// Statistics for one analysis run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub roots: usize,
    pub expanded: usize,
    pub cycle_breaks: usize,
    pub flags: usize,
}

/// Memoized retainer analysis over one graph
///
/// The visitation state lives in the analyzer and is shared by every root
/// analyzed through it. Create a fresh analyzer for an independent run.
pub struct RetainerAnalyzer<'g> {
    graph: &'g HeapGraph,
    sentinel_kind: String,
    threshold: usize,
    max_depth: usize,
    states: Vec<VisitState>,
    stack: Vec<Frame>,
    empty: Reach,
    stats: RunStats,
}

impl<'g> RetainerAnalyzer<'g> {
    pub fn new(
        graph: &'g HeapGraph,
        sentinel_kind: impl Into<String>,
        threshold: usize,
    ) -> AnalysisResult<Self> {
        if threshold == 0 {
            return Err(AnalysisError::InvalidThreshold);
        }

        Ok(Self {
            graph,
            sentinel_kind: sentinel_kind.into(),
            threshold,
            max_depth: DEFAULT_MAX_DEPTH,
            states: vec![VisitState::Unvisited; graph.len()],
            stack: Vec::new(),
            empty: Rc::new(HashSet::new()),
            stats: RunStats::default(),
        })
    }

    /// Cap the active path length; exceeding it fails the run
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    fn is_sentinel(&self, ix: NodeIx) -> bool {
        self.graph.node(ix).kind == self.sentinel_kind
    }

    fn path_ids(&self) -> Vec<ClosureId> {
        self.stack
            .iter()
            .map(|frame| self.graph.node(frame.node).id.clone())
            .collect()
    }

    /// Step into `ix`: answer from the sentinel check or the state table, or
    /// push a frame to expand it
    fn enter(&mut self, ix: NodeIx) -> AnalysisResult<Step> {
        if self.is_sentinel(ix) {
            return Ok(Step::Ready(Rc::new(HashSet::from([ix]))));
        }

        match &self.states[ix] {
            VisitState::InProgress => {
                self.stats.cycle_breaks += 1;
                Ok(Step::Ready(Rc::clone(&self.empty)))
            }
            VisitState::Done(reach) => Ok(Step::Ready(Rc::clone(reach))),
            VisitState::Unvisited => {
                if self.stack.len() >= self.max_depth {
                    let mut path = self.path_ids();
                    path.push(self.graph.node(ix).id.clone());
                    return Err(AnalysisError::DepthLimitExceeded {
                        limit: self.max_depth,
                        path,
                    });
                }

                // A closure never returns to Unvisited, so the placeholder
                // carried into InProgress is always empty.
                self.states[ix] = VisitState::InProgress;
                self.stack.push(Frame {
                    node: ix,
                    next_child: 0,
                    reachable_before: 0,
                    found: HashSet::new(),
                    per_child_counts: Vec::new(),
                });
                self.stats.expanded += 1;
                Ok(Step::Pushed)
            }
        }
    }

    /// Finalize a popped frame and return what it contributes to its caller
    fn finish<S: FlagSink + ?Sized>(&mut self, frame: Frame, sink: &mut S) -> Reach {
        let graph = self.graph;
        let reachable_after = frame.found.len();
        let found = Rc::new(frame.found);
        self.states[frame.node] = VisitState::Done(Rc::clone(&found));

        if reachable_after < self.threshold {
            return found;
        }

        let node = &graph.node(frame.node).id;
        let mut path = self.path_ids();
        path.push(node.clone());

        let flag = Flag {
            node: node.clone(),
            path_depth: self.stack.len(),
            reachable_before: frame.reachable_before,
            reachable_after,
            per_child_counts: frame.per_child_counts,
            children: graph.ids(graph.successors(frame.node)),
            path,
        };
        tracing::debug!(
            "Flagged closure {} at depth {} with {} reachable sentinel(s)",
            flag.node,
            flag.path_depth,
            flag.reachable_after
        );
        self.stats.flags += 1;
        sink.emit(flag);

        Rc::clone(&self.empty)
    }

    /// Compute the sentinel set reachable from `root`, emitting flags on the way
    pub fn visit<S: FlagSink + ?Sized>(
        &mut self,
        root: NodeIx,
        sink: &mut S,
    ) -> AnalysisResult<Reach> {
        let result = self.run(root, sink);
        if result.is_err() {
            // Leave no half-expanded closures behind
            for frame in self.stack.drain(..) {
                self.states[frame.node] = VisitState::Unvisited;
            }
        }
        result
    }

    fn run<S: FlagSink + ?Sized>(&mut self, root: NodeIx, sink: &mut S) -> AnalysisResult<Reach> {
        if let Step::Ready(reach) = self.enter(root)? {
            return Ok(reach);
        }

        let graph = self.graph;
        while let Some(top) = self.stack.last_mut() {
            if let Some(&child) = graph.successors(top.node).get(top.next_child) {
                top.next_child += 1;
                if let Step::Ready(reach) = self.enter(child)? {
                    if let Some(parent) = self.stack.last_mut() {
                        parent.absorb(&reach);
                    }
                }
                continue;
            }

            if let Some(frame) = self.stack.pop() {
                let reach = self.finish(frame, sink);
                match self.stack.last_mut() {
                    Some(parent) => parent.absorb(&reach),
                    None => return Ok(reach),
                }
            }
        }

        Ok(Rc::clone(&self.empty))
    }

    /// Analyze every root in declaration order
    pub fn run_roots<S: FlagSink + ?Sized>(&mut self, sink: &mut S) -> AnalysisResult<RunStats> {
        let graph = self.graph;
        for &root in graph.roots() {
            self.visit(root, sink)?;
            self.stats.roots += 1;
        }

        tracing::info!(
            "Retainer analysis for {}: {} root(s), {} closure(s) expanded, {} cycle break(s), {} flag(s)",
            self.sentinel_kind,
            self.stats.roots,
            self.stats.expanded,
            self.stats.cycle_breaks,
            self.stats.flags
        );

        Ok(self.stats)
    }
}

/// Run the retainer analysis over every root and collect the flags
pub fn analyze(
    graph: &HeapGraph,
    sentinel_kind: &str,
    threshold: usize,
) -> AnalysisResult<Vec<Flag>> {
    let mut flags = Vec::new();
    RetainerAnalyzer::new(graph, sentinel_kind, threshold)?.run_roots(&mut flags)?;
    Ok(flags)
}
