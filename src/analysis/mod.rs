//! Retention analyses over a heap graph
//!
//! All analyses borrow the graph read-only and keep their traversal state to
//! themselves, so independent runs can share one graph across threads.

pub mod explore;
pub mod retain;
pub mod summary;

pub use explore::{MAX_EXPLORE_DEPTH, PredecessorTree, TreeRow, explore};
pub use retain::{Flag, FlagSink, RetainerAnalyzer, analyze};
pub use summary::{KindStats, summarize};

use crate::graph::ClosureId;

/// Analysis errors
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Explore depth must be between 1 and {max}, got {depth}")]
    InvalidDepth { depth: usize, max: usize },

    #[error("Retention threshold must be at least 1")]
    InvalidThreshold,

    #[error(
        "Traversal depth limit of {limit} exceeded at closure {} (path length {})",
        .path.last().map(ClosureId::as_str).unwrap_or("?"),
        .path.len()
    )]
    DepthLimitExceeded { limit: usize, path: Vec<ClosureId> },
}

/// Result type for analyses
pub type AnalysisResult<T> = Result<T, AnalysisError>;
