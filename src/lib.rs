//! heaptrace library
//!
//! Heap snapshot retention analysis: the graph model, snapshot ingestion,
//! the predecessor explorer and the retainer analyzer, plus the reporting,
//! configuration and CLI layers the `heaptrace` binary is built from.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod graph;
pub mod ingest;
pub mod report;

// Re-export commonly used types for convenience
pub use analysis::{
    AnalysisError, Flag, FlagSink, PredecessorTree, RetainerAnalyzer, analyze, explore, summarize,
};
pub use graph::{ClosureId, ClosureRecord, Edge, GraphError, HeapDump, HeapGraph};
pub use ingest::{IngestError, Snapshot, SymbolTable, parse_snapshot};
