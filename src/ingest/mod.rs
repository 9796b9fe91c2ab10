//! Snapshot ingestion
//!
//! Turns the raw artifacts produced by the in-process dumper (a symbol table
//! and a snapshot log) into the records, edges and roots the graph model
//! consumes.

pub mod snapshot;
pub mod symbols;

pub use snapshot::{Snapshot, parse_snapshot};
pub use symbols::{SymbolTable, normalize_address};

use crate::graph::{GraphResult, HeapGraph};

/// Ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Malformed symbol table entry on line {line}: expected `<address> <name>`")]
    MalformedSymbol { line: usize },

    #[error("Malformed root declaration on line {line}: no closure id")]
    MalformedRoot { line: usize },

    #[error("Malformed visit record on line {line}: {reason}")]
    MalformedVisit { line: usize, reason: String },

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ingestion
pub type IngestResult<T> = Result<T, IngestError>;

impl Snapshot {
    /// Build the heap graph, validating record consistency
    pub fn into_graph(self) -> GraphResult<HeapGraph> {
        HeapGraph::build(&self.records, &self.edges, &self.roots)
    }
}
