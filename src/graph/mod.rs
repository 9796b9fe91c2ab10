//! Heap graph model
//!
//! Normalized, read-only representation of one heap snapshot: closures with
//! their size and kind, pointer edges between them, and the root set.
//! Built once per snapshot and shared by every analysis.

pub mod dump;
pub mod model;

pub use dump::{DumpEdge, HeapDump};
pub use model::{ClosureId, ClosureRecord, Edge, HeapGraph, Node, NodeIx, UNKNOWN_KIND};

/// Graph construction errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Inconsistent record for closure {id}: {field} is {first} in one record and {second} in another")]
    InconsistentRecord {
        id: ClosureId,
        field: RecordField,
        first: String,
        second: String,
    },

    #[error("Partial record for closure {id}: present in {present} but missing from {missing}")]
    PartialRecord {
        id: ClosureId,
        present: &'static str,
        missing: &'static str,
    },
}

/// Which field of a closure record disagreed between two occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Size,
    Kind,
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordField::Size => f.write_str("size"),
            RecordField::Kind => f.write_str("kind"),
        }
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
