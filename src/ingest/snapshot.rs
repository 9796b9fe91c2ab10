//! Snapshot log parsing
//!
//! The dumper writes its progress to stderr, interleaved with whatever else
//! the program prints. Only two line shapes carry graph data:
//!
//! ```text
//! ### root 0x4200123a10
//! ### visit 0x4200123b58:24:0x4a5f10 <- 0x4200123a10:16:0x4a6000
//! ```
//!
//! A visit line reads `<to> <- <from>`, each side a `closure:size:info`
//! triple. Everything else is ignored.

use super::{IngestError, IngestResult, SymbolTable};
use crate::graph::{ClosureId, ClosureRecord, Edge};
use std::io::BufRead;

const ROOT_PREFIX: &str = "### root ";
const VISIT_PREFIX: &str = "### visit ";

/// Records, edges and roots extracted from a snapshot log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<ClosureRecord>,
    pub edges: Vec<Edge>,
    pub roots: Vec<ClosureId>,
}

fn closure_id(token: &str) -> ClosureId {
    ClosureId::new(token.strip_prefix("0x").unwrap_or(token))
}

/// Parse one `closure:size:info` triple into a record
fn parse_endpoint(token: &str, symbols: &SymbolTable, line: usize) -> IngestResult<ClosureRecord> {
    let malformed = |reason: String| IngestError::MalformedVisit { line, reason };

    let mut parts = token.split(':');
    let (Some(closure), Some(size), Some(info), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed(format!(
            "expected `closure:size:info`, got `{token}`"
        )));
    };

    let size = size
        .parse::<u64>()
        .map_err(|e| malformed(format!("invalid size `{size}`: {e}")))?;

    Ok(ClosureRecord::new(
        closure_id(closure),
        size,
        symbols.kind_of(info),
    ))
}

/// Parse a snapshot log, resolving info pointers through `symbols`
pub fn parse_snapshot<R: BufRead>(reader: R, symbols: &SymbolTable) -> IngestResult<Snapshot> {
    let mut snapshot = Snapshot::default();
    let mut ignored = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;

        if let Some(rest) = line.strip_prefix(ROOT_PREFIX) {
            let token = rest.trim();
            if token.is_empty() {
                return Err(IngestError::MalformedRoot { line: line_no });
            }
            snapshot.roots.push(closure_id(token));
        } else if let Some(rest) = line.strip_prefix(VISIT_PREFIX) {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let [to, "<-", from] = fields.as_slice() else {
                return Err(IngestError::MalformedVisit {
                    line: line_no,
                    reason: "expected `<to> <- <from>`".to_string(),
                });
            };

            let to = parse_endpoint(to, symbols, line_no)?;
            let from = parse_endpoint(from, symbols, line_no)?;

            snapshot.edges.push(Edge::new(from.id.clone(), to.id.clone()));
            snapshot.records.push(from);
            snapshot.records.push(to);
        } else {
            ignored += 1;
        }
    }

    tracing::debug!(
        "Parsed snapshot log: {} root(s), {} edge(s), {} other line(s) ignored",
        snapshot.roots.len(),
        snapshot.edges.len(),
        ignored
    );

    Ok(snapshot)
}
