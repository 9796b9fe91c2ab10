//! Kind histogram

use crate::graph::HeapGraph;
use serde::Serialize;
use std::collections::HashMap;

/// Closure count and total bytes for one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub kind: String,
    pub count: usize,
    pub bytes: u64,
}

/// Group closures by kind, largest total size first
///
/// Ties are broken by count (descending) and then kind name, so the order is
/// stable for a given snapshot.
pub fn summarize(graph: &HeapGraph) -> Vec<KindStats> {
    let mut by_kind: HashMap<&str, (usize, u64)> = HashMap::new();
    for node in graph.nodes() {
        let entry = by_kind.entry(node.kind.as_str()).or_default();
        entry.0 += 1;
        entry.1 += node.size;
    }

    let mut stats: Vec<KindStats> = by_kind
        .into_iter()
        .map(|(kind, (count, bytes))| KindStats {
            kind: kind.to_string(),
            count,
            bytes,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.bytes
            .cmp(&a.bytes)
            .then(b.count.cmp(&a.count))
            .then_with(|| a.kind.cmp(&b.kind))
    });
    stats
}
