//! Serialized interchange form of a heap graph
//!
//! This is the `dump.json` shape written by the converter and read by the
//! analyses: closure kinds and sizes keyed by id, the root list, and the raw
//! edge list.

use super::model::{ClosureId, ClosureRecord, Edge, HeapGraph};
use super::{GraphError, GraphResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One edge of the interchange form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEdge {
    pub from: ClosureId,
    pub to: ClosureId,
}

/// Persisted heap snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapDump {
    /// Closure id to kind
    #[serde(default)]
    pub infos: BTreeMap<ClosureId, String>,
    /// Closure id to size
    #[serde(default)]
    pub lengths: BTreeMap<ClosureId, u64>,
    /// Root closures in declaration order
    #[serde(default)]
    pub roots: Vec<ClosureId>,
    /// Pointer edges
    #[serde(default)]
    pub edges: Vec<DumpEdge>,
}

impl HeapDump {
    /// Capture a graph in interchange form
    ///
    /// Only asserted records are written; synthetic nodes are implied by the
    /// roots and edges that mention them.
    pub fn from_graph(graph: &HeapGraph) -> Self {
        let mut infos = BTreeMap::new();
        let mut lengths = BTreeMap::new();
        for node in graph.nodes().iter().filter(|n| n.recorded) {
            infos.insert(node.id.clone(), node.kind.clone());
            lengths.insert(node.id.clone(), node.size);
        }

        let roots = graph.ids(graph.roots());

        let edges = graph
            .edges()
            .map(|(from, to)| DumpEdge {
                from: graph.node(from).id.clone(),
                to: graph.node(to).id.clone(),
            })
            .collect();

        Self {
            infos,
            lengths,
            roots,
            edges,
        }
    }

    /// Split into the records, edges and roots the graph model consumes
    pub fn to_parts(&self) -> GraphResult<(Vec<ClosureRecord>, Vec<Edge>, Vec<ClosureId>)> {
        if let Some(id) = self.infos.keys().find(|id| !self.lengths.contains_key(*id)) {
            return Err(GraphError::PartialRecord {
                id: id.clone(),
                present: "infos",
                missing: "lengths",
            });
        }

        let mut records = Vec::with_capacity(self.lengths.len());
        for (id, size) in &self.lengths {
            let kind = self.infos.get(id).ok_or_else(|| GraphError::PartialRecord {
                id: id.clone(),
                present: "lengths",
                missing: "infos",
            })?;
            records.push(ClosureRecord::new(id.clone(), *size, kind.clone()));
        }

        let edges = self
            .edges
            .iter()
            .map(|e| Edge::new(e.from.clone(), e.to.clone()))
            .collect();

        Ok((records, edges, self.roots.clone()))
    }

    /// Rebuild the graph
    pub fn to_graph(&self) -> GraphResult<HeapGraph> {
        let (records, edges, roots) = self.to_parts()?;
        HeapGraph::build(&records, &edges, &roots)
    }

    /// Read a dump from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
        let dump: HeapDump = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse dump file: {}", path.display()))?;

        tracing::debug!(
            "Loaded dump {}: {} record(s), {} edge(s), {} root(s)",
            path.display(),
            dump.lengths.len(),
            dump.edges.len(),
            dump.roots.len()
        );

        Ok(dump)
    }

    /// Write the dump as indented JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create dump file: {}", path.display()))?;
        self.write_to(BufWriter::new(file))
            .with_context(|| format!("Failed to write dump file: {}", path.display()))
    }

    /// Write the dump as indented JSON to any writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self).context("Failed to serialize dump")?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
