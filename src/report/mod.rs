//! Report rendering
//!
//! Text and JSON-lines presentation of analysis results. Analyses never
//! print; the CLI hands their output to these functions.

use crate::analysis::{Flag, FlagSink, KindStats, PredecessorTree};
use crate::graph::ClosureId;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON document per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!(
                "Unknown output format: {} (expected 'text' or 'json')",
                s
            )),
        }
    }
}

fn join_ids(ids: &[ClosureId]) -> String {
    ids.iter()
        .map(ClosureId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render one predecessor tree, two spaces of indentation per level
pub fn render_tree(tree: &PredecessorTree) -> String {
    let mut out = String::new();
    for row in tree.rows() {
        let _ = writeln!(out, "{:indent$}{} {}", "", row.id, row.kind, indent = row.depth * 2);
    }
    out
}

/// Render every tree in order
pub fn render_trees(trees: &[PredecessorTree]) -> String {
    trees.iter().map(render_tree).collect()
}

/// Render a flag as a single line carrying every field
pub fn format_flag(flag: &Flag) -> String {
    let per_child = flag
        .per_child_counts
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "depth={} node={} before={} after={} per_child=[{}] children=[{}] path=[{}]",
        flag.path_depth,
        flag.node,
        flag.reachable_before,
        flag.reachable_after,
        per_child,
        join_ids(&flag.children),
        join_ids(&flag.path)
    )
}

/// Render the kind histogram as aligned columns
pub fn render_summary(stats: &[KindStats]) -> String {
    let mut out = format!("{:>12} {:>10}  {}\n", "bytes", "count", "kind");
    for entry in stats {
        let _ = writeln!(out, "{:>12} {:>10}  {}", entry.bytes, entry.count, entry.kind);
    }
    out
}

/// Write each item as one JSON document per line
pub fn write_json_lines<T: Serialize, W: Write>(items: &[T], mut writer: W) -> anyhow::Result<()> {
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Streams flags to a writer as soon as the analyzer produces them
///
/// The first write error is kept and returned by [`FlagPrinter::finish`];
/// later flags are dropped.
pub struct FlagPrinter<W: Write> {
    writer: W,
    format: OutputFormat,
    printed: usize,
    error: Option<io::Error>,
}

impl<W: Write> FlagPrinter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            printed: 0,
            error: None,
        }
    }

    fn write_flag(&mut self, flag: &Flag) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", format_flag(flag)),
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, flag)?;
                self.writer.write_all(b"\n")
            }
        }
    }

    /// Flush and report how many flags were written
    pub fn finish(mut self) -> io::Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.printed)
    }
}

impl<W: Write> FlagSink for FlagPrinter<W> {
    fn emit(&mut self, flag: Flag) {
        if self.error.is_some() {
            return;
        }
        match self.write_flag(&flag) {
            Ok(()) => self.printed += 1,
            Err(e) => self.error = Some(e),
        }
    }
}
