//! Analysis command handlers

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analysis::{RetainerAnalyzer, explore, summarize};
use crate::config::Config;
use crate::graph::{HeapDump, HeapGraph};
use crate::ingest::{SymbolTable, parse_snapshot};
use crate::report::{
    FlagPrinter, OutputFormat, render_summary, render_trees, write_json_lines,
};

/// Convert a raw snapshot log into the JSON interchange form
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Symbol table (`<address> <name>` per line)
    #[arg(long)]
    pub symbols: PathBuf,
    /// Snapshot log written by the dumper
    #[arg(long)]
    pub log: PathBuf,
    /// Output file
    #[arg(long, short = 'o', default_value = "dump.json")]
    pub output: PathBuf,
}

/// Show what points at closures of a kind
#[derive(Args, Debug)]
pub struct PredsArgs {
    /// Heap dump (JSON)
    pub dump: PathBuf,
    /// Kind to explore (overrides explore.targetKind)
    #[arg(long)]
    pub kind: Option<String>,
    /// Predecessor levels to show (overrides explore.depth)
    #[arg(long)]
    pub depth: Option<usize>,
    /// Output format (overrides output.format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Flag closures retaining many closures of a kind
#[derive(Args, Debug)]
pub struct RetainArgs {
    /// Heap dump (JSON)
    pub dump: PathBuf,
    /// Kind counted as retained (overrides retain.sentinelKind)
    #[arg(long)]
    pub sentinel: Option<String>,
    /// Flag threshold (overrides retain.threshold)
    #[arg(long)]
    pub threshold: Option<usize>,
    /// Longest traversal path (overrides retain.maxDepth)
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Output format (overrides output.format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Count closures and bytes per kind
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Heap dump (JSON)
    pub dump: PathBuf,
    /// Only show the largest N kinds
    #[arg(long)]
    pub top: Option<usize>,
    /// Output format (overrides output.format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Load a heap dump and build its graph
pub fn load_graph(path: &Path) -> Result<HeapGraph> {
    HeapDump::load(path)?
        .to_graph()
        .with_context(|| format!("Invalid heap dump: {}", path.display()))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Parse the symbol table and snapshot log, validate, and write the dump
pub fn run_convert(args: &ConvertArgs) -> Result<()> {
    let symbols = SymbolTable::parse(open(&args.symbols)?)
        .with_context(|| format!("Failed to parse symbol table: {}", args.symbols.display()))?;
    let snapshot = parse_snapshot(open(&args.log)?, &symbols)
        .with_context(|| format!("Failed to parse snapshot log: {}", args.log.display()))?;

    let graph = snapshot
        .into_graph()
        .with_context(|| format!("Inconsistent snapshot: {}", args.log.display()))?;
    HeapDump::from_graph(&graph).save(&args.output)?;

    println!(
        "Wrote {} closure(s), {} edge(s), {} root(s) to {}",
        graph.len(),
        graph.edge_count(),
        graph.roots().len(),
        args.output.display()
    );
    Ok(())
}

/// Print predecessor trees for the configured target kind
pub fn run_preds(args: &PredsArgs, config: &Config) -> Result<()> {
    let kind = args
        .kind
        .as_deref()
        .or(config.explore.target_kind.as_deref())
        .context("No target kind given: pass --kind or set explore.targetKind")?;
    let depth = args.depth.unwrap_or(config.explore.depth);
    let format = args.format.unwrap_or(config.output.format);

    let graph = load_graph(&args.dump)?;
    let trees = explore(&graph, kind, depth)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match format {
        OutputFormat::Text => {
            out.write_all(render_trees(&trees).as_bytes())?;
            out.flush()?;
        }
        OutputFormat::Json => write_json_lines(&trees, out)?,
    }
    Ok(())
}

/// Stream retainer flags for the configured sentinel kind
pub fn run_retain(args: &RetainArgs, config: &Config) -> Result<()> {
    let kind = args
        .sentinel
        .as_deref()
        .or(config.retain.sentinel_kind.as_deref())
        .context("No sentinel kind given: pass --sentinel or set retain.sentinelKind")?;
    let threshold = args.threshold.unwrap_or(config.retain.threshold);
    let max_depth = args.max_depth.unwrap_or(config.retain.max_depth);
    let format = args.format.unwrap_or(config.output.format);

    let graph = load_graph(&args.dump)?;
    let mut analyzer = RetainerAnalyzer::new(&graph, kind, threshold)?.with_max_depth(max_depth);

    let stdout = std::io::stdout();
    let mut printer = FlagPrinter::new(BufWriter::new(stdout.lock()), format);
    let stats = analyzer.run_roots(&mut printer)?;
    printer.finish().context("Failed to write flags")?;

    tracing::debug!(
        "Analyzed {} root(s) over {} closure(s)",
        stats.roots,
        graph.len()
    );
    Ok(())
}

/// Print the kind histogram
pub fn run_summary(args: &SummaryArgs, config: &Config) -> Result<()> {
    let format = args.format.unwrap_or(config.output.format);

    let graph = load_graph(&args.dump)?;
    let mut stats = summarize(&graph);
    if let Some(top) = args.top {
        stats.truncate(top);
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match format {
        OutputFormat::Text => {
            out.write_all(render_summary(&stats).as_bytes())?;
            out.flush()?;
        }
        OutputFormat::Json => write_json_lines(&stats, out)?,
    }
    Ok(())
}
