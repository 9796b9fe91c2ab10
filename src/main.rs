//! heaptrace - retention analysis for heap snapshots
//!
//! Converts raw snapshot logs into a JSON heap dump and runs the predecessor
//! and retainer analyses over it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use heaptrace::cli::{self, ConfigSubcommand, ConvertArgs, PredsArgs, RetainArgs, SummaryArgs};
use heaptrace::config::ConfigLoader;
use std::path::PathBuf;

/// heaptrace - retention analysis for heap snapshots
#[derive(Parser, Debug)]
#[command(name = "heaptrace")]
#[command(about = "Retention analysis for heap snapshots", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Extra configuration file, layered over the root config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a symbol table and snapshot log into a heap dump
    Convert(ConvertArgs),
    /// Show predecessor trees of closures of a kind
    Preds(PredsArgs),
    /// Flag closures that retain many closures of a kind
    Retain(RetainArgs),
    /// Count closures and bytes per kind
    Summary(SummaryArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = cli::init_logging(args.debug)?;

    // Print log file location to stderr so it stays out of the report
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    let explicit = args.config.as_deref();

    match args.command {
        Command::Config { subcommand } => cli::handle_config_command(subcommand, explicit),
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        Command::Convert(convert) => cli::run_convert(&convert),
        Command::Preds(preds) => {
            let config = ConfigLoader::load(explicit)?;
            cli::run_preds(&preds, &config)
        }
        Command::Retain(retain) => {
            let config = ConfigLoader::load(explicit)?;
            cli::run_retain(&retain, &config)
        }
        Command::Summary(summary) => {
            let config = ConfigLoader::load(explicit)?;
            cli::run_summary(&summary, &config)
        }
    }
}
