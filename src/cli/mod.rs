//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod config;
mod logging;
mod version;

pub use commands::{
    ConvertArgs, PredsArgs, RetainArgs, SummaryArgs, load_graph, run_convert, run_preds,
    run_retain, run_summary,
};
pub use config::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use version::display_version;
