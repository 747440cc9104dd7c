//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Session client for applications using short-lived bearer credentials.
#[derive(Parser, Debug)]
#[command(name = "tokenward")]
#[command(author, version = env!("TOKENWARD_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Application base URL
    #[arg(
        long,
        global = true,
        env = "TOKENWARD_BASE_URL",
        default_value = "http://localhost:5000"
    )]
    pub base_url: String,

    /// Directory holding the session file
    #[arg(long, global = true, env = "TOKENWARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
