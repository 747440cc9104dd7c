//! tokenward - drive an application session from the terminal.
//!
//! A thin wrapper over the `tokenward` library: log in, inspect the stored
//! credential, send authenticated requests with transparent refresh, and
//! log out. State persists in a JSON file under the data directory so that
//! consecutive invocations share one session.

mod cli;
mod commands;
mod output;
mod session;

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use session::SessionContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);
    debug!(version = env!("TOKENWARD_VERSION"), base_url = %cli.base_url, "Starting");

    let ctx = SessionContext::new(&cli.base_url, cli.data_dir.as_deref())?;
    commands::handle(cli.command, &ctx).await
}

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info,tokenward=debug",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr so stdout stays clean for response bodies and JSON.
fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let layer = fmt::layer().with_writer(io::stderr).with_target(false);
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(layer.json()).init();
    } else {
        registry
            .with(layer.with_ansi(io::stderr().is_terminal()))
            .init();
    }
}
