//! Registry manager CLI
//!
//! Creates registry indices, loads data dictionaries into the Field Registry,
//! and loads documents with on-demand mapping updates.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config_handlers;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, normalize_args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_tracing(cli.verbose);

    commands::execute(cli).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
