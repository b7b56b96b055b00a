//! Entry point for tether, a terminal agent that drives a remote desktop.
//!
//! This binary loads environment variables, sets up logging, parses CLI
//! arguments via [`cli`], and dispatches to the chosen subcommand.

mod agent;
mod chat;
mod cli;
mod config;
mod constants;
mod format;
mod logging;
mod message;
mod output;
mod provider;
mod remote;
mod tools;

use anyhow::Result;

/// Runs the tether CLI.
///
/// Loads `.env` files (silently ignored if absent) before anything reads
/// the environment.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    logging::init(cli.verbose);
    cli::run(cli).await
}
