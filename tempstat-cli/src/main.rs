//! Binary crate for the `tempstat` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts standing in for the input form
//! - Human-friendly output and error messages

use clap::Parser;

mod cli;
mod interactive;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A local .env may carry OPENCAGE_API_KEY.
    dotenvy::dotenv().ok();
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr so they never mix with the summary on stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
