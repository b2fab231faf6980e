use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tempstat_core::{Config, Controller, FetchError, FetchOutcome};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "tempstat",
    version,
    about = "Historical temperature summary for a city"
)]
pub struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `interactive` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenCage geocoding API key.
    Configure,

    /// Fetch, summarize and export one city and date range.
    Fetch {
        /// City or place name.
        #[arg(long)]
        city: String,

        /// First day, YYYY-MM-DD.
        #[arg(long)]
        start: String,

        /// Last day (inclusive), YYYY-MM-DD.
        #[arg(long)]
        end: String,

        /// Also save the chart to this path (.png or .svg).
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// Prompt for queries until you quit.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(),
            Command::Fetch {
                city,
                start,
                end,
                chart,
            } => {
                let config = Config::load()?;
                let mut controller = Controller::from_config(&config)?;

                let outcome = controller
                    .fetch(&city, &start, &end)
                    .await
                    .map_err(describe)?;
                print_outcome(&outcome);

                if let Some(path) = chart {
                    let saved = controller.save_chart(&path).map_err(describe)?;
                    println!("Chart saved to: {}", saved.display());
                }
                Ok(())
            }
            Command::Interactive => {
                let config = Config::load()?;
                let controller = Controller::from_config(&config)?;
                interactive::run(controller).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenCage API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.set_api_key(api_key.to_string());

    let timezone = Text::new("Reporting timezone:")
        .with_default(&config.weather.timezone)
        .prompt()
        .context("Failed to read timezone")?;
    config.weather.timezone = timezone.trim().to_string();

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

/// Prefix the error with its message-box style title.
pub fn describe(err: FetchError) -> anyhow::Error {
    anyhow!("{}: {err}", err.kind().title())
}

pub fn print_outcome(outcome: &FetchOutcome) {
    println!("{}", outcome.result_text());
    println!("Location: {}", outcome.coordinates);
    println!(
        "Saved {} and {}",
        outcome.files.csv.display(),
        outcome.files.summary.display()
    );
}
