mod app;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, Overrides};

#[derive(Parser, Debug)]
#[command(
    name = "tab-harvester",
    about = "Summarizes and closes idle background tabs",
    version
)]
struct Cli {
    /// RON configuration file; defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the agent and harvest whenever the user goes idle.
    Run,
    /// Run one harvest cycle now and print its summary.
    HarvestOnce,
    /// Read or change the persisted idle threshold.
    Threshold {
        #[command(subcommand)]
        action: ThresholdAction,
    },
}

#[derive(Subcommand, Debug)]
enum ThresholdAction {
    Get,
    Set { secs: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply(&cli.overrides);
    engine_logging::initialize(config.log_destination(), config.log_level()?);

    match cli.command {
        Command::Run => app::run(config).await,
        Command::HarvestOnce => app::harvest_once(config).await,
        Command::Threshold { action } => match action {
            ThresholdAction::Get => app::threshold_get(&config),
            ThresholdAction::Set { secs } => app::threshold_set(&config, secs),
        },
    }
}
