use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use engine_logging::{engine_info, LevelFilter, LogDestination};
use harvester_server::{build_router, AppState, Archive};

#[derive(Parser, Debug)]
#[command(name = "harvester-server", about = "Reference summarization endpoint")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Append every accepted submission to this JSONL file.
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = LevelFilter::from_str(&args.log_level)
        .map_err(|_| anyhow!("unknown log level {:?}", args.log_level))?;
    let destination = match args.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level);

    let state = AppState {
        archive: args.archive.map(|path| Arc::new(Archive::new(path))),
    };
    if let Some(archive) = &state.archive {
        engine_info!("archiving submissions to {:?}", archive.path());
    }

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    engine_info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            engine_info!("shutting down");
        })
        .await
        .context("serving")?;
    Ok(())
}
