//! Gripe MCP Server
//!
//! Lets AI agents file and query complaints via Model Context Protocol

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gripe_core::{
    CachedRepository, ComplaintRepository, ComplaintService, ComplaintStore, ConfigLoader,
};
use gripe_mcp_adapter::GripeMcpServer;

#[derive(Parser)]
#[command(name = "gripe-mcp")]
#[command(about = "Gripe MCP Server - complaint box for AI agents")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $GRIPE_CONFIG, ./gripe.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding complaint records, overrides the config file
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Starting Gripe MCP Server...");

    let loader = match cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().context("failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    let store = ComplaintStore::open(&config.storage.data_dir, config.storage.layout)
        .await
        .with_context(|| format!("failed to open {}", config.storage.data_dir.display()))?;
    let repo = Arc::new(CachedRepository::new(store, config.cache.clone())?);

    let loaded = repo
        .warm_cache(&CancellationToken::new())
        .await
        .context("failed to warm complaint cache")?;
    info!(
        loaded,
        capacity = config.cache.max_entries,
        data_dir = %config.storage.data_dir.display(),
        "complaint store ready"
    );

    let service = Arc::new(ComplaintService::new(repo, &config.server));
    let server = GripeMcpServer::new(service, config.server.query_timeout());

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            shutdown.cancel();
        }
    });

    server.run_stdio().await?;

    Ok(())
}
