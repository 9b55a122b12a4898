//! System metrics gRPC server binary entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sysmetrics_store::config::ServiceConfig;
use sysmetrics_store::env::Environment;
use sysmetrics_store::ingest::IngestionService;
use sysmetrics_store::metadata::{FileMetadataStore, MemoryMetadataStore, MetadataStore};
use sysmetrics_store::rpc;

/// Serve system metrics ingestion over gRPC.
#[derive(Debug, Parser)]
#[command(name = "sysmetrics-server", version)]
struct CliArgs {
    /// Path to the YAML service config.
    #[arg(long, short)]
    config: PathBuf,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:2289")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = ServiceConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    tracing::info!("Starting with config: {:?}", config);

    match config.metadata_path.clone() {
        Some(path) => {
            let store = FileMetadataStore::open(&path)
                .await
                .with_context(|| format!("opening metadata store {path}"))?;
            run(Environment::new(store, config), args.addr).await
        }
        None => run(Environment::new(MemoryMetadataStore::new(), config), args.addr).await,
    }
}

async fn run<M: MetadataStore + 'static>(env: Environment<M>, addr: SocketAddr) -> anyhow::Result<()> {
    let env = Arc::new(env);
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        }
        signal.cancel();
    });

    let served = rpc::serve(IngestionService::new(Arc::clone(&env)), addr, shutdown).await;
    env.teardown().await.context("tearing down environment")?;
    served.context("serving gRPC")
}
