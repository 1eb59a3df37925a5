//! chisel-sync - pull a Chisel site into a JSON node graph

mod config;

use clap::Parser;
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chisel_source::{MemoryStore, ParseBackend, SourceOrchestrator};
use config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chisel_source={0},chisel_sync={0},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.source_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Server: {}", config.server_url);
    info!("Site: {}", config.site_id);
    info!("Type prefix: {}", config.type_name);
    info!("Environment: {}", config.environment);

    let backend = ParseBackend::new(&config)?;
    let store = MemoryStore::new();

    let report = SourceOrchestrator::new(&backend, &store, &config).run().await?;

    for (type_name, count) in &report.nodes_emitted {
        info!("  {}: {} node(s)", type_name, count);
    }
    if !report.faults.is_empty() {
        info!("{} field(s) degraded to null", report.faults.len());
    }

    let graph = serde_json::to_string_pretty(&store.snapshot().await)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, graph)?;
            info!("Wrote {} node(s) to {}", report.total_nodes(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(graph.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
