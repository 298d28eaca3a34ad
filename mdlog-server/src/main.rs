// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  mdlog — append JSON error reports to a Markdown log
//
//  HTTP:    axum on the tokio multi-thread runtime
//  Storage: <LOG_FILE_PATH>/error_log.md, append-only
//  Config:  defaults < YAML file < MDLOG_* env < PORT / LOG_FILE_PATH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use mdlog_api::AppState;
use mdlog_core::config::ServerConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mdlog", version, about = "Append JSON error reports to a Markdown log")]
struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, default_value = "mdlog.yaml")]
    config: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "mdlog starting");

    // ── Config ──
    let config_file = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        Some(cli.config.as_path())
    } else {
        info!("No config file found, using defaults and environment");
        None
    };
    let config = ServerConfig::load(config_file)?;

    // ── State ──
    let state = Arc::new(AppState::new(&config)?);
    if state.metrics.is_enabled() {
        info!("Prometheus metrics enabled at /metrics");
    }

    mdlog_api::start(&config, state, shutdown_signal()).await?;

    info!("mdlog stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM (docker stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
