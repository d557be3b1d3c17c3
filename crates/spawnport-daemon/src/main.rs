//! spawnport-daemon - session port registration daemon.
//!
//! Loads the TOML config, builds the in-memory registry and token
//! authenticator, and serves the HTTP API until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use spawnport_core::auth::StaticTokenAuthenticator;
use spawnport_core::config::ServiceConfig;
use spawnport_core::registry::InMemoryPortRegistry;
use spawnport_daemon::handlers::router;
use spawnport_daemon::state::AppState;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// spawnport daemon - session port registration service
#[derive(Parser, Debug)]
#[command(name = "spawnport-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to service configuration file
    #[arg(short, long, default_value = "spawnport.toml")]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = ServiceConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    let authenticator = StaticTokenAuthenticator::from_entries(config.token_entries())
        .context("invalid session token table")?;
    info!(sessions = authenticator.len(), "session tokens provisioned");

    let registry = Arc::new(InMemoryPortRegistry::new());
    let state = Arc::new(AppState::new(
        registry,
        Arc::new(authenticator),
        config.daemon.operator_token.clone(),
    ));
    let app = router(state);

    let addr = args.bind.unwrap_or(config.daemon.bind_addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "spawnport daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("spawnport daemon stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            // Fall back to SIGINT only.
            warn!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            info!("SIGINT received, shutting down");
            return;
        },
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
    }
}
