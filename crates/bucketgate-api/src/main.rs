//! Bucketgate API Server
//!
//! HTTP gateway that uploads, deletes and downloads objects in allow-listed
//! buckets.

use anyhow::Context;
use bucketgate_api::bootstrap;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "bucketgate", version, about = "Authenticated upload gateway for object storage")]
struct Args {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "BUCKETGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment (load .env, etc.)
    let env_file = bucketgate_common::initialize_environment();

    let args = Args::parse();

    let mut config = bootstrap::load_configuration(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    bootstrap::init_tracing(&config.telemetry).map_err(|e| anyhow::anyhow!(e))?;

    info!("Starting bucketgate API server...");
    if let Some(path) = env_file {
        info!(path = %path.display(), "Loaded environment file");
    }
    info!("Configuration loaded: {:?}", config);

    let app = bootstrap::build_app(&config)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize application")?;

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown..."),
        () = terminate => info!("Received terminate signal, starting graceful shutdown..."),
    }
}
