//! slurm-stream server binary.
//!
//! Loads configuration from the environment, connects to `slurmrestd`, and
//! serves the WebSocket and SSE endpoints until interrupted.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use slurm_stream::adapters::http::build_router;
use slurm_stream::adapters::slurm_rest::SlurmRestClient;
use slurm_stream::adapters::streaming::StreamHub;
use slurm_stream::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    setup_logging(&config.server);
    config.validate()?;

    let client = Arc::new(SlurmRestClient::new(config.slurm.rest_config())?);
    let hub = StreamHub::from_source(client, config.watch.stream_settings());
    let app = build_router(hub, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        slurm = %config.slurm.base_url,
        api_version = %config.slurm.api_version,
        "slurm-stream listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

/// JSON logs in production, human-readable text otherwise.
/// `RUST_LOG` overrides the configured filter.
fn setup_logging(server: &ServerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true);
    if server.is_production() {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to setup signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
