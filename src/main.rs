use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use signal_hub::config::HubConfig;
use signal_hub::hub::Hub;

#[tokio::main]
async fn main() -> Result<()> {
    let config = HubConfig::parse();

    let json_logs = config.log_json;
    let filter = EnvFilter::from_default_env().add_directive("signal_hub=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(addr = %config.listen_addr, path = %config.signaling_path, "starting signaling hub");

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    let hub = Hub::new(config);
    let app = signal_hub::web::build_router(hub.clone());

    let shutdown_hub = hub.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("ctrl-c received, signaling sessions to shut down");
            shutdown_hub.shutdown();
        })
        .await
        .context("server error")
}
