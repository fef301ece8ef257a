//! hospital_server — REST server for hospital records.
//!
//! Configuration comes from the environment (and `.env`); see
//! `hospital_server::config` for the variables.

use anyhow::Context;
use hospital_server::config::ServerConfig;
use hospital_server::router::build_router;
use hospital_server::startup::build_service;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hospital_server=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let service = build_service(&config).await?;
    let app = build_router(service);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("hospital_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
