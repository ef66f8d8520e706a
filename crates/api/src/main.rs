use std::sync::Arc;

use anyhow::Context;

use agora_api::app::{build_app, services::build_services};
use agora_api::config::ApiConfig;
use agora_observability::LogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;

    agora_observability::init_with(&LogConfig {
        format: config.log_format,
        ..LogConfig::default()
    });

    let services = build_services(&config)
        .await
        .context("failed to build services")?;
    let app = build_app(&config, Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.use_persistent_stores,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
