use anyhow::Context;
use pagewatch_core::AppConfig;
use pagewatch_service::{init_tracing, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Pagewatch v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let state = AppState::from_config(config).await?;

    info!(
        audit_endpoint = %state.config.audit.endpoint,
        environment = ?state.config.general.environment,
        "pipeline ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutting down");
    state.shutdown().await;
    Ok(())
}
