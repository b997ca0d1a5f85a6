use anyhow::Context;

use adminhub_api::app::{build_app, services};
use adminhub_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    adminhub_observability::init(&config.log);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let state = services::build_state(&config)
        .await
        .context("failed to initialize stores")?;
    services::prepare(&state, config.bootstrap_admin_email.as_ref())
        .await
        .context("failed to prepare stores")?;

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
