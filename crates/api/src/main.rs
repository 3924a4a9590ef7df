use anyhow::Context;

use bizops_api::{app, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizops_observability::init();

    let config = AppConfig::from_env();
    let services = app::build_services(&config).await?;
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
