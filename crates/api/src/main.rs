use anyhow::{Context, Result};
use relief_api::{build_app, ServiceConfig};
use relief_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env();
    init_tracing("relief_api", config.log_dir.as_deref());

    let app = build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        responses = %config.responses_path.display(),
        model = %config.model_path.display(),
        "relief desk api started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
