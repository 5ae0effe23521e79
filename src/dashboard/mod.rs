pub mod handlers;
pub mod routes;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::error::{DocSynthError, Result};
use crate::llm::LlmEngine;

pub async fn serve(
    config: Config,
    engine: Arc<LlmEngine>,
    shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let bind = config.bind.clone();
    let app = routes::build(engine, config);
    serve_plain(app, &bind, shutdown).await
}

async fn serve_plain(
    app: axum::Router,
    bind: &str,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| DocSynthError::Config(format!("failed to bind {bind}: {e}")))?;

    info!(bind = %bind, "doc-synth listening (HTTP)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
