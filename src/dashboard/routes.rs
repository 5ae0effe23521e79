use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::llm::LlmEngine;

use super::handlers;

/// Specs are embedded whole in prompts; allow bodies well past axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// State shared across all routes.
#[derive(Clone)]
pub struct DashState {
    pub engine: Arc<LlmEngine>,
    pub config: Config,
}

pub fn build(engine: Arc<LlmEngine>, config: Config) -> Router {
    let cors = cors_layer(&config.cors_allowed_origins);
    let state = DashState { engine, config };

    Router::new()
        // UI
        .route("/", get(serve_index))
        // API
        .route("/api/generate-docs", post(handlers::generate_docs))
        .route("/api/chat/opening", get(handlers::chat_opening))
        .route("/api/chat/reply", post(handlers::chat_reply))
        .route("/api/status", get(handlers::get_status))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    info!(origins = origins.len(), "CORS restricted to configured origins");
    base.allow_origin(AllowOrigin::list(origins))
}

async fn serve_index() -> axum::response::Html<&'static str> {
    axum::response::Html(include_str!("ui/index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{engine, StubBackend};

    #[test]
    fn router_builds_with_and_without_origins() {
        let stub = Arc::new(engine(Arc::new(StubBackend::new(""))));
        let _ = build(stub.clone(), Config::default());

        let mut config = Config::default();
        config.cors_allowed_origins = vec!["http://localhost:5173".into(), "bad\norigin".into()];
        let _ = build(stub, config);
    }

    #[tokio::test]
    async fn index_is_the_form() {
        let html = serve_index().await.0;
        assert!(html.contains("/api/generate-docs"));
        assert!(html.contains("/api/chat/opening"));
        assert!(html.contains("/api/chat/reply"));
    }
}
