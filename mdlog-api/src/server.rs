use crate::handlers;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use mdlog_core::config::ServerConfig;
use mdlog_observability::MetricsCollector;
use mdlog_store::LogAppender;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for the HTTP API.
pub struct AppState {
    pub appender: LogAppender,
    pub metrics: MetricsCollector,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            appender: LogAppender::from_config(config),
            metrics: MetricsCollector::new(config.metrics.enabled)?,
            body_limit_bytes: config.body_limit_bytes,
        })
    }
}

/// Build the Axum router. Exposed so tests can drive it with `oneshot`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        .route("/log", post(handlers::log::save_log))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.listen_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on port {}", config.port);
    info!("Log files will be saved to: {}", config.log_file_path.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
