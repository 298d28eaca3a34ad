use crate::server::AppState;
use axum::extract::State;
use std::sync::Arc;

/// Prometheus metrics endpoint handler.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
