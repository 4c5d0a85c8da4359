use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, configured model and uptime.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let uptime = Utc::now() - state.started_at;
    Json(json!({
        "status": "healthy",
        "model": state.analyzer.model_name(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "smartmatch-api",
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": uptime.num_seconds()
    }))
}
