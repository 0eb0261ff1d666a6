use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns the service version and which backends this process is using.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobpilot",
        "sources": state.pipeline.source_names(),
        "scorer": state.pipeline.scorer().backend(),
        "generator": state.pipeline.generator().label(),
    }))
}
