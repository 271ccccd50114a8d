use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "chain_ready": state.chain_ready().await,
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let kb_status = state.kb_status();
    let chain_error = state.chain().await.err().map(|err| {
        json!({ "kind": err.kind(), "message": err.message() })
    });

    Json(json!({
        "kb_status": kb_status,
        "kb_status_label": kb_status.label(),
        "chain_ready": chain_error.is_none(),
        "chain_error": chain_error,
        "chat_model": state.settings.groq_model_name,
        "embedding_model": state.settings.embedding_model_name,
        "started_at": state.started_at.to_rfc3339(),
        "settings": state.settings.redacted(),
    }))
}
