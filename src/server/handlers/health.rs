use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pipeline = &state.pipeline;
    Json(json!({
        "status": "ok",
        "embedder": pipeline.embedder_name(),
        "retriever": pipeline.retriever_name(),
        "vector_store": state.settings.vector_store.provider.as_str(),
        "generator": pipeline.generator_name(),
        "top_k": pipeline.top_k(),
    }))
}
