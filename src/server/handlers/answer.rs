use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::rag::{QueryRequest, QueryResponse};
use crate::state::AppState;

const BAD_BODY_MESSAGE: &str = "The request body must be a JSON object with a \"query\" string.";

/// `POST /answer_question`
///
/// Always replies with a `QueryResponse` body. The status code tells success
/// (200), an unusable request (400) and a failing downstream service (502)
/// apart.
pub async fn answer_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(QueryResponse::failure("request", BAD_BODY_MESSAGE)),
            )
                .into_response();
        }
    };

    match state.pipeline.run(&request.query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(QueryResponse::failed(&err))).into_response()
        }
    }
}
