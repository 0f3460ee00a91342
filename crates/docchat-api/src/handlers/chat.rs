use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::dto::{ChatQuery, ChatResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("Missing required query parameter 'query'"));
    }

    tracing::info!(query = %query, "Processing chat request");

    match state.pipeline.answer(&query).await {
        Ok(result) => Ok(Json(ChatResponse { query, response: result.answer })),
        Err(e) => {
            tracing::error!(error = %e, query = %query, "Chat request failed");
            Err(e.into())
        }
    }
}
