use axum::{
    extract::{Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::server::AppState;
use crate::query::{self, Request, Response};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct GraphqlParams {
    pub query: String,
    /// JSON-encoded variables object
    pub variables: Option<String>,
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerResult = Result<Json<Response>, (StatusCode, Json<ErrorResponse>)>;

pub async fn post_graphql(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Request>,
) -> HandlerResult {
    run(state, request).await
}

pub async fn get_graphql(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphqlParams>,
) -> HandlerResult {
    let variables = match params.variables.as_deref() {
        Some(raw) => Some(serde_json::from_str(raw).map_err(|e| {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: format!("Invalid variables: {}", e) }))
        })?),
        None => None,
    };

    let request = Request {
        query: params.query,
        variables,
        operation_name: params.operation_name,
    };
    run(state, request).await
}

/// Each execution owns its own session, opened on the blocking pool
async fn run(state: Arc<AppState>, request: Request) -> HandlerResult {
    let response = tokio::task::spawn_blocking(move || query::execute(&state.config, &request))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?;

    Ok(Json(response))
}
