//! API routes
//!
//! Thin proxies in front of the answering backend, plus the document files
//! citation links point at.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::backend::{AskRequest, BackendClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AskBody {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
}

/// Errors reported to the browser; details stay in the logs.
#[derive(Debug)]
pub enum ApiError {
    MissingFields,
    SessionFailed,
    AnswerFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "Session ID and question are required",
            ),
            ApiError::SessionFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session"),
            ApiError::AnswerFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to get response"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn create_session(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .backend
        .post_json("create_session", &json!({}))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error creating session: {}", e);
            ApiError::SessionFailed
        })
}

async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<Value>, ApiError> {
    let non_empty = |field: Option<String>| field.filter(|value| !value.is_empty());
    let (Some(session_id), Some(question)) = (non_empty(body.session_id), non_empty(body.question))
    else {
        return Err(ApiError::MissingFields);
    };

    state
        .backend
        .post_json("ask", &AskRequest { session_id, question })
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error asking question: {}", e);
            ApiError::AnswerFailed
        })
}

pub fn router(pdf_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/create_session", post(create_session))
        .route("/api/ask", post(ask))
        .nest_service("/pdfs", ServeDir::new(pdf_dir))
}
