//! HTTP request handlers

use super::types::{
    CreateInterviewResponse, ErrorResponse, InterviewResponse, MessageRequest, MessageResponse,
    ModelsResponse,
};
use super::AppState;
use crate::store::FileSnapshotStore;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Longest candidate message accepted, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Interview lifecycle
        .route("/api/interviews", post(create_interview))
        .route("/api/interviews/:id", get(get_interview))
        .route("/api/interviews/:id/messages", post(send_message))
        .route("/api/interviews/:id/snapshot", get(download_snapshot))
        // Model info
        .route("/api/models", get(list_models))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Interviews
// ============================================================

async fn create_interview(State(state): State<AppState>) -> Json<CreateInterviewResponse> {
    let (id, outcome) = state.sessions.start().await;
    Json(CreateInterviewResponse {
        id,
        reply: outcome.reply,
        stage: outcome.stage,
    })
}

async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InterviewResponse>, AppError> {
    let session = state
        .sessions
        .session(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview not found: {id}")))?;
    Ok(Json(InterviewResponse {
        total_score: session.total_score(),
        session,
    }))
}

/// A failed turn still answers 200 with the fallback reply; an ended interview is 404
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message is longer than {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let (outcome, session) = state
        .sessions
        .send(&id, text)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview not found or already ended: {id}")))?;

    Ok(Json(MessageResponse {
        reply: outcome.reply,
        stage: outcome.stage,
        session,
    }))
}

async fn download_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = state
        .sessions
        .session(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview not found: {id}")))?;

    let snapshot = session.snapshot();
    let body =
        serde_json::to_string_pretty(&snapshot).map_err(|e| AppError::Internal(e.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        FileSnapshotStore::file_name(&snapshot)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

// ============================================================
// Models & Version
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.llm_registry.available_model_info(),
        default: state.llm_registry.default_model_id().to_string(),
        active: state.sessions.runtime().model_id().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("talent-scout ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
