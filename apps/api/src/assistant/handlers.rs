//! Axum route handlers for the assistant chat and artifact downloads.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assistant::directives::{artifact_filename, parse_reply, ReplySegment};
use crate::assistant::AssistantSession;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The raw reply, download tokens included.
    pub reply: String,
    /// The reply split into literal text and download directives, in order.
    pub segments: Vec<ReplySegment>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub label: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
///
/// One assistant turn. The session is created on the first call, seeded with
/// the application list as it stands at that moment.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let mut guard = state.assistant.lock().await;
    if guard.is_none() {
        let records = state.store.list_applications().await?;
        info!("Initializing assistant session with {} records", records.len());
        *guard = Some(AssistantSession::init(&state.llm, &records));
    }
    let session = guard.as_mut().expect("assistant session initialized above");

    let reply = session.ask(&request.message).await;
    let segments = parse_reply(&reply);

    Ok(Json(ChatResponse { reply, segments }))
}

/// GET /api/v1/applications/:id/artifacts/:key?label=
///
/// Resolves a download directive against the store. An unknown application
/// or an unknown/empty artifact is an explicit not-found, never a silent
/// no-op. The filename is deterministic: `{companyName}_{label}.{ext}`.
pub async fn handle_download_artifact(
    State(state): State<AppState>,
    Path((id, artifact_key)): Path<(Uuid, String)>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let record = state
        .store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let content = record
        .artifacts
        .get(&artifact_key)
        .ok_or_else(|| {
            AppError::NotFound(format!("No '{artifact_key}' file for application {id}"))
        })?
        .to_string();

    let label = query.label.unwrap_or_else(|| artifact_key.clone());
    let filename = artifact_filename(&record.company_name, &artifact_key, &label);

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        content,
    )
        .into_response())
}
