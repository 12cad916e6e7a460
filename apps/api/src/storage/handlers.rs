//! Axum route handlers for the persona and the application list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ApplicationRecord, ApplicationStatus, Persona};
use crate::state::AppState;

/// GET /api/v1/profile
///
/// Returns the stored persona, or the empty default if none was saved yet.
pub async fn handle_get_profile(
    State(state): State<AppState>,
) -> Result<Json<Persona>, AppError> {
    Ok(Json(state.store.get_persona().await?))
}

/// PUT /api/v1/profile
///
/// Whole-record overwrite; no merge, no history.
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(persona): Json<Persona>,
) -> Result<Json<Persona>, AppError> {
    state.store.save_persona(&persona).await?;
    Ok(Json(persona))
}

/// GET /api/v1/applications
///
/// Newest-first list of all application records.
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationRecord>>, AppError> {
    Ok(Json(state.store.list_applications().await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// PATCH /api/v1/applications/:id/status
///
/// The only mutation a stored record supports. Everything else about a
/// record is immutable once the workflow has produced it.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let mut record = state
        .store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    record.status = request.status;
    state.store.save_application(&record).await?;

    Ok(Json(record))
}

/// DELETE /api/v1/applications/:id
///
/// Filter-style removal; deleting an unknown id succeeds quietly.
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_application(id).await?;
    info!("Application {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}
