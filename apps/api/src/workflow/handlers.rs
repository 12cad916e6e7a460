//! Axum route handler for the generation workflow.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use crate::errors::AppError;
use crate::models::ApplicationRecord;
use crate::state::AppState;
use crate::workflow::{process_application, JobImage};

/// POST /api/v1/applications
///
/// Multipart upload of a job-posting screenshot. Validates the persona before
/// any network exchange, drives the six-step run, and persists the record
/// once, fully formed; a failed run stores nothing.
pub async fn handle_create_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApplicationRecord>, AppError> {
    let mut image: Option<JobImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read image field: {e}")))?
                .to_vec();
            image = Some(JobImage::new(mime_type, data)?);
        }
    }

    let image = image.ok_or_else(|| {
        AppError::Validation("No job posting image was uploaded.".to_string())
    })?;

    let persona = state.store.get_persona().await?;
    if !persona.is_ready_for_generation() {
        return Err(AppError::Validation(
            "Please set up your Persona in the Profile tab first.".to_string(),
        ));
    }

    let record = process_application(&state.llm, image, &persona, |step| {
        info!(step = ?step, "Workflow progress");
    })
    .await?;

    state.store.save_application(&record).await?;
    info!(
        "Application {} created for company {}",
        record.id, record.company_name
    );

    Ok(Json(record))
}
