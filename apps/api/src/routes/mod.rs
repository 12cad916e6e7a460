pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::assistant::handlers as assistant_handlers;
use crate::state::AppState;
use crate::storage::handlers as storage_handlers;
use crate::workflow::handlers as workflow_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Persona
        .route(
            "/api/v1/profile",
            get(storage_handlers::handle_get_profile).put(storage_handlers::handle_save_profile),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(storage_handlers::handle_list_applications)
                .post(workflow_handlers::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id",
            delete(storage_handlers::handle_delete_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(storage_handlers::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/artifacts/:key",
            get(assistant_handlers::handle_download_artifact),
        )
        // Assistant
        .route("/api/v1/chat", post(assistant_handlers::handle_chat))
        .with_state(state)
}
