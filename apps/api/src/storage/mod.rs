//! Record Store — the persistence port for the persona and application list.
//!
//! The core never touches a database directly: the workflow returns a record
//! and the handlers persist it through `Arc<dyn RecordStore>`. Swapping the
//! backend (Postgres in production, in-memory in tests) touches nothing else.

pub mod handlers;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ApplicationRecord, Persona};

/// Storage capabilities: whole-record persona overwrite, newest-first
/// application list with upsert-or-append save, filter-style delete.
/// No transactions; concurrent saves are last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the stored persona, or the empty default if none was saved yet.
    async fn get_persona(&self) -> Result<Persona, AppError>;

    /// Overwrites the persona wholesale.
    async fn save_persona(&self, persona: &Persona) -> Result<(), AppError>;

    /// Returns all applications, newest first.
    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>, AppError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError>;

    /// Updates the record in place when the id exists, otherwise prepends it.
    async fn save_application(&self, record: &ApplicationRecord) -> Result<(), AppError>;

    /// Removes the record with the given id. Deleting an unknown id is a no-op.
    async fn delete_application(&self, id: Uuid) -> Result<(), AppError>;
}
