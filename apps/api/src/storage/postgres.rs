//! Postgres-backed record store. Records are stored as whole JSONB documents
//! so retrieval is a faithful passthrough of what was saved.

use async_trait::async_trait;
use anyhow::anyhow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ApplicationRecord, Persona};
use crate::storage::RecordStore;

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get_persona(&self) -> Result<Persona, AppError> {
        let row = sqlx::query("SELECT data FROM persona WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data")?;
                serde_json::from_value(data)
                    .map_err(|e| AppError::Internal(anyhow!("Stored persona is unreadable: {e}")))
            }
            None => Ok(Persona::default()),
        }
    }

    async fn save_persona(&self, persona: &Persona) -> Result<(), AppError> {
        let data = serde_json::to_value(persona)
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize persona: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO persona (id, data) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>, AppError> {
        let rows = sqlx::query("SELECT data FROM applications ORDER BY date_created DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.try_get("data")?;
                serde_json::from_value(data)
                    .map_err(|e| AppError::Internal(anyhow!("Stored application is unreadable: {e}")))
            })
            .collect()
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        let row = sqlx::query("SELECT data FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: serde_json::Value = row.try_get("data")?;
                let record = serde_json::from_value(data)
                    .map_err(|e| AppError::Internal(anyhow!("Stored application is unreadable: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn save_application(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        let data = serde_json::to_value(record)
            .map_err(|e| AppError::Internal(anyhow!("Failed to serialize application: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO applications (id, data, date_created) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(record.id)
        .bind(data)
        .bind(record.date_created)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
