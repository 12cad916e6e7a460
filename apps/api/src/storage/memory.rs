//! In-memory record store. The test double for everything above the port:
//! newest-first list, update-in-place-or-prepend save, filter-style delete.

use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ApplicationRecord, Persona};
use crate::storage::RecordStore;

#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    persona: Option<Persona>,
    applications: Vec<ApplicationRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_persona(&self) -> Result<Persona, AppError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.persona.clone().unwrap_or_default())
    }

    async fn save_persona(&self, persona: &Persona) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.persona = Some(persona.clone());
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRecord>, AppError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.applications.clone())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn save_application(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.applications.iter_mut().find(|a| a.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => inner.applications.insert(0, record.clone()),
        }
        Ok(())
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.applications.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, ArtifactBundle, MatchMetrics};
    use chrono::Utc;

    fn make_record(company: &str) -> ApplicationRecord {
        ApplicationRecord {
            id: Uuid::new_v4(),
            company_name: company.to_string(),
            job_summary: "A role.".to_string(),
            date_created: Utc::now(),
            status: ApplicationStatus::Draft,
            metrics: MatchMetrics::default(),
            artifacts: ArtifactBundle::default(),
        }
    }

    #[tokio::test]
    async fn test_persona_round_trip_is_deep_equal() {
        let store = MemoryRecordStore::new();
        let persona = Persona {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            extra_info: "background".to_string(),
            ..Default::default()
        };

        store.save_persona(&persona).await.unwrap();
        assert_eq!(store.get_persona().await.unwrap(), persona);
    }

    #[tokio::test]
    async fn test_unsaved_persona_reads_as_empty_default() {
        let store = MemoryRecordStore::new();
        assert_eq!(store.get_persona().await.unwrap(), Persona::default());
    }

    #[tokio::test]
    async fn test_persona_save_overwrites_wholesale() {
        let store = MemoryRecordStore::new();
        store
            .save_persona(&Persona {
                name: "Ada".to_string(),
                phone: "+44".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .save_persona(&Persona {
                name: "Grace".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let persona = store.get_persona().await.unwrap();
        assert_eq!(persona.name, "Grace");
        assert_eq!(persona.phone, "", "stale fields must not survive overwrite");
    }

    #[tokio::test]
    async fn test_new_applications_are_listed_newest_first() {
        let store = MemoryRecordStore::new();
        let first = make_record("First Corp");
        let second = make_record("Second Corp");

        store.save_application(&first).await.unwrap();
        store.save_application(&second).await.unwrap();

        let listed = store.list_applications().await.unwrap();
        assert_eq!(listed[0].company_name, "Second Corp");
        assert_eq!(listed[1].company_name, "First Corp");
    }

    #[tokio::test]
    async fn test_saving_existing_id_updates_in_place() {
        let store = MemoryRecordStore::new();
        let mut record = make_record("Acme");
        store.save_application(&record).await.unwrap();

        record.status = ApplicationStatus::Applied;
        store.save_application(&record).await.unwrap();

        let listed = store.list_applications().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ApplicationStatus::Applied);
    }

    #[tokio::test]
    async fn test_application_round_trip_is_deep_equal() {
        let store = MemoryRecordStore::new();
        let record = make_record("Acme");
        store.save_application(&record).await.unwrap();
        assert_eq!(store.get_application(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_delete_removes_only_the_given_id() {
        let store = MemoryRecordStore::new();
        let keep = make_record("Keep Corp");
        let drop = make_record("Drop Corp");
        store.save_application(&keep).await.unwrap();
        store.save_application(&drop).await.unwrap();

        store.delete_application(drop.id).await.unwrap();

        let listed = store.list_applications().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_a_no_op() {
        let store = MemoryRecordStore::new();
        store.save_application(&make_record("Acme")).await.unwrap();
        store.delete_application(Uuid::new_v4()).await.unwrap();
        assert_eq!(store.list_applications().await.unwrap().len(), 1);
    }
}
