//! Persistence of completed analyses as immutable checks.

pub mod json;
pub mod memory;

pub use json::JsonFileCheckStore;
pub use memory::MemoryCheckStore;

use crate::error::CheckError;
use crate::model::{Check, CheckKey, ProjectComplianceRow, SaveReceipt};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Document store holding checks keyed by `(project, model, discipline)`.
///
/// Stores are append-only: an insert never replaces an earlier check.
#[async_trait]
pub trait CheckStore: Send + Sync {
    async fn insert(&self, check: Check) -> Result<(), CheckError>;

    /// Most recent check for the key.
    async fn latest(&self, key: &CheckKey) -> Result<Option<Check>, CheckError>;

    /// Most recent check for the model, any discipline.
    async fn latest_for_model(
        &self,
        project_id: &str,
        model_id: &str,
    ) -> Result<Option<Check>, CheckError>;

    /// Most recent check of every model in the project.
    async fn latest_per_model(&self, project_id: &str) -> Result<Vec<Check>, CheckError>;
}

/// Picks the newest check; on equal timestamps the later insert wins.
pub(crate) fn newest<'a>(checks: impl Iterator<Item = &'a Check>) -> Option<&'a Check> {
    checks.max_by_key(|c| c.timestamp)
}

/// Newest check per model, ordered by model id.
pub(crate) fn newest_per_model<'a>(checks: impl Iterator<Item = &'a Check>) -> Vec<Check> {
    let mut latest: BTreeMap<&str, &Check> = BTreeMap::new();
    for check in checks {
        match latest.get(check.model_id.as_str()) {
            Some(current) if current.timestamp > check.timestamp => {}
            _ => {
                latest.insert(&check.model_id, check);
            }
        }
    }
    latest.into_values().cloned().collect()
}

/// Validating front door to a [`CheckStore`].
///
/// "Not found" is `Ok(None)`, distinct from a store failure.
#[derive(Clone)]
pub struct CheckPersistenceGateway {
    store: Arc<dyn CheckStore>,
}

impl CheckPersistenceGateway {
    #[must_use]
    pub fn new(store: Arc<dyn CheckStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, check: Check) -> Result<SaveReceipt, CheckError> {
        if check.rows.is_empty() {
            return Err(CheckError::Validation {
                message: "a check needs at least one analyzed element".to_string(),
            });
        }
        if check.project_id.is_empty() || check.model_id.is_empty() || check.discipline_id.is_empty()
        {
            return Err(CheckError::Validation {
                message: "project, model and discipline ids are required".to_string(),
            });
        }

        let saved_elements = check.rows.len();
        let key = check.key();
        self.store.insert(check).await?;

        tracing::info!(
            project = %key.project_id,
            model = %key.model_id,
            discipline = %key.discipline_id,
            saved_elements,
            "check saved"
        );
        Ok(SaveReceipt { saved_elements })
    }

    pub async fn get_latest(&self, key: &CheckKey) -> Result<Option<Check>, CheckError> {
        self.store.latest(key).await
    }

    /// Discipline of the model's most recent check, used to restore the
    /// last-viewed discipline.
    pub async fn get_latest_discipline_for_model(
        &self,
        project_id: &str,
        model_id: &str,
    ) -> Result<Option<String>, CheckError> {
        Ok(self
            .store
            .latest_for_model(project_id, model_id)
            .await?
            .map(|check| check.discipline_id))
    }

    /// One row per model with at least one check, from its newest check.
    pub async fn get_project_rollup(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectComplianceRow>, CheckError> {
        let checks = self.store.latest_per_model(project_id).await?;
        Ok(checks.iter().map(ProjectComplianceRow::from).collect())
    }
}
