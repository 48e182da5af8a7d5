use super::{newest, newest_per_model, CheckStore};
use crate::error::CheckError;
use crate::model::{Check, CheckKey};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Append-only check store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryCheckStore {
    checks: RwLock<Vec<Check>>,
}

impl MemoryCheckStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.checks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.checks.read().await.is_empty()
    }
}

#[async_trait]
impl CheckStore for MemoryCheckStore {
    async fn insert(&self, check: Check) -> Result<(), CheckError> {
        self.checks.write().await.push(check);
        Ok(())
    }

    async fn latest(&self, key: &CheckKey) -> Result<Option<Check>, CheckError> {
        let checks = self.checks.read().await;
        Ok(newest(checks.iter().filter(|c| c.key() == *key)).cloned())
    }

    async fn latest_for_model(
        &self,
        project_id: &str,
        model_id: &str,
    ) -> Result<Option<Check>, CheckError> {
        let checks = self.checks.read().await;
        Ok(newest(
            checks
                .iter()
                .filter(|c| c.project_id == project_id && c.model_id == model_id),
        )
        .cloned())
    }

    async fn latest_per_model(&self, project_id: &str) -> Result<Vec<Check>, CheckError> {
        let checks = self.checks.read().await;
        Ok(newest_per_model(
            checks.iter().filter(|c| c.project_id == project_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::check_at;

    #[tokio::test]
    async fn inserts_append_instead_of_replacing() {
        let store = MemoryCheckStore::new();
        assert!(store.is_empty().await);
        store
            .insert(check_at("m1", "architecture", 0, &[100]))
            .await
            .unwrap();
        store
            .insert(check_at("m1", "architecture", 1, &[50]))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn equal_timestamps_prefer_later_insert() {
        let store = MemoryCheckStore::new();
        store
            .insert(check_at("m1", "architecture", 0, &[100]))
            .await
            .unwrap();
        store
            .insert(check_at("m1", "architecture", 0, &[0, 0]))
            .await
            .unwrap();

        let latest = store
            .latest(&CheckKey::new("p1", "m1", "architecture"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.rows.len(), 2);
    }
}
