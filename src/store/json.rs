use super::{newest, newest_per_model, CheckStore};
use crate::error::CheckError;
use crate::model::{Check, CheckKey};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Append-only check log stored as one pretty-printed JSON array per project.
///
/// Writes go to a temporary file that is renamed over the log, so a reader
/// never observes a half-written file.
#[derive(Debug)]
pub struct JsonFileCheckStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCheckStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_file(&self, project_id: &str) -> PathBuf {
        let name: String = project_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.checks.json"))
    }

    async fn read_project(&self, project_id: &str) -> Result<Vec<Check>, CheckError> {
        let path = self.project_file(project_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence(&path, &e)),
        };
        let checks: Vec<Check> =
            serde_json::from_str(&content).map_err(|e| persistence(&path, &e))?;
        // Sanitized file names may collide, so filter on the real id.
        Ok(checks
            .into_iter()
            .filter(|c| c.project_id == project_id)
            .collect())
    }
}

fn persistence(path: &Path, err: &dyn std::fmt::Display) -> CheckError {
    CheckError::Persistence {
        message: format!("{}: {err}", path.display()),
    }
}

#[async_trait]
impl CheckStore for JsonFileCheckStore {
    async fn insert(&self, check: Check) -> Result<(), CheckError> {
        let _guard = self.write_lock.lock().await;

        let path = self.project_file(&check.project_id);
        let mut checks = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Vec<Check>>(&content)
                .map_err(|e| persistence(&path, &e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(persistence(&path, &e)),
        };
        checks.push(check);

        let json = serde_json::to_string_pretty(&checks).map_err(|e| persistence(&path, &e))?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| persistence(&self.root, &e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| persistence(&tmp, &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| persistence(&path, &e))?;

        tracing::debug!(path = %path.display(), checks = checks.len(), "check log written");
        Ok(())
    }

    async fn latest(&self, key: &CheckKey) -> Result<Option<Check>, CheckError> {
        let checks = self.read_project(&key.project_id).await?;
        Ok(newest(checks.iter().filter(|c| c.key() == *key)).cloned())
    }

    async fn latest_for_model(
        &self,
        project_id: &str,
        model_id: &str,
    ) -> Result<Option<Check>, CheckError> {
        let checks = self.read_project(project_id).await?;
        Ok(newest(checks.iter().filter(|c| c.model_id == model_id)).cloned())
    }

    async fn latest_per_model(&self, project_id: &str) -> Result<Vec<Check>, CheckError> {
        let checks = self.read_project(project_id).await?;
        Ok(newest_per_model(checks.iter()))
    }
}
