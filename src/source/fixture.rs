use crate::analysis::{ElementQueryService, RawElement};
use crate::error::{RemoteFetchError, SourceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Recorded platform answers for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDataset {
    pub project_id: String,
    pub models: Vec<FixtureModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureModel {
    pub model_id: String,
    pub model_name: String,
    /// Viewer URN of the translated model.
    pub urn: String,
    /// Category filter -> recorded answer.
    #[serde(default)]
    pub queries: HashMap<String, QueryReply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryReply {
    Elements(Vec<RawElement>),
    Error { error: String },
}

/// [`ElementQueryService`] replaying a recorded dataset export.
#[derive(Debug, Clone)]
pub struct FixtureQueryService {
    dataset: FixtureDataset,
}

impl FixtureQueryService {
    #[must_use]
    pub fn new(dataset: FixtureDataset) -> Self {
        Self { dataset }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(&path).map_err(|source| SourceError::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.dataset.project_id
    }

    #[must_use]
    pub fn models(&self) -> &[FixtureModel] {
        &self.dataset.models
    }

    pub fn model(&self, model_id: &str) -> Result<&FixtureModel, SourceError> {
        self.dataset
            .models
            .iter()
            .find(|m| m.model_id == model_id)
            .ok_or_else(|| SourceError::UnknownModel(model_id.to_string()))
    }
}

#[async_trait]
impl ElementQueryService for FixtureQueryService {
    async fn query(
        &self,
        project_id: &str,
        model_id: &str,
        filter: &str,
    ) -> Result<Vec<RawElement>, RemoteFetchError> {
        let unavailable = |message: String| RemoteFetchError::Unavailable {
            filter: filter.to_string(),
            message,
        };

        if project_id != self.dataset.project_id {
            return Err(unavailable(format!("unknown project '{project_id}'")));
        }
        let model = self
            .model(model_id)
            .map_err(|e| unavailable(e.to_string()))?;

        match model.queries.get(filter) {
            Some(QueryReply::Elements(elements)) => Ok(elements.clone()),
            Some(QueryReply::Error { error }) => Err(unavailable(error.clone())),
            None => Err(unavailable("filter not recorded in dataset".to_string())),
        }
    }
}
