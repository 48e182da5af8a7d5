use super::{PropertyPredicate, ViewerControl, ViewerObjectId};
use crate::analysis::category::property_key;
use crate::error::ViewerError;
use crate::model::PropertyEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Property dump of one translated model as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDatabase {
    pub urn: String,
    pub objects: Vec<ViewerObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerObject {
    pub db_id: u64,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

/// Offline viewer answering from property database dumps.
///
/// Tracks visibility the way the live viewer does: an empty isolation set
/// means every object is shown.
#[derive(Debug, Default)]
pub struct PropertyDbViewer {
    databases: Vec<PropertyDatabase>,
    loaded: Option<usize>,
    isolated: Vec<ViewerObjectId>,
    queries: AtomicUsize,
}

impl PropertyDbViewer {
    #[must_use]
    pub fn new(databases: Vec<PropertyDatabase>) -> Self {
        Self {
            databases,
            ..Self::default()
        }
    }

    /// Reads a JSON file holding either one database or an array of them.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ViewerError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Dump {
            Many(Vec<PropertyDatabase>),
            One(PropertyDatabase),
        }

        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ViewerError::PropertyDb {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let databases = match serde_json::from_str(&content) {
            Ok(Dump::Many(databases)) => databases,
            Ok(Dump::One(database)) => vec![database],
            Err(e) => {
                return Err(ViewerError::PropertyDb {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        Ok(Self::new(databases))
    }

    #[must_use]
    pub fn loaded_urn(&self) -> Option<&str> {
        self.loaded.map(|i| self.databases[i].urn.as_str())
    }

    #[must_use]
    pub fn isolated(&self) -> &[ViewerObjectId] {
        &self.isolated
    }

    /// Objects currently shown in the loaded model.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<ViewerObjectId> {
        let Some(objects) = self.objects() else {
            return Vec::new();
        };
        objects
            .iter()
            .map(|o| ViewerObjectId(o.db_id))
            .filter(|id| self.isolated.is_empty() || self.isolated.contains(id))
            .collect()
    }

    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn objects(&self) -> Option<&[ViewerObject]> {
        self.loaded.map(|i| self.databases[i].objects.as_slice())
    }
}

#[async_trait]
impl ViewerControl for PropertyDbViewer {
    async fn load_model(&mut self, urn: &str) -> Result<(), ViewerError> {
        let index = self
            .databases
            .iter()
            .position(|db| db.urn == urn)
            .ok_or_else(|| ViewerError::Load {
                urn: urn.to_string(),
                message: "no property database for this model".to_string(),
            })?;
        self.loaded = Some(index);
        self.isolated.clear();
        Ok(())
    }

    async fn query_objects_by_property(
        &self,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<ViewerObjectId>, ViewerError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects().ok_or_else(|| ViewerError::Query {
            message: "no model loaded".to_string(),
        })?;

        let wanted = property_key(&predicate.property);
        let value = predicate.value.trim();
        Ok(objects
            .iter()
            .filter(|o| {
                o.properties
                    .iter()
                    .any(|p| property_key(&p.name) == wanted && p.display_value() == value)
            })
            .map(|o| ViewerObjectId(o.db_id))
            .collect())
    }

    async fn isolate(&mut self, ids: &[ViewerObjectId]) -> Result<(), ViewerError> {
        let objects = self.objects().ok_or_else(|| ViewerError::Visibility {
            message: "no model loaded".to_string(),
        })?;
        if let Some(unknown) = ids
            .iter()
            .find(|id| !objects.iter().any(|o| o.db_id == id.0))
        {
            return Err(ViewerError::Visibility {
                message: format!("object {} is not part of the loaded model", unknown.0),
            });
        }
        self.isolated = ids.to_vec();
        Ok(())
    }

    async fn clear_isolation(&mut self) -> Result<(), ViewerError> {
        self.isolated.clear();
        Ok(())
    }
}
