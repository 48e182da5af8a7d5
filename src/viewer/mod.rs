//! Correlation between analyzed elements and live viewer objects.
//!
//! Element rows carry platform identities; the viewer assigns its own
//! session-scoped object ids when a model is loaded. Resolution queries the
//! viewer's property database for objects whose identity properties match.

pub mod property_db;

pub use property_db::{PropertyDatabase, PropertyDbViewer, ViewerObject};

use crate::error::ViewerError;
use crate::model::ElementRow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Session-scoped object id assigned by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerObjectId(pub u64);

/// Equality match on one viewer property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPredicate {
    pub property: String,
    pub value: String,
}

impl PropertyPredicate {
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Control surface of the external 3D viewer.
///
/// The viewer has no internal locking; callers own it exclusively.
#[async_trait]
pub trait ViewerControl: Send + Sync {
    async fn load_model(&mut self, urn: &str) -> Result<(), ViewerError>;

    async fn query_objects_by_property(
        &self,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<ViewerObjectId>, ViewerError>;

    /// Show only `ids`.
    async fn isolate(&mut self, ids: &[ViewerObjectId]) -> Result<(), ViewerError>;

    /// Restore default visibility for every object.
    async fn clear_isolation(&mut self) -> Result<(), ViewerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationOutcome {
    Isolated(usize),
    /// None of the rows exist in the loaded model; everything is shown.
    NothingToIsolate,
}

struct ViewerState<V> {
    viewer: V,
    // element id -> viewer ids, valid for the currently loaded model only
    resolved: HashMap<String, Vec<ViewerObjectId>>,
}

/// Owns the viewer handle and serializes every call made against it.
pub struct ViewerCorrelationResolver<V: ViewerControl> {
    state: Mutex<ViewerState<V>>,
}

impl<V: ViewerControl> ViewerCorrelationResolver<V> {
    #[must_use]
    pub fn new(viewer: V) -> Self {
        Self {
            state: Mutex::new(ViewerState {
                viewer,
                resolved: HashMap::new(),
            }),
        }
    }

    /// Resets visibility, loads another model and forgets every id resolved
    /// for the previous one.
    pub async fn switch_model(&self, urn: &str) -> Result<(), ViewerError> {
        let mut state = self.state.lock().await;
        state.resolved.clear();
        state.viewer.clear_isolation().await?;
        state.viewer.load_model(urn).await?;
        tracing::info!(urn, "viewer model loaded");
        Ok(())
    }

    /// Viewer ids of every object matching any of the rows.
    ///
    /// Rows absent from the loaded model contribute nothing; duplicated or
    /// instanced geometry yields several ids per row.
    pub async fn resolve(&self, rows: &[ElementRow]) -> Result<Vec<ViewerObjectId>, ViewerError> {
        let mut state = self.state.lock().await;
        resolve_locked(&mut state, rows).await
    }

    /// Stores the first matching viewer id on each row, or `None` when the
    /// row is absent from the loaded model. Returns how many rows matched.
    pub async fn attach_viewer_ids(&self, rows: &mut [ElementRow]) -> Result<usize, ViewerError> {
        let mut state = self.state.lock().await;
        let mut matched = 0;
        for row in rows.iter_mut() {
            let ids = resolve_locked(&mut state, std::slice::from_ref(row)).await?;
            row.viewer_db_id = ids.first().map(|id| id.0);
            matched += usize::from(row.viewer_db_id.is_some());
        }
        Ok(matched)
    }

    pub async fn isolate_rows(&self, rows: &[ElementRow]) -> Result<IsolationOutcome, ViewerError> {
        let mut state = self.state.lock().await;
        let ids = resolve_locked(&mut state, rows).await?;
        isolate_locked(&mut state.viewer, &ids).await
    }

    /// Isolating nothing is the same as clearing the isolation.
    pub async fn isolate(&self, ids: &[ViewerObjectId]) -> Result<IsolationOutcome, ViewerError> {
        let mut state = self.state.lock().await;
        isolate_locked(&mut state.viewer, ids).await
    }

    pub async fn clear_isolation(&self) -> Result<(), ViewerError> {
        self.state.lock().await.viewer.clear_isolation().await
    }

    /// Gives up the viewer handle, e.g. to tear it down.
    pub fn into_inner(self) -> V {
        self.state.into_inner().viewer
    }
}

async fn resolve_locked<V: ViewerControl>(
    state: &mut ViewerState<V>,
    rows: &[ElementRow],
) -> Result<Vec<ViewerObjectId>, ViewerError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for row in rows {
        let matches = match state.resolved.get(&row.element_id) {
            Some(cached) => cached.clone(),
            None => {
                let found = query_row(&state.viewer, row).await?;
                state.resolved.insert(row.element_id.clone(), found.clone());
                found
            }
        };
        if matches.is_empty() {
            tracing::debug!(element = %row.element_id, "element not present in loaded model");
        }
        ids.extend(matches.into_iter().filter(|id| seen.insert(*id)));
    }

    Ok(ids)
}

async fn query_row<V: ViewerControl>(
    viewer: &V,
    row: &ElementRow,
) -> Result<Vec<ViewerObjectId>, ViewerError> {
    let predicates = [
        row.external_element_id
            .as_ref()
            .map(|id| PropertyPredicate::new("External Id", id)),
        row.revit_element_id
            .as_ref()
            .map(|id| PropertyPredicate::new("ElementId", id)),
    ];

    for predicate in predicates.iter().flatten() {
        let found = viewer.query_objects_by_property(predicate).await?;
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

async fn isolate_locked<V: ViewerControl>(
    viewer: &mut V,
    ids: &[ViewerObjectId],
) -> Result<IsolationOutcome, ViewerError> {
    if ids.is_empty() {
        viewer.clear_isolation().await?;
        return Ok(IsolationOutcome::NothingToIsolate);
    }
    viewer.isolate(ids).await?;
    Ok(IsolationOutcome::Isolated(ids.len()))
}
