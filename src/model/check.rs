use super::{DisciplineSummary, ElementRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category id recorded on checks that cover a whole discipline.
pub const ALL_CATEGORIES: &str = "ALL";

/// Lookup key of a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckKey {
    pub project_id: String,
    pub model_id: String,
    pub discipline_id: String,
}

impl CheckKey {
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        model_id: impl Into<String>,
        discipline_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            model_id: model_id.into(),
            discipline_id: discipline_id.into(),
        }
    }
}

/// Persisted snapshot of one completed discipline analysis.
///
/// Owns its own copy of the rows; each save produces a new complete check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub project_id: String,
    pub model_id: String,
    pub model_name: String,
    pub discipline_id: String,
    pub rows: Vec<ElementRow>,
    pub summary: DisciplineSummary,
    pub category_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Check {
    /// Builds a check stamped with the current time.
    #[must_use]
    pub fn new(
        key: CheckKey,
        model_name: impl Into<String>,
        rows: Vec<ElementRow>,
        summary: DisciplineSummary,
    ) -> Self {
        Self {
            project_id: key.project_id,
            model_id: key.model_id,
            model_name: model_name.into(),
            discipline_id: key.discipline_id,
            rows,
            summary,
            category_id: ALL_CATEGORIES.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn key(&self) -> CheckKey {
        CheckKey::new(&self.project_id, &self.model_id, &self.discipline_id)
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub saved_elements: usize,
}

/// One model's line in a project-wide rollup, computed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComplianceRow {
    pub model_id: String,
    pub model_name: String,
    pub total_elements: usize,
    pub model_compliance_pct: u8,
}

impl From<&Check> for ProjectComplianceRow {
    fn from(check: &Check) -> Self {
        Self {
            model_id: check.model_id.clone(),
            model_name: check.model_name.clone(),
            total_elements: check.summary.total_elements,
            model_compliance_pct: check.summary.average_compliance_pct,
        }
    }
}
