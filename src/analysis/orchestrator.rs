use super::category::CategoryAnalyzer;
use crate::config::AnalysisSettings;
use crate::error::{AnalysisError, RemoteFetchError};
use crate::model::{
    Catalog, CategorySummary, Check, CheckKey, DisciplineSummary, ElementRow,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lifecycle of one discipline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// What happened to one category of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutcome {
    pub category_id: String,
    pub display_name: String,
    pub summary: CategorySummary,
    /// Set when the fetch failed; the summary is then all zeros.
    pub error: Option<String>,
}

impl CategoryOutcome {
    #[must_use]
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineAnalysisResult {
    pub project_id: String,
    pub model_id: String,
    pub discipline_id: String,
    pub discipline_name: String,
    pub state: RunState,
    /// Rows of all successful categories, in catalog order.
    pub rows: Vec<ElementRow>,
    pub categories: Vec<CategoryOutcome>,
    /// Display names of the categories whose fetch failed.
    pub failed_categories: Vec<String>,
    pub summary: DisciplineSummary,
}

impl DisciplineAnalysisResult {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Turns a failed run into [`AnalysisError::AllCategoriesFailed`].
    pub fn into_completed(self) -> Result<Self, AnalysisError> {
        match self.state {
            RunState::Completed => Ok(self),
            _ => Err(AnalysisError::AllCategoriesFailed {
                failed_categories: self.failed_categories,
            }),
        }
    }

    /// Rows belonging to one category of the run.
    pub fn rows_in<'a>(&'a self, display_name: &'a str) -> impl Iterator<Item = &'a ElementRow> {
        self.rows.iter().filter(move |r| r.category == display_name)
    }

    /// User-facing summary line: elements found plus any failed categories.
    #[must_use]
    pub fn status_message(&self) -> String {
        let analyzed = self.categories.len() - self.failed_categories.len();
        let mut message = format!(
            "Found {} elements in {analyzed} of {} categories",
            self.summary.total_elements,
            self.categories.len()
        );
        if !self.failed_categories.is_empty() {
            message.push_str(&format!(
                "; failed categories: {}",
                self.failed_categories.join(", ")
            ));
        }
        message
    }

    /// Snapshot of this run ready to be saved.
    #[must_use]
    pub fn to_check(&self, model_name: &str) -> Check {
        Check::new(
            CheckKey::new(&self.project_id, &self.model_id, &self.discipline_id),
            model_name,
            self.rows.clone(),
            self.summary,
        )
    }
}

/// Runs every category of a discipline, one at a time.
///
/// Holds no state between runs.
pub struct DisciplineAnalysisOrchestrator {
    analyzer: CategoryAnalyzer,
    catalog: Arc<Catalog>,
    settings: AnalysisSettings,
}

impl DisciplineAnalysisOrchestrator {
    #[must_use]
    pub fn new(analyzer: CategoryAnalyzer, catalog: Arc<Catalog>, settings: AnalysisSettings) -> Self {
        Self {
            analyzer,
            catalog,
            settings,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn run(
        &self,
        project_id: &str,
        model_id: &str,
        discipline_id: &str,
    ) -> Result<DisciplineAnalysisResult, AnalysisError> {
        self.run_while(project_id, model_id, discipline_id, || true)
            .await
    }

    /// Like [`run`](Self::run), but aborts with [`AnalysisError::Superseded`]
    /// as soon as `is_current` turns false.
    async fn run_while<F>(
        &self,
        project_id: &str,
        model_id: &str,
        discipline_id: &str,
        is_current: F,
    ) -> Result<DisciplineAnalysisResult, AnalysisError>
    where
        F: Fn() -> bool,
    {
        let discipline = self
            .catalog
            .discipline(discipline_id)
            .ok_or_else(|| AnalysisError::UnknownDiscipline(discipline_id.to_string()))?;
        let superseded = || AnalysisError::Superseded {
            model_id: model_id.to_string(),
            discipline_id: discipline_id.to_string(),
        };

        let mut state = RunState::Pending;
        transition(&mut state, RunState::Running, discipline_id);

        let mut rows = Vec::new();
        let mut categories = Vec::with_capacity(discipline.categories.len());
        let mut failed_categories = Vec::new();

        for (index, category) in discipline.categories.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.inter_call_delay()).await;
            }
            if !is_current() {
                return Err(superseded());
            }

            let fetched = tokio::time::timeout(
                self.settings.category_timeout(),
                self.analyzer.analyze(project_id, model_id, category),
            )
            .await
            .unwrap_or_else(|_| {
                Err(RemoteFetchError::Timeout {
                    filter: category.filter.clone(),
                    timeout_ms: self.settings.category_timeout_ms,
                })
            });

            match fetched {
                Ok(analysis) => {
                    rows.extend(analysis.rows);
                    categories.push(CategoryOutcome {
                        category_id: category.id.clone(),
                        display_name: category.display_name.clone(),
                        summary: analysis.summary,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        category = %category.display_name,
                        error = %err,
                        "category fetch failed, continuing"
                    );
                    failed_categories.push(category.display_name.clone());
                    categories.push(CategoryOutcome {
                        category_id: category.id.clone(),
                        display_name: category.display_name.clone(),
                        summary: CategorySummary::zero(),
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        if !is_current() {
            return Err(superseded());
        }

        let summary = if failed_categories.len() == categories.len() {
            transition(&mut state, RunState::Failed, discipline_id);
            DisciplineSummary::default()
        } else {
            transition(&mut state, RunState::Completed, discipline_id);
            DisciplineSummary::from_categories(categories.iter().map(|c| &c.summary))
        };

        Ok(DisciplineAnalysisResult {
            project_id: project_id.to_string(),
            model_id: model_id.to_string(),
            discipline_id: discipline.id.clone(),
            discipline_name: discipline.name.clone(),
            state,
            rows,
            categories,
            failed_categories,
            summary,
        })
    }
}

fn transition(state: &mut RunState, next: RunState, discipline_id: &str) {
    tracing::debug!(discipline = discipline_id, from = ?state, to = ?next, "run state");
    *state = next;
}

/// Model/discipline selection a run was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
    pub project_id: String,
    pub model_id: String,
    pub discipline_id: String,
}

/// Tracks the current selection so a slow run cannot overwrite a newer one.
///
/// Every [`select`](Self::select) invalidates the tokens handed out before it.
#[derive(Clone)]
pub struct AnalysisSession {
    orchestrator: Arc<DisciplineAnalysisOrchestrator>,
    generation: Arc<AtomicU64>,
}

impl AnalysisSession {
    #[must_use]
    pub fn new(orchestrator: Arc<DisciplineAnalysisOrchestrator>) -> Self {
        Self {
            orchestrator,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &DisciplineAnalysisOrchestrator {
        &self.orchestrator
    }

    pub fn select(
        &self,
        project_id: impl Into<String>,
        model_id: impl Into<String>,
        discipline_id: impl Into<String>,
    ) -> RunToken {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RunToken {
            generation,
            project_id: project_id.into(),
            model_id: model_id.into(),
            discipline_id: discipline_id.into(),
        }
    }

    #[must_use]
    pub fn is_current(&self, token: &RunToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }

    pub async fn run(&self, token: &RunToken) -> Result<DisciplineAnalysisResult, AnalysisError> {
        let result = self
            .orchestrator
            .run_while(
                &token.project_id,
                &token.model_id,
                &token.discipline_id,
                || self.is_current(token),
            )
            .await;
        if let Err(AnalysisError::Superseded { .. }) = &result {
            tracing::info!(
                model = %token.model_id,
                discipline = %token.discipline_id,
                "discarding results of superseded run"
            );
        }
        result
    }
}
