use crate::analysis::{AnalysisSession, CategoryOutcome, DisciplineAnalysisResult};
use crate::error::AnalysisError;
use crate::model::{CheckKey, Discipline, ElementRow};
use crate::store::CheckPersistenceGateway;
use crate::viewer::{IsolationOutcome, PropertyDbViewer, ViewerCorrelationResolver};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPanel {
    Disciplines,
    Categories,
    Elements,
}

/// Viewer work queued until the "Resolving" status has been drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingIsolation {
    Element,
    Category,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Warning(String),
    Error(String),
}

/// Model being inspected.
#[derive(Debug, Clone)]
pub struct ModelContext {
    pub project_id: String,
    pub model_id: String,
    pub model_name: String,
    pub urn: String,
}

pub struct App {
    pub model: ModelContext,
    pub disciplines: Vec<Discipline>,
    pub analysis: Option<DisciplineAnalysisResult>,
    pub focus_panel: FocusPanel,
    pub selected_discipline: usize,
    pub selected_category: usize,
    pub selected_element: usize,
    pub status: Status,
    pub should_quit: bool,
    pending: Option<PendingIsolation>,
    runtime: Handle,
    session: AnalysisSession,
    gateway: CheckPersistenceGateway,
    resolver: ViewerCorrelationResolver<PropertyDbViewer>,
}

impl App {
    #[must_use]
    pub fn new(
        model: ModelContext,
        runtime: Handle,
        session: AnalysisSession,
        gateway: CheckPersistenceGateway,
        resolver: ViewerCorrelationResolver<PropertyDbViewer>,
    ) -> Self {
        let disciplines = session.orchestrator().catalog().disciplines().to_vec();
        Self {
            model,
            disciplines,
            analysis: None,
            focus_panel: FocusPanel::Disciplines,
            selected_discipline: 0,
            selected_category: 0,
            selected_element: 0,
            status: Status::Info("Enter runs the selected discipline".to_string()),
            should_quit: false,
            pending: None,
            runtime,
            session,
            gateway,
            resolver,
        }
    }

    /// Loads the model into the viewer and restores the last discipline
    /// checked for it.
    pub fn initialize(&mut self) {
        if let Err(e) = self.runtime.block_on(self.resolver.switch_model(&self.model.urn)) {
            self.status = Status::Warning(format!("Viewer unavailable: {e}"));
            return;
        }

        let last = self.runtime.block_on(
            self.gateway
                .get_latest_discipline_for_model(&self.model.project_id, &self.model.model_id),
        );
        let discipline_id = match last {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                self.status = Status::Error(format!("Could not restore the last discipline: {e}"));
                return;
            }
        };
        let Some(index) = self.disciplines.iter().position(|d| d.id == discipline_id) else {
            return;
        };
        self.selected_discipline = index;

        let key = CheckKey::new(
            &self.model.project_id,
            &self.model.model_id,
            &discipline_id,
        );
        if let Ok(Some(check)) = self.runtime.block_on(self.gateway.get_latest(&key)) {
            self.status = Status::Info(format!(
                "Last check {}: {}% over {} elements. Enter to re-run",
                check.timestamp.format("%Y-%m-%d %H:%M"),
                check.summary.average_compliance_pct,
                check.summary.total_elements
            ));
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.initialize();
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            if let Some(pending) = self.pending.take() {
                self.resolve_pending(pending);
                continue;
            }
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        super::dashboard::draw_dashboard(frame, self);
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }
            self.handle_key(key.code);
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => self.navigate_down(),
            KeyCode::Left | KeyCode::Char('h') => self.navigate_left(),
            KeyCode::Right | KeyCode::Char('l') => self.navigate_right(),
            KeyCode::Enter => self.activate(),
            KeyCode::Char('r') => self.run_selected_discipline(),
            KeyCode::Char('a') => self.isolate_category(),
            KeyCode::Char('c') => self.clear_isolation(),
            KeyCode::Char('s') => self.save_check(),
            _ => {}
        }
    }

    fn navigate_up(&mut self) {
        match self.focus_panel {
            FocusPanel::Disciplines => {
                if self.selected_discipline > 0 {
                    self.selected_discipline -= 1;
                }
            }
            FocusPanel::Categories => {
                if self.selected_category > 0 {
                    self.selected_category -= 1;
                    self.selected_element = 0;
                }
            }
            FocusPanel::Elements => {
                if self.selected_element > 0 {
                    self.selected_element -= 1;
                }
            }
        }
    }

    fn navigate_down(&mut self) {
        match self.focus_panel {
            FocusPanel::Disciplines => {
                if self.selected_discipline < self.disciplines.len().saturating_sub(1) {
                    self.selected_discipline += 1;
                }
            }
            FocusPanel::Categories => {
                if self.selected_category < self.category_outcomes().len().saturating_sub(1) {
                    self.selected_category += 1;
                    self.selected_element = 0;
                }
            }
            FocusPanel::Elements => {
                if self.selected_element < self.category_rows().len().saturating_sub(1) {
                    self.selected_element += 1;
                }
            }
        }
    }

    fn navigate_left(&mut self) {
        match self.focus_panel {
            FocusPanel::Elements => self.focus_panel = FocusPanel::Categories,
            FocusPanel::Categories => self.focus_panel = FocusPanel::Disciplines,
            FocusPanel::Disciplines => {}
        }
    }

    fn navigate_right(&mut self) {
        match self.focus_panel {
            FocusPanel::Disciplines => self.focus_panel = FocusPanel::Categories,
            FocusPanel::Categories => self.focus_panel = FocusPanel::Elements,
            FocusPanel::Elements => {}
        }
    }

    fn activate(&mut self) {
        match self.focus_panel {
            FocusPanel::Disciplines => self.run_selected_discipline(),
            FocusPanel::Categories => self.focus_panel = FocusPanel::Elements,
            FocusPanel::Elements => self.isolate_selected_element(),
        }
    }

    fn run_selected_discipline(&mut self) {
        let Some(discipline) = self.disciplines.get(self.selected_discipline) else {
            return;
        };

        // A new selection discards whatever the previous run produced.
        self.analysis = None;
        self.selected_category = 0;
        self.selected_element = 0;
        let token = self.session.select(
            &self.model.project_id,
            &self.model.model_id,
            &discipline.id,
        );

        match self.runtime.block_on(self.session.run(&token)) {
            Ok(mut result) if result.is_completed() => {
                let attached = self
                    .runtime
                    .block_on(self.resolver.attach_viewer_ids(&mut result.rows));
                if let Err(e) = attached {
                    tracing::warn!(error = %e, "viewer ids not attached");
                }
                self.status = if result.failed_categories.is_empty() {
                    Status::Info(result.status_message())
                } else {
                    Status::Warning(result.status_message())
                };
                self.analysis = Some(result);
                self.focus_panel = FocusPanel::Categories;
            }
            Ok(result) => {
                let err = result.into_completed().err();
                self.status = Status::Error(err.map_or_else(String::new, |e| e.to_string()));
            }
            Err(AnalysisError::Superseded { .. }) => {}
            Err(e) => self.status = Status::Error(e.to_string()),
        }
    }

    fn isolate_selected_element(&mut self) {
        if self.selected_row().is_some() {
            self.queue_isolation(PendingIsolation::Element);
        }
    }

    fn isolate_category(&mut self) {
        if self.selected_category_outcome().is_some() {
            self.queue_isolation(PendingIsolation::Category);
        }
    }

    fn queue_isolation(&mut self, pending: PendingIsolation) {
        self.pending = Some(pending);
        self.status = Status::Info("Resolving elements in the viewer... (Esc cancels)".to_string());
    }

    fn resolve_pending(&mut self, pending: PendingIsolation) {
        let (rows, label): (Vec<ElementRow>, String) = match pending {
            PendingIsolation::Element => match self.selected_row() {
                Some(row) => (vec![row.clone()], row.element_id.clone()),
                None => return,
            },
            PendingIsolation::Category => (
                self.category_rows().into_iter().cloned().collect(),
                self.selected_category_outcome()
                    .map(|c| c.display_name.clone())
                    .unwrap_or_default(),
            ),
        };

        let outcome = self.runtime.block_on(async {
            tokio::select! {
                biased;
                outcome = self.resolver.isolate_rows(&rows) => Some(outcome),
                () = cancel_requested() => None,
            }
        });
        self.status = match outcome {
            Some(Ok(IsolationOutcome::Isolated(n))) => {
                Status::Info(format!("Isolated {n} viewer objects for {label}"))
            }
            Some(Ok(IsolationOutcome::NothingToIsolate)) => Status::Info(format!(
                "{label} is not present in the loaded model; showing everything"
            )),
            Some(Err(e)) => Status::Error(format!("{e} (press Enter to retry)")),
            None => Status::Warning("Isolation cancelled".to_string()),
        };
    }

    fn clear_isolation(&mut self) {
        self.status = match self.runtime.block_on(self.resolver.clear_isolation()) {
            Ok(()) => Status::Info("Showing all objects".to_string()),
            Err(e) => Status::Error(format!("{e} (press c to retry)")),
        };
    }

    fn save_check(&mut self) {
        let Some(result) = &self.analysis else {
            self.status = Status::Warning("Nothing to save; run a discipline first".to_string());
            return;
        };
        let check = result.to_check(&self.model.model_name);
        self.status = match self.runtime.block_on(self.gateway.save(check)) {
            Ok(receipt) => Status::Info(format!("Saved check with {} elements", receipt.saved_elements)),
            Err(e) => Status::Error(format!("{e} (press s to retry)")),
        };
    }

    #[must_use]
    pub fn category_outcomes(&self) -> &[CategoryOutcome] {
        self.analysis
            .as_ref()
            .map(|a| a.categories.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn selected_category_outcome(&self) -> Option<&CategoryOutcome> {
        self.category_outcomes().get(self.selected_category)
    }

    /// Rows of the selected category.
    #[must_use]
    pub fn category_rows(&self) -> Vec<&ElementRow> {
        match (&self.analysis, self.selected_category_outcome()) {
            (Some(analysis), Some(category)) => analysis.rows_in(&category.display_name).collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn selected_row(&self) -> Option<&ElementRow> {
        self.category_rows().get(self.selected_element).copied()
    }

    #[must_use]
    pub fn selected_discipline_name(&self) -> &str {
        self.disciplines
            .get(self.selected_discipline)
            .map_or("-", |d| d.name.as_str())
    }
}

/// Resolves once Esc is pressed.
async fn cancel_requested() {
    loop {
        if matches!(event::poll(Duration::ZERO), Ok(true)) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Press && key.code == KeyCode::Esc {
                    return;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CategoryAnalyzer, ComplianceScorer, DisciplineAnalysisOrchestrator};
    use crate::config::{AnalysisSettings, RequiredParameters};
    use crate::model::{Catalog, CategoryQuery, PropertyEntry};
    use crate::source::FixtureQueryService;
    use crate::store::{JsonFileCheckStore, MemoryCheckStore};
    use crate::viewer::{PropertyDatabase, ViewerObject};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    const DATASET: &str = r#"{
        "projectId": "p1",
        "models": [{
            "modelId": "m1",
            "modelName": "Tower",
            "urn": "urn:m1",
            "queries": {
                "doors": [ {
                    "id": "el-1",
                    "revitElementId": "2001",
                    "properties": [ { "name": "Manufacturer", "value": "Velux" } ]
                } ]
            }
        }]
    }"#;

    fn app(runtime: &Runtime, gateway: CheckPersistenceGateway) -> App {
        let catalog = Catalog::from_disciplines(vec![Discipline {
            id: "architecture".into(),
            name: "Architecture".into(),
            categories: vec![CategoryQuery {
                id: "doors".into(),
                display_name: "Doors".into(),
                filter: "doors".into(),
            }],
        }])
        .unwrap();
        let analyzer = CategoryAnalyzer::new(
            Arc::new(FixtureQueryService::new(serde_json::from_str(DATASET).unwrap())),
            ComplianceScorer::default(),
            RequiredParameters::default(),
        );
        let settings = AnalysisSettings {
            inter_call_delay_ms: 0,
            ..AnalysisSettings::default()
        };
        let session = AnalysisSession::new(Arc::new(DisciplineAnalysisOrchestrator::new(
            analyzer,
            Arc::new(catalog),
            settings,
        )));
        let viewer = PropertyDbViewer::new(vec![PropertyDatabase {
            urn: "urn:m1".into(),
            objects: vec![ViewerObject {
                db_id: 41,
                properties: vec![PropertyEntry::new("ElementId", "2001")],
            }],
        }]);

        App::new(
            ModelContext {
                project_id: "p1".into(),
                model_id: "m1".into(),
                model_name: "Tower".into(),
                urn: "urn:m1".into(),
            },
            runtime.handle().clone(),
            session,
            gateway,
            ViewerCorrelationResolver::new(viewer),
        )
    }

    fn memory_gateway() -> CheckPersistenceGateway {
        CheckPersistenceGateway::new(Arc::new(MemoryCheckStore::new()))
    }

    #[test]
    fn completed_run_carries_viewer_ids() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime, memory_gateway());
        app.initialize();

        app.handle_key(KeyCode::Enter);

        assert_eq!(app.focus_panel, FocusPanel::Categories);
        assert_eq!(app.category_rows().len(), 1);
        assert_eq!(app.category_rows()[0].viewer_db_id, Some(41));
    }

    #[test]
    fn isolation_shows_resolving_before_touching_the_viewer() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime, memory_gateway());
        app.initialize();
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Right);

        app.handle_key(KeyCode::Enter);

        assert_eq!(app.pending, Some(PendingIsolation::Element));
        assert!(matches!(&app.status, Status::Info(text) if text.starts_with("Resolving")));

        let pending = app.pending.take().unwrap();
        app.resolve_pending(pending);
        assert_eq!(
            app.status,
            Status::Info("Isolated 1 viewer objects for el-1".to_string())
        );
    }

    #[test]
    fn category_isolation_without_analysis_is_ignored() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime, memory_gateway());
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.pending, None);
    }

    #[test]
    fn failed_restore_names_what_failed() {
        let runtime = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p1.checks.json"), "{ not json").unwrap();
        let gateway = CheckPersistenceGateway::new(Arc::new(JsonFileCheckStore::new(dir.path())));
        let mut app = app(&runtime, gateway);

        app.initialize();

        match &app.status {
            Status::Error(text) => {
                assert!(text.starts_with("Could not restore the last discipline"));
                assert!(!text.contains("press r"));
            }
            other => panic!("unexpected status {other:?}"),
        }
    }
}
