use model_compliance::analysis::{
    AnalysisSession, CategoryAnalyzer, ComplianceScorer, DisciplineAnalysisOrchestrator, RunState,
};
use model_compliance::config::AppConfig;
use model_compliance::error::CheckError;
use model_compliance::model::{CheckKey, ProjectComplianceRow};
use model_compliance::source::{FixtureDataset, FixtureQueryService};
use model_compliance::store::{CheckPersistenceGateway, JsonFileCheckStore};
use model_compliance::viewer::{
    IsolationOutcome, PropertyDbViewer, ViewerCorrelationResolver, ViewerObjectId,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const CONFIG: &str = r#"
[analysis]
inter_call_delay_ms = 100

[[disciplines]]
id = "architecture"
name = "Architecture"

[[disciplines.categories]]
id = "walls"
display_name = "Walls"
filter = "'property.name.category'=='Walls'"

[[disciplines.categories]]
id = "windows"
display_name = "Windows"
filter = "'property.name.category'=='Windows'"
"#;

const DATASET: &str = r#"{
    "projectId": "b.tower-project",
    "models": [
        {
            "modelId": "arch-01",
            "modelName": "Tower - Architecture",
            "urn": "urn:adsk.objects:os.object:tower/arch-01.rvt",
            "queries": {
                "'property.name.category'=='Walls'": [
                    {
                        "id": "el-1",
                        "revitElementId": "316054",
                        "properties": [
                            { "name": "Family Name", "value": "Basic Wall" },
                            { "name": "Assembly Code", "value": "B2010" },
                            { "name": "Assembly Description", "value": "Exterior Walls" },
                            { "name": "Identity Data.Manufacturer", "value": "Xella" },
                            { "name": "Model", "value": "Ytong 240" }
                        ]
                    },
                    {
                        "id": "el-2",
                        "revitElementId": "316055",
                        "properties": [
                            { "name": "Family Name", "value": "Basic Wall" },
                            { "name": "assembly_code", "value": "B2010" },
                            { "name": "Manufacturer", "value": "Xella" },
                            { "name": "Model", "value": "" }
                        ]
                    }
                ],
                "'property.name.category'=='Windows'": { "error": "504 Gateway Timeout" }
            }
        },
        {
            "modelId": "struct-01",
            "modelName": "Tower - Structure",
            "urn": "urn:adsk.objects:os.object:tower/struct-01.rvt",
            "queries": {
                "'property.name.category'=='Walls'": [],
                "'property.name.category'=='Windows'": { "error": "500" }
            }
        }
    ]
}"#;

fn session(config: &AppConfig) -> AnalysisSession {
    let dataset: FixtureDataset = serde_json::from_str(DATASET).unwrap();
    let analyzer = CategoryAnalyzer::new(
        Arc::new(FixtureQueryService::new(dataset)),
        ComplianceScorer::new(config.analysis.fallback_parameter_count),
        config.required_parameters.clone(),
    );
    let orchestrator = DisciplineAnalysisOrchestrator::new(
        analyzer,
        Arc::new(config.catalog().unwrap()),
        config.analysis.clone(),
    );
    AnalysisSession::new(Arc::new(orchestrator))
}

#[tokio::test(start_paused = true)]
async fn analyze_save_and_roll_up() {
    let config = AppConfig::from_toml(CONFIG).unwrap();
    let session = session(&config);
    let dir = tempfile::tempdir().unwrap();
    let gateway = CheckPersistenceGateway::new(Arc::new(JsonFileCheckStore::new(dir.path())));

    let token = session.select("b.tower-project", "arch-01", "architecture");
    let result = session.run(&token).await.unwrap();

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.failed_categories, vec!["Windows".to_string()]);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0].compliance.pct, 100);
    assert_eq!(result.rows[1].compliance.pct, 50);
    assert_eq!(result.summary.total_elements, 2);
    assert_eq!(result.summary.average_compliance_pct, 38);
    assert_eq!(result.summary.fully_compliant, 1);

    let receipt = gateway
        .save(result.to_check("Tower - Architecture"))
        .await
        .unwrap();
    assert_eq!(receipt.saved_elements, 2);

    let key = CheckKey::new("b.tower-project", "arch-01", "architecture");
    let first = gateway.get_latest(&key).await.unwrap().unwrap();
    let second = gateway.get_latest(&key).await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.rows, result.rows);
    assert_eq!(first.category_id, "ALL");

    assert_eq!(
        gateway
            .get_latest_discipline_for_model("b.tower-project", "arch-01")
            .await
            .unwrap()
            .as_deref(),
        Some("architecture")
    );

    assert_eq!(
        gateway.get_project_rollup("b.tower-project").await.unwrap(),
        vec![ProjectComplianceRow {
            model_id: "arch-01".into(),
            model_name: "Tower - Architecture".into(),
            total_elements: 2,
            model_compliance_pct: 38,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn model_without_elements_cannot_be_saved() {
    let config = AppConfig::from_toml(CONFIG).unwrap();
    let session = session(&config);
    let dir = tempfile::tempdir().unwrap();
    let gateway = CheckPersistenceGateway::new(Arc::new(JsonFileCheckStore::new(dir.path())));

    let token = session.select("b.tower-project", "struct-01", "architecture");
    let result = session.run(&token).await.unwrap();
    assert_eq!(result.state, RunState::Completed);
    assert!(result.rows.is_empty());

    let err = gateway
        .save(result.to_check("Tower - Structure"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckError::Validation { .. }));
    assert!(gateway
        .get_project_rollup("b.tower-project")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn analyzed_rows_isolate_in_viewer() {
    let config = AppConfig::from_toml(CONFIG).unwrap();
    let session = session(&config);
    let token = session.select("b.tower-project", "arch-01", "architecture");
    let result = session.run(&token).await.unwrap();

    let viewer: PropertyDbViewer = PropertyDbViewer::new(
        serde_json::from_str(
            r#"[{
                "urn": "urn:adsk.objects:os.object:tower/arch-01.rvt",
                "objects": [
                    { "dbId": 2041, "properties": [ { "name": "ElementId", "value": "316054" } ] },
                    { "dbId": 2042, "properties": [ { "name": "ElementId", "value": 316055 } ] },
                    { "dbId": 2043, "properties": [ { "name": "ElementId", "value": "400001" } ] }
                ]
            }]"#,
        )
        .unwrap(),
    );
    let resolver = ViewerCorrelationResolver::new(viewer);
    resolver
        .switch_model("urn:adsk.objects:os.object:tower/arch-01.rvt")
        .await
        .unwrap();

    let outcome = resolver.isolate_rows(&result.rows[1..]).await.unwrap();
    assert_eq!(outcome, IsolationOutcome::Isolated(1));

    let ids = resolver.resolve(&result.rows).await.unwrap();
    assert_eq!(ids, vec![ViewerObjectId(2041), ViewerObjectId(2042)]);

    resolver.clear_isolation().await.unwrap();
    let viewer = resolver.into_inner();
    assert!(viewer.isolated().is_empty());
    assert_eq!(viewer.visible_ids().len(), 3);
}
