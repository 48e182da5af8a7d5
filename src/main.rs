use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use model_compliance::analysis::{
    AnalysisSession, CategoryAnalyzer, ComplianceScorer, DisciplineAnalysisOrchestrator,
};
use model_compliance::config::AppConfig;
use model_compliance::export::{export_result_json, export_rows_csv};
use model_compliance::model::CheckKey;
use model_compliance::source::FixtureQueryService;
use model_compliance::store::{CheckPersistenceGateway, JsonFileCheckStore};
use model_compliance::ui::{App, ModelContext};
use model_compliance::viewer::{PropertyDbViewer, ViewerCorrelationResolver};

#[derive(Parser, Debug)]
#[command(name = "model-compliance")]
#[command(about = "Model Compliance - parameter compliance checks for BIM models")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one discipline of a model
    Analyze(AnalyzeArgs),
    /// Show the latest saved check of a model
    Latest(LatestArgs),
    /// Show the latest compliance of every model in a project
    Rollup(RollupArgs),
    /// Browse compliance interactively and isolate elements in the viewer
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Recorded platform dataset (JSON)
    #[arg(long, value_name = "FILE")]
    dataset: PathBuf,

    #[arg(long)]
    model: String,

    #[arg(long)]
    discipline: String,

    /// Save the analysis as a check
    #[arg(long, requires = "store")]
    save: bool,

    /// Check store directory
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Export rows to CSV
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Export the full result to JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LatestArgs {
    #[arg(long, value_name = "DIR")]
    store: PathBuf,

    #[arg(long)]
    project: String,

    #[arg(long)]
    model: String,

    /// Defaults to the discipline checked most recently
    #[arg(long)]
    discipline: Option<String>,
}

#[derive(Args, Debug)]
struct RollupArgs {
    #[arg(long, value_name = "DIR")]
    store: PathBuf,

    #[arg(long)]
    project: String,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[arg(long, value_name = "FILE")]
    dataset: PathBuf,

    #[arg(long)]
    model: String,

    /// Viewer property database dump (JSON)
    #[arg(long, value_name = "FILE")]
    viewer_db: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "checks")]
    store: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let interactive = matches!(cli.command, Command::Inspect(_));
    init_tracing(cli.log_file.as_deref(), interactive)?;

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Command::Analyze(args) => runtime.block_on(analyze(&config, args)),
        Command::Latest(args) => runtime.block_on(latest(args)),
        Command::Rollup(args) => runtime.block_on(rollup(args)),
        Command::Inspect(args) => inspect(&config, &runtime, args),
    }
}

fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .wrap_err_with(|| format!("failed to create log file '{}'", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        // Logging to the terminal would corrupt the dashboard.
        None if interactive => {}
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn build_session(config: &AppConfig, source: Arc<FixtureQueryService>) -> Result<AnalysisSession> {
    let analyzer = CategoryAnalyzer::new(
        source,
        ComplianceScorer::new(config.analysis.fallback_parameter_count),
        config.required_parameters.clone(),
    );
    let orchestrator = DisciplineAnalysisOrchestrator::new(
        analyzer,
        Arc::new(config.catalog()?),
        config.analysis.clone(),
    );
    Ok(AnalysisSession::new(Arc::new(orchestrator)))
}

fn gateway(store: &Path) -> CheckPersistenceGateway {
    CheckPersistenceGateway::new(Arc::new(JsonFileCheckStore::new(store)))
}

async fn analyze(config: &AppConfig, args: AnalyzeArgs) -> Result<()> {
    let source = Arc::new(FixtureQueryService::from_file(&args.dataset)?);
    let project_id = source.project_id().to_string();
    let model_name = source.model(&args.model)?.model_name.clone();

    let session = build_session(config, source)?;
    let token = session.select(&project_id, &args.model, &args.discipline);
    let result = session.run(&token).await?.into_completed()?;

    println!("{} | {} | {}", model_name, result.discipline_name, result.status_message());
    for category in &result.categories {
        match &category.error {
            Some(error) => println!("  {:<28} failed: {error}", category.display_name),
            None => println!(
                "  {:<28} {:>5} elements {:>4}% avg {:>5} fully compliant",
                category.display_name,
                category.summary.total_elements,
                category.summary.average_compliance_pct,
                category.summary.fully_compliant
            ),
        }
    }
    println!(
        "  {:<28} {:>5} elements {:>4}% avg {:>5} fully compliant",
        "Discipline",
        result.summary.total_elements,
        result.summary.average_compliance_pct,
        result.summary.fully_compliant
    );

    if let Some(csv_path) = &args.csv {
        export_rows_csv(&result, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &args.json {
        export_result_json(&result, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    if args.save {
        let store = args.store.as_deref().ok_or_else(|| eyre!("--save needs --store"))?;
        let receipt = gateway(store).save(result.to_check(&model_name)).await?;
        println!("Saved check with {} elements", receipt.saved_elements);
    }

    Ok(())
}

async fn latest(args: LatestArgs) -> Result<()> {
    let gateway = gateway(&args.store);
    let discipline = match args.discipline {
        Some(discipline) => Some(discipline),
        None => {
            gateway
                .get_latest_discipline_for_model(&args.project, &args.model)
                .await?
        }
    };
    let Some(discipline) = discipline else {
        println!("No checks saved for model {}", args.model);
        return Ok(());
    };

    let key = CheckKey::new(&args.project, &args.model, &discipline);
    match gateway.get_latest(&key).await? {
        Some(check) => println!(
            "{} | {} | {} | {} elements | {}% avg | {} fully compliant",
            check.model_name,
            check.discipline_id,
            check.timestamp.format("%Y-%m-%d %H:%M:%S"),
            check.summary.total_elements,
            check.summary.average_compliance_pct,
            check.summary.fully_compliant
        ),
        None => println!("No {discipline} check saved for model {}", args.model),
    }
    Ok(())
}

async fn rollup(args: RollupArgs) -> Result<()> {
    let rows = gateway(&args.store).get_project_rollup(&args.project).await?;
    if rows.is_empty() {
        println!("No checks saved for project {}", args.project);
        return Ok(());
    }
    for row in rows {
        println!(
            "{:<32} {:>6} elements {:>4}%",
            row.model_name, row.total_elements, row.model_compliance_pct
        );
    }
    Ok(())
}

fn inspect(config: &AppConfig, runtime: &tokio::runtime::Runtime, args: InspectArgs) -> Result<()> {
    let source = Arc::new(FixtureQueryService::from_file(&args.dataset)?);
    let fixture_model = source.model(&args.model)?;
    let model = ModelContext {
        project_id: source.project_id().to_string(),
        model_id: fixture_model.model_id.clone(),
        model_name: fixture_model.model_name.clone(),
        urn: fixture_model.urn.clone(),
    };

    let viewer = PropertyDbViewer::from_file(&args.viewer_db)?;
    let app = App::new(
        model,
        runtime.handle().clone(),
        build_session(config, source)?,
        gateway(&args.store),
        ViewerCorrelationResolver::new(viewer),
    );

    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}
