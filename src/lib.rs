//! # Model Compliance
//!
//! Discipline-based parameter compliance analysis for BIM models hosted on a
//! cloud AEC platform.
//!
//! ## Features
//!
//! - Score every element of a discipline against its required
//!   classification and manufacturer parameters
//! - Tolerate failing categories without losing the rest of the run
//! - Aggregate category, discipline and project-wide compliance
//! - Persist analyses as immutable, timestamped checks
//! - Correlate analyzed elements with viewer objects for isolation
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use model_compliance::analysis::{CategoryAnalyzer, ComplianceScorer, DisciplineAnalysisOrchestrator};
//! use model_compliance::config::AppConfig;
//! use model_compliance::source::FixtureQueryService;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let source = Arc::new(FixtureQueryService::from_file("dataset.json")?);
//! let analyzer = CategoryAnalyzer::new(
//!     source,
//!     ComplianceScorer::new(config.analysis.fallback_parameter_count),
//!     config.required_parameters.clone(),
//! );
//! let orchestrator = DisciplineAnalysisOrchestrator::new(
//!     analyzer,
//!     Arc::new(config.catalog()?),
//!     config.analysis.clone(),
//! );
//! let result = orchestrator.run("b.project", "model-1", "architecture").await?;
//! println!("{}", result.status_message());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod source;
pub mod store;
pub mod ui;
pub mod viewer;
