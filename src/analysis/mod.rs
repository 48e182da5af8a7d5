pub mod category;
pub mod orchestrator;
pub mod scorer;

pub use category::{canonical_name, CategoryAnalysis, CategoryAnalyzer, ElementQueryService, RawElement};
pub use orchestrator::{
    AnalysisSession, CategoryOutcome, DisciplineAnalysisOrchestrator, DisciplineAnalysisResult,
    RunState, RunToken,
};
pub use scorer::ComplianceScorer;
