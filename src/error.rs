//! Error types for model compliance analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching one category's elements from the platform.
///
/// The orchestrator recovers from these per category.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteFetchError {
    /// The query did not answer within the per-category timeout.
    #[error("query '{filter}' timed out after {timeout_ms} ms")]
    Timeout { filter: String, timeout_ms: u64 },

    /// The platform answered with data that cannot be normalized.
    #[error("malformed response for '{filter}': {message}")]
    Malformed { filter: String, message: String },

    /// The platform rejected or failed the query.
    #[error("query '{filter}' failed: {message}")]
    Unavailable { filter: String, message: String },
}

/// Discipline-level analysis failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Every category of the discipline failed; no partial result is usable.
    #[error("all categories failed: {}", failed_categories.join(", "))]
    AllCategoriesFailed { failed_categories: Vec<String> },

    /// The discipline id is not part of the catalog.
    #[error("unknown discipline '{0}'")]
    UnknownDiscipline(String),

    /// The selection changed while the run was in flight.
    #[error("analysis for model '{model_id}' / '{discipline_id}' was superseded by a newer selection")]
    Superseded {
        model_id: String,
        discipline_id: String,
    },
}

/// Errors raised by the check persistence gateway.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The check cannot be saved as given. Not retried.
    #[error("invalid check: {message}")]
    Validation { message: String },

    /// The check store failed to read or write. Retryable by the user.
    #[error("check store failure: {message}")]
    Persistence { message: String },
}

/// Errors raised by the viewer collaborator.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The model could not be loaded into the viewer.
    #[error("failed to load model '{urn}': {message}")]
    Load { urn: String, message: String },

    /// The viewer property query failed.
    #[error("viewer query failed: {message}")]
    Query { message: String },

    /// Isolation or visibility reset failed.
    #[error("viewer visibility update failed: {message}")]
    Visibility { message: String },

    /// The property database dump could not be read.
    #[error("failed to read property database '{path}': {message}")]
    PropertyDb { path: PathBuf, message: String },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The TOML content is invalid.
    #[error("invalid configuration: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    /// The discipline catalog is inconsistent.
    #[error("invalid catalog: {message}")]
    InvalidCatalog { message: String },
}

/// Errors that can occur when loading an offline platform dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the dataset file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The dataset JSON is invalid.
    #[error("invalid dataset: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// The requested model is not part of the dataset.
    #[error("model '{0}' not found in dataset")]
    UnknownModel(String),
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}
