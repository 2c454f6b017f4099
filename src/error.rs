//! Error types for corpus-forge operations.
//!
//! Only the collaborator boundary can fail:
//! - Loading record files and raw annotation trees
//! - Writing curated records and reports
//!
//! Everything between those edges (scoring, statistics, mining, clustering,
//! sampling) degrades to empty or zero results instead of returning errors.

use thiserror::Error;

/// Errors that can occur while loading a corpus.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input path '{0}' does not exist")]
    NotFound(String),

    #[error("Input path '{0}' is not a directory")]
    NotADirectory(String),

    #[error("No input given: pass a record file or an annotation directory")]
    NoInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build record batch: {0}")]
    RecordBatch(String),

    #[error("Parquet write failed: {0}")]
    Parquet(String),

    #[error("No records to export")]
    NoRecords,

    #[error("Filesystem error: {0}")]
    FilesystemError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<arrow::error::ArrowError> for ExportError {
    fn from(err: arrow::error::ArrowError) -> Self {
        ExportError::RecordBatch(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for ExportError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        ExportError::Parquet(err.to_string())
    }
}
