//! Error types for the shopmetrics analysis and ETL pipelines.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`LoadError`] - CSV loading and record parsing errors
//! - [`EtlError`] - Batch ETL driver errors
//! - [`PipelineError`] - Top-level analysis pipeline errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Schema validation (missing required columns) is deliberately *not* an
//! error inside [`crate::validation`]: it is reported there as a plain list
//! so the caller can present it. Only the pipeline boundary converts a
//! non-empty missing list into [`PipelineError::MissingColumns`].

use thiserror::Error;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading or parsing transaction CSV data.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the source file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV structure.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file (no header row).
    #[error("CSV file is empty")]
    EmptyFile,

    /// A field value could not be parsed into its typed form.
    #[error("Row {row}, column '{column}' (value '{value}'): {message}")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
        message: String,
    },
}

impl LoadError {
    /// Build an [`LoadError::InvalidField`] with context.
    pub fn invalid_field(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            row,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ETL Errors
// =============================================================================

/// Errors from the batch ETL driver.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Source CSV could not be opened. Raised before any sink mutation.
    #[error("Source file not found: {path}: {source}")]
    SourceNotFound {
        path: String,
        source: std::io::Error,
    },

    /// CSV read error mid-run.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Source is missing a column the driver needs.
    #[error("Source is missing required column: {0}")]
    MissingColumn(String),

    /// Chunk size must be a positive integer.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    /// Relational sink error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level analysis pipeline errors.
///
/// This is the main error type returned by [`crate::pipeline::analyze_csv`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Load error (source unreadable or malformed).
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Required columns are absent from the input.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for ETL operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
