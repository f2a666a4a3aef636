//! Error types for Quantalyze
//!
//! Scoring itself never fails: normalization, aggregation, streaks and
//! heatmap levels are total functions. These errors are reported by the
//! import pipeline, habit validation and the outer call surfaces.

use thiserror::Error;

/// Errors that can occur while importing or preparing data for scoring
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV decoding failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unsupported file format: {0}. Please use CSV or Excel files.")]
    UnsupportedFormat(String),

    #[error("Spreadsheet is empty")]
    EmptySheet,

    #[error("Spreadsheet must have at least 2 columns (date + at least one habit)")]
    MissingColumns,

    #[error("{0} rows have inconsistent column counts")]
    InconsistentRows(usize),

    #[error("Column index {index} is out of range ({columns} columns)")]
    ColumnOutOfRange { index: usize, columns: usize },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid weight {0}: must be between 1 and 5")]
    InvalidWeight(u8),

    #[error("Invalid goal value: {0}")]
    InvalidGoalValue(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },
}
