//! Quantalyze Core - Quality Score engine for personal habit tracking
//!
//! Quantalyze turns raw daily habit logs into comparable 0-1 completion
//! values, rolls them up into per-category and overall quality scores,
//! rewards consecutive active days with a consistency multiplier, and maps
//! scores onto heatmap intensity levels:
//! raw value → normalization → weighted aggregation → streak multiplier → heatmap.
//!
//! ## Modules
//!
//! - **Scoring**: [`normalizer`], [`aggregator`], [`streak`], [`heatmap`], [`pipeline`]
//! - **Import**: [`import`] (spreadsheet decoding, validation, column mapping) and
//!   [`detector`] (goal type and category guessing for imported columns)
//! - **Metadata**: [`buckets`] (category labels, colors and starter habits)

pub mod aggregator;
pub mod buckets;
pub mod detector;
pub mod error;
pub mod heatmap;
pub mod import;
pub mod normalizer;
pub mod pipeline;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{calculate_daily_scores, ScoreAggregator};
pub use detector::{detect_category, detect_column_type, ColumnTypeGuess};
pub use error::EngineError;
pub use heatmap::{heatmap_calendar, score_to_level, scores_to_heatmap_levels};
pub use normalizer::{normalize, normalize_values, Normalizer};
pub use pipeline::{generate_scores_for_date_range, score_day, weekly_trend, ScoreProcessor};
pub use streak::{calculate_consistency_multiplier, calculate_streak, calculate_streak_today};

// Import exports
pub use import::{
    auto_map_columns, build_import, detect_date_column, ImportBatch, ImportConfig,
    ParsedSpreadsheetData, SpreadsheetFormat,
};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
