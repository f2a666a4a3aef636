//! Column type and category detection
//!
//! Used while importing a spreadsheet to pre-fill each column's goal type,
//! suggested goal and category. Every suggestion can be overridden before
//! the import is committed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::normalizer::parse_leading_float;
use crate::types::{CellValue, Category, GoalType};

/// Number of leading non-empty values inspected per column
pub const SAMPLE_SIZE: usize = 10;

/// Share of numeric samples needed to call a column numeric
pub const NUMERIC_THRESHOLD: f64 = 0.7;

/// Suggested goal for duration columns, in minutes
pub const DEFAULT_DURATION_GOAL: f64 = 60.0;

/// Values a yes/no column is made of
pub const BINARY_TOKENS: &[&str] = &[
    "yes", "no", "y", "n", "true", "false", "1", "0", "done", "skip", "✓", "✔", "x", "-",
];

// HH:MM prefix, or a number followed by h/m (covers "min" and "hour")
static DURATION_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+:\d+|\d+\s*h|\d+\s*m").unwrap());

/// Keyword sets in priority order; the first set with a match wins
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Vitality,
        &[
            "sleep", "exercise", "workout", "gym", "run", "walk", "diet", "food", "eat", "water",
            "hydrat", "vitamin", "health", "steps", "weight",
        ],
    ),
    (
        Category::Focus,
        &[
            "work", "read", "learn", "study", "course", "book", "code", "project", "focus",
            "meditat", "social media", "phone",
        ],
    ),
    (
        Category::Discipline,
        &[
            "wake", "morning", "routine", "journal", "cold", "shower", "early", "bed", "snooze",
            "habit",
        ],
    ),
    (
        Category::Social,
        &[
            "family", "friend", "call", "network", "mentor", "community", "date", "social",
            "relationship",
        ],
    ),
];

/// Category used when no keyword matches
pub const FALLBACK_CATEGORY: Category = Category::Discipline;

/// Inferred goal settings for a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypeGuess {
    pub goal_type: GoalType,
    pub suggested_goal_value: Option<f64>,
}

impl ColumnTypeGuess {
    fn binary() -> Self {
        Self {
            goal_type: GoalType::Binary,
            suggested_goal_value: None,
        }
    }
}

/// Infer the goal type of a column from its values
pub fn detect_column_type(values: &[CellValue]) -> ColumnTypeGuess {
    let samples: Vec<String> = values
        .iter()
        .filter(|v| !v.is_blank())
        .take(SAMPLE_SIZE)
        .map(|v| v.to_string().trim().to_lowercase())
        .collect();

    if samples.is_empty() {
        return ColumnTypeGuess::binary();
    }

    if samples.iter().all(|s| BINARY_TOKENS.contains(&s.as_str())) {
        return ColumnTypeGuess::binary();
    }

    if samples.iter().any(|s| DURATION_LIKE.is_match(s)) {
        return ColumnTypeGuess {
            goal_type: GoalType::Duration,
            suggested_goal_value: Some(DEFAULT_DURATION_GOAL),
        };
    }

    let numeric: Vec<f64> = samples
        .iter()
        .filter_map(|s| {
            let compact: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            parse_leading_float(&compact)
        })
        .collect();

    if numeric.len() as f64 > samples.len() as f64 * NUMERIC_THRESHOLD {
        let max = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return ColumnTypeGuess {
            goal_type: GoalType::Number,
            suggested_goal_value: Some(max.ceil()),
        };
    }

    trace!(samples = samples.len(), "no dominant value shape, defaulting to binary");
    ColumnTypeGuess::binary()
}

/// Infer a category from a column header
pub fn detect_category(column_name: &str) -> Category {
    let name = column_name.to_lowercase();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}
