//! Value normalization
//!
//! This module maps raw logged values onto a 0-1 completion scale:
//! - Binary: yes/no, 1/0, ✓ → 1.0 or 0.0
//! - Number: 8000 of 10000 steps → min(value / goal, 1.0)
//! - Duration: "1h 30m" of 60 minutes → min(minutes / goal, 1.0)
//!
//! Normalization never fails. Anything that cannot be read as a number
//! scores 0.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::types::{GoalType, NormalizationConfig, NormalizedResult, RawValue};

/// Strings that count as "done"
pub const AFFIRMATIVE_TOKENS: &[&str] = &[
    "yes", "true", "y", "1", "done", "completed", "✓", "✔", "x",
];

/// Strings that count as "not done"
pub const NEGATIVE_TOKENS: &[&str] = &["no", "false", "n", "0", "", "skip", "skipped", "-"];

static LEADING_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap());

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").unwrap());

static HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*h").unwrap());

static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*m").unwrap());

/// Normalizer for converting raw logged values to completion scores
pub struct Normalizer;

impl Normalizer {
    /// Normalize a single raw value against its goal
    pub fn normalize(config: &NormalizationConfig) -> NormalizedResult {
        let numeric = coerce(&config.raw_value, config.goal_type);

        let normalized = match config.goal_type {
            GoalType::Binary => binary_score(numeric),
            GoalType::Number | GoalType::Duration => match config.goal_value {
                Some(goal) if goal > 0.0 => (numeric / goal).clamp(0.0, 1.0),
                // No goal set: did something > 0
                _ => binary_score(numeric),
            },
        };

        NormalizedResult {
            normalized_value: round3(normalized),
            raw_value: numeric,
            percentage: (normalized * 100.0).round() as u8,
        }
    }
}

/// Convenience wrapper around [`Normalizer::normalize`]
pub fn normalize(config: &NormalizationConfig) -> NormalizedResult {
    Normalizer::normalize(config)
}

/// Normalize a batch of values sharing one goal
pub fn normalize_values(
    values: &[RawValue],
    goal_type: GoalType,
    goal_value: Option<f64>,
) -> Vec<NormalizedResult> {
    values
        .iter()
        .map(|raw_value| {
            Normalizer::normalize(&NormalizationConfig {
                goal_type,
                goal_value,
                raw_value: raw_value.clone(),
            })
        })
        .collect()
}

/// Mean normalized value of a batch (0 for an empty batch)
pub fn average_normalized(
    values: &[RawValue],
    goal_type: GoalType,
    goal_value: Option<f64>,
) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = normalize_values(values, goal_type, goal_value)
        .iter()
        .map(|r| r.normalized_value)
        .sum();
    sum / values.len() as f64
}

/// Read a string as a number for the given goal type
pub fn parse_string_value(value: &str, goal_type: GoalType) -> f64 {
    let token = value.trim().to_lowercase();

    if AFFIRMATIVE_TOKENS.contains(&token.as_str()) {
        return 1.0;
    }
    if NEGATIVE_TOKENS.contains(&token.as_str()) {
        return 0.0;
    }

    if goal_type == GoalType::Duration {
        return parse_duration_string(&token);
    }

    let compact: String = value
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    match parse_leading_float(&compact) {
        Some(parsed) => parsed,
        None => {
            trace!(value, "unparseable value, scoring as 0");
            0.0
        }
    }
}

/// Parse "1:30", "1:30:30", "1h 30m", "90 mins" or "90" into minutes
pub fn parse_duration_string(value: &str) -> f64 {
    let value = value.trim();

    if value.contains(':') {
        let parts: Option<Vec<f64>> = value.split(':').map(parse_leading_int).collect();
        match parts.as_deref() {
            Some([hours, minutes]) => return hours * 60.0 + minutes,
            Some([hours, minutes, seconds]) => return hours * 60.0 + minutes + seconds / 60.0,
            _ => {}
        }
    }

    let mut total = 0.0;
    if let Some(hours) = capture_number(&HOURS, value) {
        total += hours * 60.0;
    }
    if let Some(minutes) = capture_number(&MINUTES, value) {
        total += minutes;
    }
    if total > 0.0 {
        return total;
    }

    // Plain number, assumed to be minutes
    parse_leading_float(value).unwrap_or_else(|| {
        trace!(value, "unparseable duration, scoring as 0");
        0.0
    })
}

/// Leading-prefix float parse: "12pages" → 12, "abc" → None
pub(crate) fn parse_leading_float(value: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(value.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Round to 3 decimal places
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn parse_leading_int(value: &str) -> Option<f64> {
    LEADING_INT
        .find(value.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|n| n as f64)
}

fn capture_number(pattern: &Regex, value: &str) -> Option<f64> {
    pattern
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn coerce(raw: &RawValue, goal_type: GoalType) -> f64 {
    let numeric = match raw {
        RawValue::Bool(true) => 1.0,
        RawValue::Bool(false) => 0.0,
        RawValue::Number(n) => *n,
        RawValue::Text(s) => parse_string_value(s, goal_type),
    };
    if numeric.is_nan() {
        0.0
    } else {
        numeric
    }
}

fn binary_score(numeric: f64) -> f64 {
    if numeric > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        goal_type: GoalType,
        goal_value: Option<f64>,
        raw: impl Into<RawValue>,
    ) -> NormalizationConfig {
        NormalizationConfig {
            goal_type,
            goal_value,
            raw_value: raw.into(),
        }
    }

    #[test]
    fn test_binary_strings() {
        assert_eq!(normalize(&config(GoalType::Binary, None, "yes")).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, "no")).normalized_value, 0.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, " DONE ")).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, "✓")).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, "skipped")).normalized_value, 0.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, "")).normalized_value, 0.0);
    }

    #[test]
    fn test_binary_bool_and_number() {
        assert_eq!(normalize(&config(GoalType::Binary, None, true)).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, false)).normalized_value, 0.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, 3.0)).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Binary, None, 0.0)).normalized_value, 0.0);
    }

    #[test]
    fn test_binary_is_idempotent() {
        for value in [0.0, 1.0] {
            let once = normalize(&config(GoalType::Binary, None, value)).normalized_value;
            let twice = normalize(&config(GoalType::Binary, None, once)).normalized_value;
            assert_eq!(once, value);
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_number_against_goal() {
        let result = normalize(&config(GoalType::Number, Some(10000.0), 8000.0));
        assert_eq!(result.normalized_value, 0.8);
        assert_eq!(result.percentage, 80);
        assert_eq!(result.raw_value, 8000.0);

        let capped = normalize(&config(GoalType::Number, Some(10000.0), 12000.0));
        assert_eq!(capped.normalized_value, 1.0);
        assert_eq!(capped.percentage, 100);
        assert_eq!(capped.raw_value, 12000.0);
    }

    #[test]
    fn test_number_strings_with_separators() {
        let result = normalize(&config(GoalType::Number, Some(10000.0), "7,500"));
        assert_eq!(result.raw_value, 7500.0);
        assert_eq!(result.normalized_value, 0.75);

        let with_unit = normalize(&config(GoalType::Number, Some(20.0), "12 pages"));
        assert_eq!(with_unit.raw_value, 12.0);
        assert_eq!(with_unit.normalized_value, 0.6);
    }

    #[test]
    fn test_number_without_goal_degrades_to_binary() {
        assert_eq!(normalize(&config(GoalType::Number, None, 42.0)).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Number, Some(0.0), 42.0)).normalized_value, 1.0);
        assert_eq!(normalize(&config(GoalType::Duration, None, "0")).normalized_value, 0.0);
    }

    #[test]
    fn test_rounding_to_three_decimals() {
        let result = normalize(&config(GoalType::Number, Some(3.0), 1.0));
        assert_eq!(result.normalized_value, 0.333);
        assert_eq!(result.percentage, 33);
    }

    #[test]
    fn test_garbage_scores_zero() {
        let result = normalize(&config(GoalType::Number, Some(10.0), "lots"));
        assert_eq!(result.raw_value, 0.0);
        assert_eq!(result.normalized_value, 0.0);

        let nan = normalize(&config(GoalType::Number, Some(10.0), f64::NAN));
        assert_eq!(nan.normalized_value, 0.0);
    }

    #[test]
    fn test_negative_values_floor_at_zero() {
        let result = normalize(&config(GoalType::Number, Some(10.0), -5.0));
        assert_eq!(result.raw_value, -5.0);
        assert_eq!(result.normalized_value, 0.0);
        assert_eq!(result.percentage, 0);
    }

    #[test]
    fn test_duration_clock_formats() {
        let result = normalize(&config(GoalType::Duration, None, "1:30"));
        assert_eq!(result.raw_value, 90.0);

        assert_eq!(parse_duration_string("0:45"), 45.0);
        assert!((parse_duration_string("1:30:30") - 90.5).abs() < 1e-9);
    }

    #[test]
    fn test_duration_unit_formats() {
        let result = normalize(&config(GoalType::Duration, Some(60.0), "1h 30m"));
        assert_eq!(result.raw_value, 90.0);
        assert_eq!(result.normalized_value, 1.0);

        assert_eq!(parse_duration_string("45 mins"), 45.0);
        assert_eq!(parse_duration_string("2 hours"), 120.0);
        assert_eq!(parse_duration_string("1.5h"), 90.0);
        assert_eq!(parse_duration_string("90"), 90.0);
        assert_eq!(parse_duration_string("a while"), 0.0);
    }

    #[test]
    fn test_duration_tokens_still_checked_first() {
        assert_eq!(parse_string_value("yes", GoalType::Duration), 1.0);
        assert_eq!(parse_string_value("-", GoalType::Duration), 0.0);
    }

    #[test]
    fn test_batch_helpers() {
        let values = vec![RawValue::from("yes"), RawValue::from("no"), RawValue::from(true)];
        let results = normalize_values(&values, GoalType::Binary, None);
        assert_eq!(results.len(), 3);

        let average = average_normalized(&values, GoalType::Binary, None);
        assert!((average - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(average_normalized(&[], GoalType::Binary, None), 0.0);
    }
}
