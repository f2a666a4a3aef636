//! Score aggregation
//!
//! Combines per-habit normalized values into per-category and overall daily
//! scores:
//!
//! ```text
//! category = (Σ normalized × weight / Σ weight) × consistency multiplier
//! overall  = mean of categories that have at least one active habit
//! ```
//!
//! Active habits without a log for the day still count toward the total
//! weight, so a missed habit pulls its category down. Scores are not clamped
//! after the multiplier is applied and may exceed 1.0.

use tracing::debug;

use crate::normalizer::{round3, Normalizer};
use crate::types::{
    Category, CategoryDetail, CategoryScores, HabitWithLog, NormalizationConfig, RawValue,
    ScoreCalculationResult,
};

/// Aggregator for turning one day of habits and logs into scores
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Score a single day
    pub fn calculate(
        habits: &[HabitWithLog],
        consistency_multiplier: f64,
    ) -> ScoreCalculationResult {
        let mut category_scores = CategoryScores::default();
        let mut details = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let detail = aggregate_category(habits, category);

            let raw_score = if detail.total_weight > 0 {
                detail.weighted_sum / detail.total_weight as f64
            } else {
                0.0
            };
            category_scores.set(category, round3(raw_score * consistency_multiplier));
            details.push(detail);
        }

        let scored: Vec<f64> = details
            .iter()
            .filter(|d| d.habit_count > 0)
            .map(|d| category_scores.get(d.category))
            .collect();

        let overall_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };

        debug!(
            categories = scored.len(),
            overall = overall_score,
            multiplier = consistency_multiplier,
            "daily scores calculated"
        );

        ScoreCalculationResult {
            category_scores,
            overall_score: round3(overall_score),
            consistency_multiplier,
            details,
        }
    }
}

/// Convenience wrapper around [`ScoreAggregator::calculate`]
pub fn calculate_daily_scores(
    habits: &[HabitWithLog],
    consistency_multiplier: f64,
) -> ScoreCalculationResult {
    ScoreAggregator::calculate(habits, consistency_multiplier)
}

fn aggregate_category(habits: &[HabitWithLog], category: Category) -> CategoryDetail {
    let mut detail = CategoryDetail {
        category,
        total_weight: 0,
        weighted_sum: 0.0,
        habit_count: 0,
    };

    for entry in habits
        .iter()
        .filter(|h| h.habit.category == category && h.habit.is_active)
    {
        let weight = entry.habit.weight as u32;
        detail.total_weight += weight;
        detail.habit_count += 1;

        if let Some(log) = &entry.log {
            let normalized = Normalizer::normalize(&NormalizationConfig {
                goal_type: entry.habit.goal_type,
                goal_value: entry.habit.effective_goal(),
                raw_value: RawValue::Number(log.raw_value),
            });
            detail.weighted_sum += normalized.normalized_value * weight as f64;
        }
    }

    detail
}
