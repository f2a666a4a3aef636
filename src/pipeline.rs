//! Pipeline orchestration
//!
//! This module provides the day-level and range-level entry points used by the
//! dashboard. It pairs habits with their logs, derives the consistency
//! multiplier from the streak, and runs the aggregator.
//!
//! Pipeline stages:
//! 1. Group logs by calendar day
//! 2. Streak over all active days → consistency multiplier
//! 3. Pair each habit with its log for the day
//! 4. ScoreAggregator → category and overall scores
//! 5. Heatmap and trend shaping for display

use chrono::{Days, Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::aggregator::ScoreAggregator;
use crate::error::EngineError;
use crate::heatmap::{days_before, scores_to_heatmap_levels, MAX_HEATMAP_WEEKS};
use crate::normalizer::Normalizer;
use crate::streak::{calculate_consistency_multiplier, calculate_streak};
use crate::types::{
    AnalyticsSummary, BucketScore, DailyLog, DailyQualityScores, Habit, HabitWithLog,
    NormalizationConfig, RawValue, ScoreCalculationResult, StreakInfo, TrendPoint,
};

/// Default number of days on the trend chart
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Longest trend window, in days
pub const MAX_TREND_DAYS: u32 = 366;

/// Default number of weeks on the heatmap
pub const DEFAULT_HEATMAP_WEEKS: u32 = 12;

/// Score every day from `start` to `end` inclusive.
///
/// The streak is computed once over every day that has a log, as of `end`,
/// and its multiplier is applied to every day in the range.
///
/// # Example
/// ```ignore
/// let scores = generate_scores_for_date_range(&habits, &logs, start, end)?;
/// ```
pub fn generate_scores_for_date_range(
    habits: &[Habit],
    logs: &[DailyLog],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyQualityScores>, EngineError> {
    if start > end {
        return Err(EngineError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(score_range(habits, &LogIndex::new(logs), start, end))
}

/// Score a single day the way the dashboard shows it.
///
/// The multiplier comes from the current streak as of `date`.
pub fn score_day(habits: &[Habit], logs: &[DailyLog], date: NaiveDate) -> ScoreCalculationResult {
    let index = LogIndex::new(logs);
    let streak = calculate_streak(&index.active_dates(), date);
    let multiplier = calculate_consistency_multiplier(streak.current_streak);
    ScoreAggregator::calculate(&index.pair(habits, date), multiplier)
}

/// The last `days` calendar days ending on `end`, zero-filled where no score exists
///
/// `days` is capped at [`MAX_TREND_DAYS`]; days before the earliest
/// representable date are left out.
pub fn weekly_trend(scores: &[DailyQualityScores], end: NaiveDate, days: u32) -> Vec<TrendPoint> {
    let by_date: HashMap<NaiveDate, &DailyQualityScores> =
        scores.iter().map(|s| (s.date, s)).collect();

    (0..days.min(MAX_TREND_DAYS) as u64)
        .rev()
        .filter_map(|offset| end.checked_sub_days(Days::new(offset)))
        .map(|date| match by_date.get(&date) {
            Some(s) => TrendPoint {
                date,
                vitality: s.vitality,
                focus: s.focus,
                discipline: s.discipline,
                social: s.social,
                overall: s.overall,
            },
            None => TrendPoint {
                date,
                vitality: 0.0,
                focus: 0.0,
                discipline: 0.0,
                social: 0.0,
                overall: 0.0,
            },
        })
        .collect()
}

/// Configured processor producing dashboard analytics for a reference day.
pub struct ScoreProcessor {
    reference_date: NaiveDate,
    trend_days: u32,
    heatmap_weeks: u32,
}

impl Default for ScoreProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreProcessor {
    /// Processor for today with default trend and heatmap windows
    pub fn new() -> Self {
        Self {
            reference_date: Local::now().date_naive(),
            trend_days: DEFAULT_TREND_DAYS,
            heatmap_weeks: DEFAULT_HEATMAP_WEEKS,
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }

    /// Trend window in days, kept within 1..=[`MAX_TREND_DAYS`]
    pub fn with_trend_days(mut self, days: u32) -> Self {
        self.trend_days = days.clamp(1, MAX_TREND_DAYS);
        self
    }

    /// Heatmap window in weeks, at most [`MAX_HEATMAP_WEEKS`]
    pub fn with_heatmap_weeks(mut self, weeks: u32) -> Self {
        self.heatmap_weeks = weeks.min(MAX_HEATMAP_WEEKS);
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Streak as of the reference day
    pub fn streak(&self, logs: &[DailyLog]) -> StreakInfo {
        calculate_streak(&LogIndex::new(logs).active_dates(), self.reference_date)
    }

    /// Scores for the reference day
    pub fn score_today(&self, habits: &[Habit], logs: &[DailyLog]) -> ScoreCalculationResult {
        score_day(habits, logs, self.reference_date)
    }

    /// Scores for every day in the heatmap window
    pub fn history(&self, habits: &[Habit], logs: &[DailyLog]) -> Vec<DailyQualityScores> {
        score_range(
            habits,
            &LogIndex::new(logs),
            self.window_start(),
            self.reference_date,
        )
    }

    /// Everything the dashboard renders for the reference day
    pub fn summary(&self, habits: &[Habit], logs: &[DailyLog]) -> AnalyticsSummary {
        let index = LogIndex::new(logs);
        let date = self.reference_date;

        let streak_info = calculate_streak(&index.active_dates(), date);
        let multiplier = calculate_consistency_multiplier(streak_info.current_streak);
        let paired = index.pair(habits, date);
        let today = ScoreAggregator::calculate(&paired, multiplier);

        let history = score_range(habits, &index, self.window_start(), date);

        let week_start = days_before(date, self.trend_days as u64 - 1);
        let total_logs_this_week = logs
            .iter()
            .filter(|l| l.date >= week_start && l.date <= date)
            .count();

        let summary = AnalyticsSummary {
            date,
            bucket_scores: bucket_scores(&paired, &today),
            weekly_trend: weekly_trend(&history, date, self.trend_days),
            heatmap: scores_to_heatmap_levels(&history),
            overall_score: today.overall_score,
            consistency_multiplier: multiplier,
            streak_info,
            total_habits_tracked: habits.iter().filter(|h| h.is_active).count(),
            total_logs_this_week,
        };

        info!(
            date = %date,
            overall = summary.overall_score,
            streak = summary.streak_info.current_streak,
            "analytics summary built"
        );

        summary
    }

    fn window_start(&self) -> NaiveDate {
        days_before(self.reference_date, self.heatmap_weeks as u64 * 7)
    }
}

/// Logs grouped by calendar day
struct LogIndex<'a> {
    by_date: HashMap<NaiveDate, Vec<&'a DailyLog>>,
}

impl<'a> LogIndex<'a> {
    fn new(logs: &'a [DailyLog]) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<&'a DailyLog>> = HashMap::new();
        for log in logs {
            by_date.entry(log.date).or_default().push(log);
        }
        Self { by_date }
    }

    fn active_dates(&self) -> Vec<NaiveDate> {
        self.by_date
            .keys()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every habit with its first log on `date`, if any
    fn pair(&self, habits: &[Habit], date: NaiveDate) -> Vec<HabitWithLog> {
        let day_logs = self.by_date.get(&date);
        habits
            .iter()
            .map(|habit| HabitWithLog {
                habit: habit.clone(),
                log: day_logs
                    .and_then(|logs| logs.iter().find(|l| l.habit_id == habit.id))
                    .map(|l| (*l).clone()),
            })
            .collect()
    }
}

fn score_range(
    habits: &[Habit],
    index: &LogIndex<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyQualityScores> {
    let streak = calculate_streak(&index.active_dates(), end);
    let multiplier = calculate_consistency_multiplier(streak.current_streak);

    let scores: Vec<DailyQualityScores> = start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| {
            let result = ScoreAggregator::calculate(&index.pair(habits, date), multiplier);
            DailyQualityScores {
                date,
                vitality: result.category_scores.vitality,
                focus: result.category_scores.focus,
                discipline: result.category_scores.discipline,
                social: result.category_scores.social,
                overall: result.overall_score,
                consistency_multiplier: multiplier,
            }
        })
        .collect();

    debug!(
        days = scores.len(),
        multiplier,
        streak = streak.current_streak,
        "scored date range"
    );

    scores
}

fn bucket_scores(paired: &[HabitWithLog], today: &ScoreCalculationResult) -> Vec<BucketScore> {
    today
        .details
        .iter()
        .map(|detail| {
            let completed = paired
                .iter()
                .filter(|h| h.habit.category == detail.category && h.habit.is_active)
                .filter(|h| is_completed(h))
                .count();

            let completion_rate = if detail.habit_count > 0 {
                completed as f64 / detail.habit_count as f64
            } else {
                0.0
            };

            BucketScore {
                category: detail.category,
                label: detail.category.label().to_string(),
                color: detail.category.color().to_string(),
                score: today.category_scores.get(detail.category),
                habit_count: detail.habit_count,
                completion_rate,
            }
        })
        .collect()
}

fn is_completed(entry: &HabitWithLog) -> bool {
    entry.log.as_ref().is_some_and(|log| {
        Normalizer::normalize(&NormalizationConfig {
            goal_type: entry.habit.goal_type,
            goal_value: entry.habit.effective_goal(),
            raw_value: RawValue::Number(log.raw_value),
        })
        .normalized_value
            > 0.0
    })
}
