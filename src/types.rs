//! Core types for the Quantalyze scoring engine
//!
//! This module defines the plain records that flow between the engine and its
//! collaborators: habit definitions and daily logs coming in, normalized
//! values, daily scores, streaks and heatmap points going out.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::EngineError;

/// Smallest weight a habit may carry
pub const MIN_WEIGHT: u8 = 1;

/// Largest weight a habit may carry
pub const MAX_WEIGHT: u8 = 5;

/// Weight assigned to habits created without an explicit one
pub const DEFAULT_WEIGHT: u8 = 3;

/// Habit grouping used for per-category scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vitality,
    Focus,
    Discipline,
    Social,
}

impl Category {
    /// All categories in scoring order
    pub const ALL: [Category; 4] = [
        Category::Vitality,
        Category::Focus,
        Category::Discipline,
        Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vitality => "vitality",
            Category::Focus => "focus",
            Category::Discipline => "discipline",
            Category::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How completion of a habit is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Done / not done
    Binary,
    /// Quantity against a target (steps, pages)
    Number,
    /// Time against a target, in minutes
    Duration,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Binary => "binary",
            GoalType::Number => "number",
            GoalType::Duration => "duration",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logged value as it arrives from a form or a spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// A spreadsheet cell after decoding: numbers stay numeric, everything else is text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for text cells that hold only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&CellValue> for RawValue {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Number(n) => RawValue::Number(*n),
            CellValue::Text(s) => RawValue::Text(s.clone()),
        }
    }
}

/// A tracked habit owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    /// Relative importance, 1-5
    pub weight: u8,
    pub goal_type: GoalType,
    /// Target for number/duration goals
    #[serde(default)]
    pub goal_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub is_active: bool,
}

impl Habit {
    /// Create an active binary habit with the default weight
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category,
            weight: DEFAULT_WEIGHT,
            goal_type: GoalType::Binary,
            goal_value: None,
            unit: None,
            is_active: true,
        }
    }

    /// Goal value, only when it means something for the goal type
    pub fn effective_goal(&self) -> Option<f64> {
        match self.goal_type {
            GoalType::Binary => None,
            GoalType::Number | GoalType::Duration => self.goal_value,
        }
    }

    /// Check weight range and goal value sanity
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&self.weight) {
            return Err(EngineError::InvalidWeight(self.weight));
        }
        if let Some(goal) = self.goal_value {
            if !goal.is_finite() || goal <= 0.0 {
                return Err(EngineError::InvalidGoalValue(format!(
                    "{} for habit '{}'",
                    goal, self.name
                )));
            }
        }
        Ok(())
    }
}

/// One recorded value for a habit on a calendar day
///
/// At most one log exists per (habit_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub raw_value: f64,
    /// Derived from raw_value by the normalizer
    pub normalized_value: f64,
}

/// A habit paired with its log for the day being scored, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithLog {
    #[serde(flatten)]
    pub habit: Habit,
    #[serde(default)]
    pub log: Option<DailyLog>,
}

/// Input to the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub goal_type: GoalType,
    #[serde(default)]
    pub goal_value: Option<f64>,
    pub raw_value: RawValue,
}

/// Output of the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Completion on a 0-1 scale, rounded to 3 decimals
    pub normalized_value: f64,
    /// Numeric coercion of the raw input
    pub raw_value: f64,
    /// 0-100 for display
    pub percentage: u8,
}

/// Score per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub vitality: f64,
    pub focus: f64,
    pub discipline: f64,
    pub social: f64,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Vitality => self.vitality,
            Category::Focus => self.focus,
            Category::Discipline => self.discipline,
            Category::Social => self.social,
        }
    }

    pub fn set(&mut self, category: Category, score: f64) {
        match category {
            Category::Vitality => self.vitality = score,
            Category::Focus => self.focus = score,
            Category::Discipline => self.discipline = score,
            Category::Social => self.social = score,
        }
    }
}

/// Aggregation bookkeeping for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub total_weight: u32,
    pub weighted_sum: f64,
    pub habit_count: usize,
}

/// Scores for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCalculationResult {
    pub category_scores: CategoryScores,
    pub overall_score: f64,
    pub consistency_multiplier: f64,
    /// One entry per category, in `Category::ALL` order
    pub details: Vec<CategoryDetail>,
}

/// Current and longest runs of consecutive active days
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakInfo {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

/// Daily score record as persisted by the storage collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQualityScores {
    pub date: NaiveDate,
    pub vitality: f64,
    pub focus: f64,
    pub discipline: f64,
    pub social: f64,
    pub overall: f64,
    pub consistency_multiplier: f64,
}

/// GitHub-style intensity bucket, serialized as 0-4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HeatmapLevel {
    Empty = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Max = 4,
}

impl From<HeatmapLevel> for u8 {
    fn from(level: HeatmapLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for HeatmapLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HeatmapLevel::Empty),
            1 => Ok(HeatmapLevel::Low),
            2 => Ok(HeatmapLevel::Medium),
            3 => Ok(HeatmapLevel::High),
            4 => Ok(HeatmapLevel::Max),
            other => Err(format!("heatmap level out of range: {}", other)),
        }
    }
}

/// One day on the consistency heatmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapDataPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub level: HeatmapLevel,
}

/// A heatmap point placed on the calendar grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u32,
    pub value: f64,
    pub level: HeatmapLevel,
}

/// Per-day point on the trend chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub vitality: f64,
    pub focus: f64,
    pub discipline: f64,
    pub social: f64,
    pub overall: f64,
}

/// Dashboard card for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketScore {
    pub category: Category,
    pub label: String,
    pub color: String,
    pub score: f64,
    pub habit_count: usize,
    /// Share of active habits with a positive value logged (0-1)
    pub completion_rate: f64,
}

/// Everything the dashboard renders for a reference day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub date: NaiveDate,
    pub bucket_scores: Vec<BucketScore>,
    pub weekly_trend: Vec<TrendPoint>,
    pub heatmap: Vec<HeatmapDataPoint>,
    pub overall_score: f64,
    pub consistency_multiplier: f64,
    pub streak_info: StreakInfo,
    pub total_habits_tracked: usize,
    pub total_logs_this_week: usize,
}
