//! Heatmap level mapping
//!
//! Buckets daily scores into five GitHub-style intensity levels and lays them
//! out on a Sunday-first calendar grid.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;

use crate::types::{DailyQualityScores, HeatmapCell, HeatmapDataPoint, HeatmapLevel};

/// Lower bounds of levels 2, 3 and 4; a boundary belongs to the higher level
pub const LEVEL_BREAKPOINTS: [f64; 3] = [0.25, 0.5, 0.75];

/// Longest heatmap window, in weeks
pub const MAX_HEATMAP_WEEKS: u32 = 520;

/// `days` before `date`, saturating at the earliest representable day
pub(crate) fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Map a score to its heatmap level
///
/// Zero (and anything not positive) is empty. Scores above 1.0, which the
/// consistency multiplier can produce, land on the top level.
pub fn score_to_level(score: f64) -> HeatmapLevel {
    if score.is_nan() || score <= 0.0 {
        HeatmapLevel::Empty
    } else if score < LEVEL_BREAKPOINTS[0] {
        HeatmapLevel::Low
    } else if score < LEVEL_BREAKPOINTS[1] {
        HeatmapLevel::Medium
    } else if score < LEVEL_BREAKPOINTS[2] {
        HeatmapLevel::High
    } else {
        HeatmapLevel::Max
    }
}

/// Turn daily scores into heatmap points using the overall score
pub fn scores_to_heatmap_levels(scores: &[DailyQualityScores]) -> Vec<HeatmapDataPoint> {
    scores
        .iter()
        .map(|s| HeatmapDataPoint {
            date: s.date,
            value: s.overall,
            level: score_to_level(s.overall),
        })
        .collect()
}

/// Lay points out as weeks (Sunday to Saturday) ending on `end`
///
/// The grid starts on the Sunday on or before `end - weeks * 7`, with
/// `weeks` capped at [`MAX_HEATMAP_WEEKS`]. Days without a point are
/// empty. The final week may be partial.
pub fn heatmap_calendar(
    points: &[HeatmapDataPoint],
    end: NaiveDate,
    weeks: u32,
) -> Vec<Vec<HeatmapCell>> {
    let by_date: HashMap<NaiveDate, &HeatmapDataPoint> =
        points.iter().map(|p| (p.date, p)).collect();

    let weeks = weeks.min(MAX_HEATMAP_WEEKS);
    let window_start = days_before(end, weeks as u64 * 7);
    let start = days_before(
        window_start,
        window_start.weekday().num_days_from_sunday() as u64,
    );

    let mut grid = Vec::new();
    let mut week = Vec::with_capacity(7);

    for day in start.iter_days().take_while(|d| *d <= end) {
        let day_of_week = day.weekday().num_days_from_sunday();
        let (value, level) = by_date
            .get(&day)
            .map(|p| (p.value, p.level))
            .unwrap_or((0.0, HeatmapLevel::Empty));

        week.push(HeatmapCell {
            date: day,
            day_of_week,
            value,
            level,
        });

        if day_of_week == 6 {
            grid.push(std::mem::take(&mut week));
        }
    }

    if !week.is_empty() {
        grid.push(week);
    }

    grid
}
