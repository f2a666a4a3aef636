//! Streaks and the consistency multiplier
//!
//! A streak is a run of consecutive calendar days with at least one log.
//! The current streak survives until a full day is missed: activity today
//! or yesterday keeps it alive.

use chrono::{Local, NaiveDate};
use tracing::trace;

use crate::types::StreakInfo;

/// Streak thresholds and their multipliers, highest first
pub const CONSISTENCY_TIERS: [(u32, f64); 4] = [(60, 1.20), (30, 1.15), (14, 1.10), (7, 1.05)];

/// Multiplier below the first tier
pub const BASE_MULTIPLIER: f64 = 1.0;

/// Compute current and longest streaks as of `reference`
///
/// Dates may arrive unsorted or repeated.
pub fn calculate_streak(dates: &[NaiveDate], reference: NaiveDate) -> StreakInfo {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let last_active = match sorted.last() {
        Some(last) => *last,
        None => return StreakInfo::default(),
    };

    let days_since_last_active = (reference - last_active).num_days();

    let current_streak = if days_since_last_active <= 1 {
        1 + sorted
            .windows(2)
            .rev()
            .take_while(|pair| is_next_day(pair[0], pair[1]))
            .count() as u32
    } else {
        0
    };

    let mut longest_streak = 1;
    let mut run = 1;
    for pair in sorted.windows(2) {
        if is_next_day(pair[0], pair[1]) {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 1;
        }
    }

    trace!(
        current = current_streak,
        longest = longest_streak,
        days = sorted.len(),
        "streak calculated"
    );

    StreakInfo {
        current_streak,
        longest_streak: longest_streak.max(current_streak),
        last_active_date: Some(last_active),
    }
}

/// [`calculate_streak`] as of the local calendar day
pub fn calculate_streak_today(dates: &[NaiveDate]) -> StreakInfo {
    calculate_streak(dates, Local::now().date_naive())
}

/// Map a streak length to its score multiplier (1.0 - 1.2)
pub fn calculate_consistency_multiplier(streak_days: u32) -> f64 {
    CONSISTENCY_TIERS
        .iter()
        .find(|(threshold, _)| streak_days >= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(BASE_MULTIPLIER)
}

fn is_next_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    (later - earlier).num_days() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dates(values: &[&str]) -> Vec<NaiveDate> {
        values.iter().map(|s| d(s)).collect()
    }

    #[test]
    fn test_empty_dates() {
        let info = calculate_streak(&[], d("2024-01-03"));
        assert_eq!(info, StreakInfo::default());
        assert_eq!(info.last_active_date, None);
    }

    #[test]
    fn test_consecutive_days() {
        let info = calculate_streak(
            &dates(&["2024-01-01", "2024-01-02", "2024-01-03"]),
            d("2024-01-03"),
        );
        assert_eq!(info.current_streak, 3);
        assert_eq!(info.longest_streak, 3);
        assert_eq!(info.last_active_date, Some(d("2024-01-03")));
    }

    #[test]
    fn test_streak_today_uses_local_calendar_day() {
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        let info = calculate_streak_today(&[yesterday, today]);
        assert_eq!(info.current_streak, 2);
        assert_eq!(info.last_active_date, Some(today));

        let stale = today - chrono::Duration::days(5);
        assert_eq!(calculate_streak_today(&[stale]).current_streak, 0);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let info = calculate_streak(&dates(&["2024-01-01", "2024-01-03"]), d("2024-01-03"));
        assert_eq!(info.current_streak, 1);
        assert_eq!(info.longest_streak, 1);
    }

    #[test]
    fn test_yesterday_keeps_streak_alive() {
        let info = calculate_streak(&dates(&["2024-01-01", "2024-01-02"]), d("2024-01-03"));
        assert_eq!(info.current_streak, 2);
    }

    #[test]
    fn test_missed_day_resets_current_but_keeps_longest() {
        let info = calculate_streak(
            &dates(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]),
            d("2024-01-06"),
        );
        assert_eq!(info.current_streak, 0);
        assert_eq!(info.longest_streak, 4);
    }

    #[test]
    fn test_longest_run_in_the_past() {
        let info = calculate_streak(
            &dates(&[
                "2024-01-01",
                "2024-01-02",
                "2024-01-03",
                "2024-01-04",
                "2024-01-10",
                "2024-01-11",
            ]),
            d("2024-01-11"),
        );
        assert_eq!(info.current_streak, 2);
        assert_eq!(info.longest_streak, 4);
    }

    #[test]
    fn test_unsorted_and_duplicate_dates() {
        let info = calculate_streak(
            &dates(&["2024-01-03", "2024-01-01", "2024-01-02", "2024-01-03"]),
            d("2024-01-03"),
        );
        assert_eq!(info.current_streak, 3);
        assert_eq!(info.longest_streak, 3);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let info = calculate_streak(
            &dates(&["2024-02-28", "2024-02-29", "2024-03-01"]),
            d("2024-03-01"),
        );
        assert_eq!(info.current_streak, 3);
    }

    #[test]
    fn test_multiplier_tiers() {
        assert_eq!(calculate_consistency_multiplier(0), 1.0);
        assert_eq!(calculate_consistency_multiplier(6), 1.0);
        assert_eq!(calculate_consistency_multiplier(7), 1.05);
        assert_eq!(calculate_consistency_multiplier(13), 1.05);
        assert_eq!(calculate_consistency_multiplier(14), 1.10);
        assert_eq!(calculate_consistency_multiplier(29), 1.10);
        assert_eq!(calculate_consistency_multiplier(30), 1.15);
        assert_eq!(calculate_consistency_multiplier(59), 1.15);
        assert_eq!(calculate_consistency_multiplier(60), 1.20);
        assert_eq!(calculate_consistency_multiplier(365), 1.20);
    }

    #[test]
    fn test_multiplier_is_monotonic() {
        let mut previous = 0.0;
        for days in 0..100 {
            let multiplier = calculate_consistency_multiplier(days);
            assert!(multiplier >= previous);
            previous = multiplier;
        }
    }
}
