//! Column mapping and import batch construction

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::detector::{detect_category, detect_column_type};
use crate::error::EngineError;
use crate::import::spreadsheet::{detect_date_column, ParsedSpreadsheetData};
use crate::normalizer::Normalizer;
use crate::types::{
    CellValue, Category, DailyLog, GoalType, Habit, NormalizationConfig, RawValue, DEFAULT_WEIGHT,
};

/// Rows per insert batch handed to the storage layer
pub const LOG_BATCH_SIZE: usize = 500;

/// Text date formats tried in order; month-first wins for ambiguous dates
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Excel serial day of 9999-12-31
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// How one spreadsheet column becomes a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column_index: usize,
    pub column_name: String,
    pub habit_name: String,
    pub category: Category,
    pub goal_type: GoalType,
    #[serde(default)]
    pub goal_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub weight: u8,
}

/// Committed import settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub date_column: usize,
    pub column_mappings: Vec<ColumnMapping>,
}

impl ImportConfig {
    /// Detected date column plus suggested mappings for every other column
    pub fn suggest(data: &ParsedSpreadsheetData) -> Self {
        let date_column = detect_date_column(&data.headers);
        Self {
            date_column,
            column_mappings: auto_map_columns(data, date_column),
        }
    }
}

/// A single mapped cell of an imported row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedValue {
    pub column_index: usize,
    pub value: CellValue,
}

/// A row whose date could be read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedRow {
    pub date: NaiveDate,
    pub values: Vec<ImportedValue>,
}

/// Habits and logs produced by an import, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub habits: Vec<Habit>,
    pub logs: Vec<DailyLog>,
    /// Rows dropped because their date could not be read
    pub skipped_rows: usize,
}

impl ImportBatch {
    /// Logs split into insert-sized chunks
    pub fn log_batches(&self) -> std::slice::Chunks<'_, DailyLog> {
        self.logs.chunks(LOG_BATCH_SIZE)
    }
}

/// Suggest a mapping for every column except the date column
pub fn auto_map_columns(data: &ParsedSpreadsheetData, date_column: usize) -> Vec<ColumnMapping> {
    data.headers
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != date_column)
        .map(|(index, header)| {
            let guess = detect_column_type(&data.column(index));
            let category = detect_category(header);

            debug!(
                column = %header,
                goal_type = %guess.goal_type,
                category = %category,
                "column mapped"
            );

            ColumnMapping {
                column_index: index,
                column_name: header.clone(),
                habit_name: header.clone(),
                category,
                goal_type: guess.goal_type,
                goal_value: guess.suggested_goal_value,
                unit: None,
                weight: DEFAULT_WEIGHT,
            }
        })
        .collect()
}

/// Read a date cell
///
/// Numbers are Excel serial days. Text is tried against the common
/// spreadsheet formats, then ISO/RFC 3339 date-times.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(value) => compact_date(*value).or_else(|| excel_serial_to_date(*value)),
        CellValue::Text(text) => parse_date_text(text.trim()),
    }
}

/// Keep rows with a readable date, paired with their mapped cells
pub fn process_imported_data(
    data: &ParsedSpreadsheetData,
    config: &ImportConfig,
) -> Vec<ImportedRow> {
    data.rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let date = row.get(config.date_column).and_then(parse_date);
            if date.is_none() {
                warn!(row = index + 1, "skipping row with unreadable date");
            }
            let date = date?;

            let values = config
                .column_mappings
                .iter()
                .map(|mapping| ImportedValue {
                    column_index: mapping.column_index,
                    value: row
                        .get(mapping.column_index)
                        .cloned()
                        .unwrap_or_else(|| CellValue::Text(String::new())),
                })
                .collect();

            Some(ImportedRow { date, values })
        })
        .collect()
}

/// Create habits and normalized logs from a sheet and committed mappings
///
/// A repeated (habit, date) pair keeps the last row's value.
pub fn build_import(
    data: &ParsedSpreadsheetData,
    config: &ImportConfig,
) -> Result<ImportBatch, EngineError> {
    let columns = data.headers.len();
    if config.date_column >= columns {
        return Err(EngineError::ColumnOutOfRange {
            index: config.date_column,
            columns,
        });
    }

    let mut habits = Vec::with_capacity(config.column_mappings.len());
    for mapping in &config.column_mappings {
        if mapping.column_index >= columns {
            return Err(EngineError::ColumnOutOfRange {
                index: mapping.column_index,
                columns,
            });
        }
        let habit = habit_from_mapping(mapping);
        habit.validate()?;
        habits.push(habit);
    }

    let rows = process_imported_data(data, config);
    let skipped_rows = data.row_count.saturating_sub(rows.len());

    let mut by_day: BTreeMap<(NaiveDate, usize), DailyLog> = BTreeMap::new();
    for row in &rows {
        for (slot, (mapping, cell)) in config.column_mappings.iter().zip(&row.values).enumerate() {
            let normalized = Normalizer::normalize(&NormalizationConfig {
                goal_type: mapping.goal_type,
                goal_value: mapping.goal_value,
                raw_value: RawValue::from(&cell.value),
            });

            by_day.insert(
                (row.date, slot),
                DailyLog {
                    habit_id: habits[slot].id,
                    date: row.date,
                    raw_value: normalized.raw_value,
                    normalized_value: normalized.normalized_value,
                },
            );
        }
    }

    let logs: Vec<DailyLog> = by_day.into_values().collect();

    info!(
        habits = habits.len(),
        logs = logs.len(),
        skipped_rows,
        "import batch built"
    );

    Ok(ImportBatch {
        habits,
        logs,
        skipped_rows,
    })
}

fn habit_from_mapping(mapping: &ColumnMapping) -> Habit {
    let name = if mapping.habit_name.trim().is_empty() {
        mapping.column_name.clone()
    } else {
        mapping.habit_name.clone()
    };

    Habit {
        id: Uuid::new_v4(),
        name,
        description: None,
        category: mapping.category,
        weight: mapping.weight,
        goal_type: mapping.goal_type,
        goal_value: mapping.goal_value,
        unit: mapping.unit.clone(),
        is_active: true,
    }
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

/// Whole `YYYYMMDD` numbers such as 20240115
fn compact_date(value: f64) -> Option<NaiveDate> {
    if value.fract() != 0.0 || !(10_000_101.0..=99_991_231.0).contains(&value) {
        return None;
    }
    let n = value as u32;
    NaiveDate::from_ymd_opt((n / 10_000) as i32, n / 100 % 100, n % 100)
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse::<f64>().ok().and_then(compact_date);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample() -> ParsedSpreadsheetData {
        ParsedSpreadsheetData::from_csv_str(
            "Date,Steps,Meditation,Journal,Call family\n\
             2024-01-01,8000,20 min,yes,no\n\
             2024-01-02,10200,0:30,no,yes\n\
             not a date,9000,10 min,yes,yes\n\
             2024-01-03,9500,1h,done,no\n",
        )
        .unwrap()
    }

    #[test]
    fn test_auto_map_columns() {
        let data = sample();
        let mappings = auto_map_columns(&data, 0);

        assert_eq!(mappings.len(), 4);
        assert_eq!(mappings[0].column_index, 1);
        assert_eq!(mappings[0].habit_name, "Steps");
        assert_eq!(mappings[0].category, Category::Vitality);
        assert_eq!(mappings[0].goal_type, GoalType::Number);
        assert_eq!(mappings[0].goal_value, Some(10200.0));
        assert_eq!(mappings[0].weight, 3);

        assert_eq!(mappings[1].category, Category::Focus);
        assert_eq!(mappings[1].goal_type, GoalType::Duration);
        assert_eq!(mappings[1].goal_value, Some(60.0));

        assert_eq!(mappings[2].category, Category::Discipline);
        assert_eq!(mappings[2].goal_type, GoalType::Binary);

        assert_eq!(mappings[3].category, Category::Social);
    }

    #[test]
    fn test_suggest_detects_date_column() {
        let data = ParsedSpreadsheetData::from_csv_str("Water,Day\n8,2024-01-01\n").unwrap();
        let config = ImportConfig::suggest(&data);
        assert_eq!(config.date_column, 1);
        assert_eq!(config.column_mappings.len(), 1);
        assert_eq!(config.column_mappings[0].column_name, "Water");
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date(&text("2024-01-15")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("01/15/2024")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("1/5/2024")), Some(d("2024-01-05")));
        assert_eq!(parse_date(&text("25/12/2024")), Some(d("2024-12-25")));
        assert_eq!(parse_date(&text("2024/03/01")), Some(d("2024-03-01")));
        assert_eq!(parse_date(&text("Jan 15, 2024")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("January 15, 2024")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("15 Jan 2024")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("2024-01-15T08:30:00Z")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("2024-01-15 08:30:00")), Some(d("2024-01-15")));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(&text("")), None);
        assert_eq!(parse_date(&text("yesterday")), None);
        assert_eq!(parse_date(&text("2024-13-40")), None);
        assert_eq!(parse_date(&CellValue::Number(-3.0)), None);
        assert_eq!(parse_date(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_parse_excel_serial() {
        assert_eq!(parse_date(&CellValue::Number(45292.0)), Some(d("2024-01-01")));
        // Time of day is dropped
        assert_eq!(parse_date(&CellValue::Number(45292.75)), Some(d("2024-01-01")));
        assert_eq!(parse_date(&CellValue::Number(2_958_465.0)), Some(d("9999-12-31")));
    }

    #[test]
    fn test_parse_compact_dates() {
        assert_eq!(parse_date(&CellValue::Number(20240101.0)), Some(d("2024-01-01")));
        assert_eq!(parse_date(&text("20240115")), Some(d("2024-01-15")));
        assert_eq!(parse_date(&text("20241340")), None);
        // Not a calendar date and past the last Excel serial
        assert_eq!(parse_date(&CellValue::Number(20241340.0)), None);
        assert_eq!(parse_date(&CellValue::Number(3_000_000.0)), None);
    }

    #[test]
    fn test_process_imported_data_skips_bad_dates() {
        let data = sample();
        let config = ImportConfig {
            date_column: 0,
            column_mappings: auto_map_columns(&data, 0),
        };
        let rows = process_imported_data(&data, &config);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].date, d("2024-01-03"));
        assert_eq!(rows[0].values[0].column_index, 1);
        assert_eq!(rows[0].values[0].value, CellValue::Number(8000.0));
    }

    #[test]
    fn test_build_import() {
        let data = sample();
        let config = ImportConfig {
            date_column: 0,
            column_mappings: auto_map_columns(&data, 0),
        };
        let batch = build_import(&data, &config).unwrap();

        assert_eq!(batch.habits.len(), 4);
        assert_eq!(batch.logs.len(), 12);
        assert_eq!(batch.skipped_rows, 1);
        assert!(batch.habits.iter().all(|h| h.is_active));

        let steps = &batch.habits[0];
        let first_steps = batch
            .logs
            .iter()
            .find(|l| l.habit_id == steps.id && l.date == d("2024-01-01"))
            .unwrap();
        assert_eq!(first_steps.raw_value, 8000.0);
        assert_eq!(first_steps.normalized_value, 0.784);

        let meditation = &batch.habits[1];
        let second_meditation = batch
            .logs
            .iter()
            .find(|l| l.habit_id == meditation.id && l.date == d("2024-01-02"))
            .unwrap();
        assert_eq!(second_meditation.raw_value, 30.0);
        assert_eq!(second_meditation.normalized_value, 0.5);
    }

    #[test]
    fn test_duplicate_dates_upsert() {
        let data =
            ParsedSpreadsheetData::from_csv_str("Date,Read\n2024-01-01,no\n2024-01-01,yes\n")
                .unwrap();
        let config = ImportConfig::suggest(&data);
        let batch = build_import(&data, &config).unwrap();

        assert_eq!(batch.logs.len(), 1);
        assert_eq!(batch.logs[0].normalized_value, 1.0);
    }

    #[test]
    fn test_build_import_rejects_bad_mappings() {
        let data = sample();
        let mut config = ImportConfig::suggest(&data);
        config.column_mappings[0].weight = 9;
        assert!(matches!(
            build_import(&data, &config),
            Err(EngineError::InvalidWeight(9))
        ));

        let mut config = ImportConfig::suggest(&data);
        config.column_mappings[0].column_index = 42;
        assert!(matches!(
            build_import(&data, &config),
            Err(EngineError::ColumnOutOfRange { index: 42, columns: 5 })
        ));
    }

    #[test]
    fn test_log_batches() {
        let habit = Habit::new("Water", Category::Vitality);
        let start = d("2020-01-01");
        let logs: Vec<DailyLog> = (0..1201)
            .map(|i| DailyLog {
                habit_id: habit.id,
                date: start + Duration::days(i),
                raw_value: 1.0,
                normalized_value: 1.0,
            })
            .collect();
        let batch = ImportBatch {
            habits: vec![habit],
            logs,
            skipped_rows: 0,
        };

        let sizes: Vec<usize> = batch.log_batches().map(|chunk| chunk.len()).collect();
        assert_eq!(sizes, vec![500, 500, 201]);
    }
}
