//! Decoded spreadsheet structure and validation
//!
//! Excel decoding happens outside this crate; CSV can be decoded here with
//! the `csv` crate. Both produce a [`ParsedSpreadsheetData`].

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::types::CellValue;

/// Header keywords that mark the date column
pub const DATE_HEADER_KEYWORDS: &[&str] = &["date", "day", "time", "timestamp", "when"];

/// Spreadsheet file formats accepted for import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetFormat {
    Csv,
    Excel,
}

impl SpreadsheetFormat {
    /// Pick the format from a file name's extension
    pub fn from_file_name(name: &str) -> Result<Self, EngineError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(SpreadsheetFormat::Csv),
            "xlsx" | "xls" => Ok(SpreadsheetFormat::Excel),
            _ => Err(EngineError::UnsupportedFormat(extension)),
        }
    }
}

/// Header row plus data rows of a decoded sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSpreadsheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub row_count: usize,
}

/// Outcome of [`ParsedSpreadsheetData::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ParsedSpreadsheetData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        Self {
            headers,
            rows,
            row_count,
        }
    }

    /// Decode CSV: first record is the header row, numeric cells become numbers
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, EngineError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            records.push(record.iter().map(type_cell).collect::<Vec<_>>());
        }

        let mut records = records.into_iter();
        let headers = match records.next() {
            Some(first) => first
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => return Err(EngineError::EmptySheet),
        };

        let data = Self::new(headers, records.collect());
        debug!(
            columns = data.headers.len(),
            rows = data.row_count,
            "decoded csv spreadsheet"
        );
        Ok(data)
    }

    /// Decode CSV from a string
    pub fn from_csv_str(content: &str) -> Result<Self, EngineError> {
        Self::from_csv_reader(content.as_bytes())
    }

    /// All cells of one column; short rows yield empty text
    pub fn column(&self, index: usize) -> Vec<CellValue> {
        self.rows
            .iter()
            .map(|row| {
                row.get(index)
                    .cloned()
                    .unwrap_or_else(|| CellValue::Text(String::new()))
            })
            .collect()
    }

    /// Check the sheet is usable for import, collecting every problem
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        if self.headers.is_empty() {
            errors.push("No headers found in the file".to_string());
        }
        if self.row_count == 0 {
            errors.push("No data rows found in the file".to_string());
        }
        if self.headers.len() < 2 {
            errors.push(
                "File must have at least 2 columns (date + at least one habit)".to_string(),
            );
        }

        let inconsistent = self.inconsistent_row_count();
        if inconsistent > 0 {
            errors.push(format!("{} rows have inconsistent column counts", inconsistent));
        }

        if !errors.is_empty() {
            warn!(problems = errors.len(), "spreadsheet failed validation");
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Like [`validate`](Self::validate) but fails on the first problem
    pub fn ensure_valid(&self) -> Result<(), EngineError> {
        if self.headers.is_empty() || self.row_count == 0 {
            return Err(EngineError::EmptySheet);
        }
        if self.headers.len() < 2 {
            return Err(EngineError::MissingColumns);
        }
        match self.inconsistent_row_count() {
            0 => Ok(()),
            n => Err(EngineError::InconsistentRows(n)),
        }
    }

    fn inconsistent_row_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.len() != self.headers.len())
            .count()
    }
}

/// Index of the first header that looks like a date, else 0
pub fn detect_date_column(headers: &[String]) -> usize {
    headers
        .iter()
        .position(|h| {
            let header = h.to_lowercase();
            DATE_HEADER_KEYWORDS.iter().any(|k| header.contains(k))
        })
        .unwrap_or(0)
}

fn type_cell(field: &str) -> CellValue {
    let trimmed = field.trim();
    if !trimmed.is_empty() {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    CellValue::Text(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "Date,Steps,Meditation,Journal\n\
                          2024-01-01,8000,20 min,yes\n\
                          2024-01-02,9500,0:30,no\n";

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(
            SpreadsheetFormat::from_file_name("habits.csv").unwrap(),
            SpreadsheetFormat::Csv
        );
        assert_eq!(
            SpreadsheetFormat::from_file_name("Habits.XLSX").unwrap(),
            SpreadsheetFormat::Excel
        );
        assert_eq!(SpreadsheetFormat::from_file_name("old.xls").unwrap(), SpreadsheetFormat::Excel);

        let err = SpreadsheetFormat::from_file_name("notes.txt").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(ref ext) if ext == "txt"));
        assert!(SpreadsheetFormat::from_file_name("no_extension").is_err());
    }

    #[test]
    fn test_csv_decoding() {
        let data = ParsedSpreadsheetData::from_csv_str(SAMPLE).unwrap();
        assert_eq!(data.headers, vec!["Date", "Steps", "Meditation", "Journal"]);
        assert_eq!(data.row_count, 2);
        assert_eq!(data.rows[0][1], CellValue::Number(8000.0));
        assert_eq!(data.rows[0][2], CellValue::Text("20 min".to_string()));
        assert_eq!(data.rows[1][0], CellValue::Text("2024-01-02".to_string()));
    }

    #[test]
    fn test_csv_skips_blank_lines_and_trims_headers() {
        let data =
            ParsedSpreadsheetData::from_csv_str(" Date , Water \n\n2024-01-01,8\n\n").unwrap();
        assert_eq!(data.headers, vec!["Date", "Water"]);
        assert_eq!(data.row_count, 1);
    }

    #[test]
    fn test_empty_csv() {
        let err = ParsedSpreadsheetData::from_csv_str("").unwrap_err();
        assert!(matches!(err, EngineError::EmptySheet));
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let data = ParsedSpreadsheetData::new(
            vec!["Date".to_string()],
            vec![vec![CellValue::Text("2024-01-01".to_string()), CellValue::Number(1.0)]],
        );
        let report = data.validate();
        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![
                "File must have at least 2 columns (date + at least one habit)".to_string(),
                "1 rows have inconsistent column counts".to_string(),
            ]
        );
        assert!(matches!(data.ensure_valid(), Err(EngineError::MissingColumns)));
    }

    #[test]
    fn test_validation_passes_for_clean_sheet() {
        let data = ParsedSpreadsheetData::from_csv_str(SAMPLE).unwrap();
        assert!(data.validate().is_valid);
        assert!(data.ensure_valid().is_ok());
    }

    #[test]
    fn test_ragged_rows() {
        let data =
            ParsedSpreadsheetData::from_csv_str("Date,A,B\n2024-01-01,1\n2024-01-02,1,0\n")
                .unwrap();
        assert!(matches!(data.ensure_valid(), Err(EngineError::InconsistentRows(1))));
        assert_eq!(data.column(2), vec![CellValue::Text(String::new()), CellValue::Number(0.0)]);
    }

    #[test]
    fn test_detect_date_column() {
        let headers = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(detect_date_column(&headers(&["Steps", "Day", "Water"])), 1);
        assert_eq!(detect_date_column(&headers(&["Steps", "Timestamp"])), 1);
        assert_eq!(detect_date_column(&headers(&["Steps", "Water"])), 0);
    }
}
