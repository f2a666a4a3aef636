//! FFI bindings for Quantalyze
//!
//! This module provides C-compatible functions for calling the scoring engine
//! from other languages. Inputs and outputs are JSON documents passed as
//! null-terminated C strings. Returned strings are allocated here and must be
//! freed by the caller using `quantalyze_free_string`.

use chrono::NaiveDate;
use serde::Serialize;
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::aggregator::ScoreAggregator;
use crate::error::EngineError;
use crate::heatmap::scores_to_heatmap_levels;
use crate::import::{ImportConfig, ParsedSpreadsheetData};
use crate::normalizer::Normalizer;
use crate::streak::calculate_streak;
use crate::types::{DailyQualityScores, HabitWithLog, NormalizationConfig};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize a successful result, or record the error and return NULL
fn respond<T: Serialize>(result: Result<T, EngineError>) -> *mut c_char {
    match result.and_then(|value| serde_json::to_string(&value).map_err(EngineError::from)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Scoring API
// ============================================================================

/// Normalize one raw value.
///
/// Input is a `NormalizationConfig` JSON object, output a `NormalizedResult`.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `quantalyze_free_string`.
/// - Returns NULL on error; call `quantalyze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_normalize(config_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    respond(
        serde_json::from_str::<NormalizationConfig>(&json_str)
            .map(|config| Normalizer::normalize(&config))
            .map_err(EngineError::from),
    )
}

/// Score one day.
///
/// Input is a JSON array of habits, each optionally carrying its `log` for
/// the day. Output is a `ScoreCalculationResult`.
///
/// # Safety
/// - `habits_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `quantalyze_free_string`.
/// - Returns NULL on error; call `quantalyze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_daily_scores(
    habits_json: *const c_char,
    consistency_multiplier: f64,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(habits_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    respond(
        serde_json::from_str::<Vec<HabitWithLog>>(&json_str)
            .map(|habits| ScoreAggregator::calculate(&habits, consistency_multiplier))
            .map_err(EngineError::from),
    )
}

/// Compute streak information.
///
/// `dates_json` is a JSON array of `YYYY-MM-DD` strings; `reference_date`
/// is the day treated as today.
///
/// # Safety
/// - `dates_json` and `reference_date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `quantalyze_free_string`.
/// - Returns NULL on error; call `quantalyze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_streak(
    dates_json: *const c_char,
    reference_date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(dates_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let reference_str = match cstr_to_string(reference_date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid reference date string pointer");
            return ptr::null_mut();
        }
    };

    let reference = match NaiveDate::parse_from_str(reference_str.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            set_last_error(&EngineError::InvalidDate(reference_str).to_string());
            return ptr::null_mut();
        }
    };

    respond(
        serde_json::from_str::<Vec<NaiveDate>>(&json_str)
            .map(|dates| calculate_streak(&dates, reference))
            .map_err(EngineError::from),
    )
}

/// Map daily scores onto heatmap points.
///
/// # Safety
/// - `scores_json` must be a valid null-terminated C string holding a JSON
///   array of daily scores.
/// - Returns a newly allocated string that must be freed with `quantalyze_free_string`.
/// - Returns NULL on error; call `quantalyze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_heatmap_levels(scores_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(scores_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    respond(
        serde_json::from_str::<Vec<DailyQualityScores>>(&json_str)
            .map(|scores| scores_to_heatmap_levels(&scores))
            .map_err(EngineError::from),
    )
}

/// Suggest an import configuration for a decoded spreadsheet.
///
/// Input is a `ParsedSpreadsheetData` JSON object; output an `ImportConfig`
/// with the detected date column and one mapping per remaining column.
///
/// # Safety
/// - `data_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `quantalyze_free_string`.
/// - Returns NULL on error; call `quantalyze_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_auto_map_columns(data_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(data_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    respond(
        serde_json::from_str::<ParsedSpreadsheetData>(&json_str)
            .map_err(EngineError::from)
            .and_then(|data| {
                data.ensure_valid()?;
                Ok(ImportConfig::suggest(&data))
            }),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Quantalyze functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Quantalyze function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Quantalyze function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn quantalyze_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
