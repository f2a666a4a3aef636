//! Spreadsheet import
//!
//! Turns a decoded spreadsheet (headers plus rows of cells) into suggested
//! column mappings, and committed mappings into habits and normalized daily
//! logs ready for the storage layer.

mod mapper;
mod spreadsheet;

pub use mapper::*;
pub use spreadsheet::*;
