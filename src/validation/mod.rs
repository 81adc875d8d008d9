//! Format parsing and schema validation for both import sources.

pub mod csv_validator;
pub mod json_validator;

pub use csv_validator::{
    scan_csv, split_csv_line, CsvQuestionRow, CsvScan, CsvScanWarning, EXPECTED_HEADERS,
    PREVIEW_ROWS,
};
pub use json_validator::{normalize, parse_entries, scan_json, JsonScan, SkippedRecord};
