//! Import orchestration: submitting scanned batches, the modal-style session,
//! and the sample/export file helpers.

pub mod csv_import;
pub mod export;
pub mod json_import;
pub mod samples;
pub mod session;

use serde::Serialize;

pub use csv_import::submit_csv;
pub use export::{default_export_file_name, export_to_csv, ExportReport};
pub use json_import::submit_json;
pub use samples::{demo_json, write_demo_json, write_sample_csv};
pub use session::{ImportSession, ScanResult, SessionState};

/// Summary of a completed (fully or partly successful) import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub failed: usize,
    /// Per-record or per-row problems, in input order.
    pub errors: Vec<String>,
    /// User-facing summary line.
    pub message: String,
}
