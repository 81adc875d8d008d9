//! Canned sample files offered next to each import form.

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::QuoteStyle;
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::files::{temp_file_beside, AtomicCsvWriter};
use crate::validation::EXPECTED_HEADERS;

pub const SAMPLE_CSV_FILE_NAME: &str = "sample_questions.csv";
pub const DEMO_JSON_FILE_NAME: &str = "demo_questions.json";

/// One row per question kind the CSV path supports.
const SAMPLE_ROWS: [[&str; 9]; 6] = [
    ["What is 2+2?", "3", "4", "5", "6", "B", "mcq", "Mathematics", "Easy"],
    [
        "Which are programming languages?",
        "Python",
        "HTML",
        "JavaScript",
        "CSS",
        "A,C",
        "multiple_choice",
        "Programming",
        "Medium",
    ],
    [
        "What is the capital of India?",
        "Mumbai",
        "Delhi",
        "Kolkata",
        "Chennai",
        "B",
        "mcq",
        "Geography",
        "Medium",
    ],
    ["Water boils at 100°C", "True", "False", "", "", "A", "true_false", "Science", "Easy"],
    [
        "Select all prime numbers",
        "2",
        "4",
        "3",
        "6",
        "A,C",
        "multiple_choice",
        "Mathematics",
        "Hard",
    ],
    [
        "Explain photosynthesis process",
        "",
        "",
        "",
        "",
        "Plants convert sunlight into energy using chlorophyll",
        "short_answer",
        "Biology",
        "Hard",
    ],
];

/// Writes the sample CSV with every cell quoted.
pub fn write_sample_csv(path: &Path) -> Result<PathBuf, AppError> {
    let mut writer = AtomicCsvWriter::new(path, QuoteStyle::Always)?;
    writer.write_row(EXPECTED_HEADERS)?;
    for row in SAMPLE_ROWS {
        writer.write_row(row)?;
    }
    let written = writer.rows_written();
    let path = writer.finish()?;
    info!("[SAMPLES] Wrote sample CSV ({} rows)", written);
    Ok(path)
}

/// Two-question demo batch for the JSON importer.
pub fn demo_json() -> Value {
    json!([
        {
            "questionText": "What is the capital of France?",
            "type": "mcq",
            "marks": 1,
            "options": [
                { "text": "Paris", "image": "", "isCorrect": true, "order": 0 },
                { "text": "London", "image": "", "isCorrect": false, "order": 1 },
                { "text": "Berlin", "image": "", "isCorrect": false, "order": 2 }
            ],
            "tips": "City of Light"
        },
        {
            "questionText": "Earth is flat.",
            "type": "true_false",
            "marks": 1,
            "options": [
                { "text": "True", "image": "", "isCorrect": false, "order": 0 },
                { "text": "False", "image": "", "isCorrect": true, "order": 1 }
            ]
        }
    ])
}

/// Writes `demo_json()` pretty-printed. The target is replaced atomically.
pub fn write_demo_json(path: &Path) -> Result<PathBuf, AppError> {
    let text = serde_json::to_string_pretty(&demo_json())
        .map_err(|e| AppError::Internal(format!("Failed to encode demo JSON: {}", e)))?;

    let mut temp_file = temp_file_beside(path)?;
    temp_file
        .write_all(text.as_bytes())
        .and_then(|_| temp_file.flush())
        .map_err(|e| AppError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    temp_file.persist(path).map_err(|e| {
        AppError::Io(format!(
            "Failed to persist file to {}: {}",
            path.display(),
            e.error
        ))
    })?;
    info!("[SAMPLES] Wrote demo JSON");
    Ok(path.to_path_buf())
}
