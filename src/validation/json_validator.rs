//! JSON question import: normalization, filtering and taxonomy stamping.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::files::SourceText;
use crate::model::{renumber_options, ImportRecord, QuestionType, Taxonomy};
use crate::preview::PreviewTable;

/// Headers of the JSON preview table.
pub const JSON_PREVIEW_HEADERS: [&str; 4] = ["#", "Question", "Type", "Marks"];

/// An entry that looked like a question but could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// 0-based position in the normalized array.
    pub index: usize,
    pub reason: String,
}

/// Result of a successful JSON scan. Every record is already stamped.
#[derive(Debug, Clone, Serialize)]
pub struct JsonScan {
    pub records: Vec<ImportRecord>,
    pub skipped: Vec<SkippedRecord>,
    /// Entries without `questionText` or `type`, dropped silently.
    pub dropped: usize,
}

impl JsonScan {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, with question text truncated for display.
    pub fn preview(&self) -> PreviewTable {
        let mut table = PreviewTable::new(
            JSON_PREVIEW_HEADERS.iter().map(|h| h.to_string()).collect(),
            self.records.len(),
        );
        for (i, record) in self.records.iter().enumerate() {
            table.push_row([
                (i + 1).to_string(),
                record.question_text.clone(),
                record.question_type.to_string(),
                record.marks.to_string(),
            ]);
        }
        table
    }
}

/// Parses JSON text and unwraps it into a list of entries.
///
/// Precedence: a bare array, then `{"data": [...]}`, then
/// `{"questions": [...]}`; anything else is wrapped as a single entry.
pub fn parse_entries(text: &str) -> Result<Vec<Value>, AppError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AppError::InvalidJson(e.to_string()))?;
    Ok(normalize(value))
}

pub fn normalize(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["data", "questions"] {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            vec![Value::Object(map)]
        }
        other => vec![other],
    }
}

/// Whether an entry has a non-empty `questionText` string and a truthy `type`.
pub fn is_candidate(entry: &Value) -> bool {
    let has_text = entry
        .get("questionText")
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    has_text && entry.get("type").map(is_truthy).unwrap_or(false)
}

/// Parses, filters and stamps a JSON batch.
///
/// # Errors
///
/// - `AppError::EmptyInput` if the text is blank
/// - `AppError::InvalidJson` on a syntax error
/// - `AppError::NoValidQuestions` if no entry survives filtering
pub fn scan_json(source: &SourceText, taxonomy: &Taxonomy) -> Result<JsonScan, AppError> {
    if source.text.trim().is_empty() {
        return Err(AppError::EmptyInput);
    }

    let entries = parse_entries(&source.text)?;
    let total = entries.len();

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut dropped = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        if !is_candidate(&entry) {
            dropped += 1;
            continue;
        }
        match read_record(entry) {
            Ok(record) => records.push(record),
            Err(reason) => {
                warn!("[IMPORT-JSON] Skipping entry {}: {}", index + 1, reason);
                skipped.push(SkippedRecord { index, reason });
            }
        }
    }

    if records.is_empty() {
        return Err(AppError::NoValidQuestions);
    }

    for record in &mut records {
        record.stamp(taxonomy);
    }

    debug!(
        "[IMPORT-JSON] {} of {} entries kept ({} skipped, {} dropped)",
        records.len(),
        total,
        skipped.len(),
        dropped
    );

    Ok(JsonScan {
        records,
        skipped,
        dropped,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Keys overwritten by [`ImportRecord::stamp`]; whatever the file carries is discarded.
const STAMPED_KEYS: [&str; 4] = ["category", "subject", "questionGroup", "status"];

/// Converts a candidate entry into a checked record, or the reason it is unusable.
fn read_record(mut entry: Value) -> Result<ImportRecord, String> {
    if let Some(Value::String(t)) = entry.get("type") {
        if QuestionType::parse(t).is_none() {
            return Err(format!("unknown question type '{}'", t));
        }
    }

    if let Value::Object(map) = &mut entry {
        for key in STAMPED_KEYS {
            map.remove(key);
        }
        // Exports and spreadsheets often carry marks as "2".
        let numeric_marks = match map.get("marks") {
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64),
            _ => None,
        };
        if let Some(n) = numeric_marks {
            map.insert("marks".to_string(), Value::Number(n));
        }
    }

    let mut record: ImportRecord = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    if record.question_type.is_choice() {
        record.word_limit = None;
    }
    renumber_options(&mut record.options);
    record.check()?;
    Ok(record)
}

/// JavaScript truthiness.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
