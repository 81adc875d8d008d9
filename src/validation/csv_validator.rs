//! CSV question file parsing and validation.
//!
//! The accepted format is the fixed 9-column layout of the sample file. The
//! line scanner is simple:
//! - physical lines are split on `\n`, blank lines dropped
//! - rows are numbered by position among the remaining lines, header = 1
//! - a `"` toggles quoting and is dropped, a `,` outside quotes ends a field
//! - every field is trimmed
//!
//! Escaped quotes (`""`) and newlines inside quoted fields are not supported.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::files::{LineEndings, SourceText};
use crate::model::{QuestionType, OPTION_LETTERS};
use crate::preview::PreviewTable;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Required header cells, in preview order.
pub const EXPECTED_HEADERS: [&str; 9] = [
    "Question Text",
    "Option A",
    "Option B",
    "Option C",
    "Option D",
    "Correct Answer",
    "Question Type",
    "Question Group",
    "Difficulty",
];

/// Number of data rows shown in the preview.
pub const PREVIEW_ROWS: usize = 5;

const DEFAULT_QUESTION_TYPE: &str = "mcq";
const DEFAULT_DIFFICULTY: &str = "Medium";

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// One data row, keyed by the expected columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvQuestionRow {
    /// 1-based position among the non-blank lines (header is 1, first data row is 2).
    pub line: usize,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub question_type: String,
    pub question_group: String,
    pub difficulty: String,
}

impl CsvQuestionRow {
    pub fn options(&self) -> [&str; 4] {
        [
            self.option_a.as_str(),
            self.option_b.as_str(),
            self.option_c.as_str(),
            self.option_d.as_str(),
        ]
    }

    /// Cells in `EXPECTED_HEADERS` order.
    pub fn cells(&self) -> [&str; 9] {
        [
            self.question_text.as_str(),
            self.option_a.as_str(),
            self.option_b.as_str(),
            self.option_c.as_str(),
            self.option_d.as_str(),
            self.correct_answer.as_str(),
            self.question_type.as_str(),
            self.question_group.as_str(),
            self.difficulty.as_str(),
        ]
    }

    /// Option letters named in `Correct Answer`, uppercased (`"a, c"` → `["A", "C"]`).
    pub fn correct_letters(&self) -> Vec<String> {
        self.correct_answer
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Whether `Correct Answer` names at least one non-empty option.
    ///
    /// `true_false` rows may leave options A and B blank; they are then read
    /// as "True" and "False".
    pub fn names_correct_option(&self) -> bool {
        let is_true_false = QuestionType::parse(&self.question_type) == Some(QuestionType::TrueFalse);
        let options = self.options();
        self.correct_letters().iter().any(|letter| {
            OPTION_LETTERS
                .iter()
                .position(|l| *l == letter.as_str())
                .map(|i| !options[i].is_empty() || (is_true_false && i < 2))
                .unwrap_or(false)
        })
    }
}

/// Non-blocking findings of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvScanWarning {
    /// File started with a UTF-8 BOM.
    HasBom,
    /// File mixes `\n` and `\r\n`.
    MixedLineEndings,
    /// A choice-type row whose `Correct Answer` names no non-empty option.
    NoCorrectOption { line: usize },
    /// `Question Type` is not one of the known types.
    UnknownQuestionType { line: usize, value: String },
}

impl std::fmt::Display for CsvScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvScanWarning::HasBom => f.write_str("File starts with a UTF-8 BOM (ignored)"),
            CsvScanWarning::MixedLineEndings => f.write_str("File mixes LF and CRLF line endings"),
            CsvScanWarning::NoCorrectOption { line } => {
                write!(f, "Row {} does not name a correct option", line)
            }
            CsvScanWarning::UnknownQuestionType { line, value } => {
                write!(f, "Row {} has unknown question type '{}'", line, value)
            }
        }
    }
}

/// Result of a successful CSV scan.
#[derive(Debug, Clone, Serialize)]
pub struct CsvScan {
    /// Header cells as they appeared in the file.
    pub headers: Vec<String>,
    pub rows: Vec<CsvQuestionRow>,
    pub warnings: Vec<CsvScanWarning>,
}

impl CsvScan {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Expected headers plus the first `PREVIEW_ROWS` rows, truncated.
    pub fn preview(&self) -> PreviewTable {
        let mut table = PreviewTable::new(
            EXPECTED_HEADERS.iter().map(|h| h.to_string()).collect(),
            self.rows.len(),
        );
        for row in self.rows.iter().take(PREVIEW_ROWS) {
            table.push_row(row.cells());
        }
        table
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Parses and validates CSV question text.
///
/// Aborts on the first structural problem; no partial result is returned.
///
/// # Errors
///
/// - `AppError::CsvTooShort` if there is no data row after the header
/// - `AppError::MissingColumn` naming the first expected column not in the header
/// - `AppError::ColumnCountMismatch` naming the row number of the bad row
pub fn scan_csv(source: &SourceText) -> Result<CsvScan, AppError> {
    let lines: Vec<(usize, &str)> = source
        .text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .collect();

    if lines.len() < 2 {
        return Err(AppError::CsvTooShort);
    }

    let headers = split_csv_line(lines[0].1);
    let mut column_index = [0usize; 9];
    for (slot, expected) in column_index.iter_mut().zip(EXPECTED_HEADERS) {
        *slot = headers
            .iter()
            .position(|h| h == expected)
            .ok_or_else(|| AppError::MissingColumn(expected.to_string()))?;
    }

    let mut warnings = Vec::new();
    if source.had_bom {
        warnings.push(CsvScanWarning::HasBom);
    }
    if source.line_endings == LineEndings::Mixed {
        warnings.push(CsvScanWarning::MixedLineEndings);
    }

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for &(line, text) in &lines[1..] {
        let cells = split_csv_line(text);
        if cells.len() != headers.len() {
            return Err(AppError::ColumnCountMismatch {
                row: line,
                expected: headers.len(),
                found: cells.len(),
            });
        }

        let cell = |col: usize| cells[column_index[col]].clone();
        let row = CsvQuestionRow {
            line,
            question_text: cell(0),
            option_a: cell(1),
            option_b: cell(2),
            option_c: cell(3),
            option_d: cell(4),
            correct_answer: cell(5),
            question_type: or_default(cell(6), DEFAULT_QUESTION_TYPE),
            question_group: cell(7),
            difficulty: or_default(cell(8), DEFAULT_DIFFICULTY),
        };

        match QuestionType::parse(&row.question_type) {
            None => warnings.push(CsvScanWarning::UnknownQuestionType {
                line,
                value: row.question_type.clone(),
            }),
            Some(t) if t.is_choice() && !row.names_correct_option() => {
                warnings.push(CsvScanWarning::NoCorrectOption { line });
            }
            Some(_) => {}
        }

        rows.push(row);
    }

    for w in &warnings {
        warn!("[IMPORT-CSV] {}", w);
    }
    debug!(
        "[IMPORT-CSV] Parsed {} rows, {} warnings",
        rows.len(),
        warnings.len()
    );

    Ok(CsvScan {
        headers,
        rows,
        warnings,
    })
}

/// Splits one line into trimmed fields, honoring double quotes.
///
/// A `"` flips the in-quotes flag and is dropped. A doubled `""` therefore
/// disappears rather than producing a literal quote.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
