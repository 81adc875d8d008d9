//! Question domain types shared by both import paths.
//!
//! `ImportRecord` is the canonical shape of one prospective question. Wire
//! quirks (dual keying for the bulk endpoint, `_id` taxonomy entities) live in
//! the `api` module, not here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// QuestionType
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed set of question kinds the platform accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    LongAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Mcq,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::LongAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::LongAnswer => "long_answer",
        }
    }

    /// Parses the wire name. Surrounding whitespace is ignored, case is not.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Choice types are graded by option correctness.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionType::Mcq | QuestionType::MultipleChoice | QuestionType::TrueFalse
        )
    }

    /// Answer types take free text and may carry a word limit.
    pub fn is_answer(&self) -> bool {
        !self.is_choice()
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status stamped on imported questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Active,
    Inactive,
}

// ─────────────────────────────────────────────────────────────────────────────
// QuestionOption
// ─────────────────────────────────────────────────────────────────────────────

/// One answer option of a choice question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    #[serde(default)]
    pub text: String,
    /// URL or path of an option image; empty when the option is text-only.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub order: u32,
}

impl QuestionOption {
    pub fn text(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
            ..Default::default()
        }
    }
}

/// Rewrites `order` so it matches each option's position.
pub fn renumber_options(options: &mut [QuestionOption]) {
    for (i, opt) in options.iter_mut().enumerate() {
        opt.order = i as u32;
    }
}

/// Appends a blank option at the end.
pub fn add_option(options: &mut Vec<QuestionOption>) {
    options.push(QuestionOption {
        order: options.len() as u32,
        ..Default::default()
    });
}

/// Removes the option at `index` and renumbers the rest.
pub fn remove_option(options: &mut Vec<QuestionOption>, index: usize) -> Result<QuestionOption, AppError> {
    if index >= options.len() {
        return Err(AppError::OptionOutOfRange {
            index,
            len: options.len(),
        });
    }
    let removed = options.remove(index);
    renumber_options(options);
    Ok(removed)
}

/// Moves the option at `from` so it ends up at position `to`.
///
/// Same semantics as a drag-and-drop list: the dragged item is taken out and
/// re-inserted, shifting everything in between by one.
pub fn move_option(options: &mut Vec<QuestionOption>, from: usize, to: usize) -> Result<(), AppError> {
    let len = options.len();
    for index in [from, to] {
        if index >= len {
            return Err(AppError::OptionOutOfRange { index, len });
        }
    }
    let item = options.remove(from);
    options.insert(to, item);
    renumber_options(options);
    Ok(())
}

/// Marks exactly one option as correct (single-answer mcq).
pub fn mark_single_correct(options: &mut [QuestionOption], index: usize) -> Result<(), AppError> {
    if index >= options.len() {
        return Err(AppError::OptionOutOfRange {
            index,
            len: options.len(),
        });
    }
    for (i, opt) in options.iter_mut().enumerate() {
        opt.is_correct = i == index;
    }
    Ok(())
}

/// Option letters used by the CSV format, in column order.
pub const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

/// Letters of the correct options among the first four, joined with `,`.
pub fn correct_letters(options: &[QuestionOption]) -> String {
    options
        .iter()
        .zip(OPTION_LETTERS)
        .filter(|(opt, _)| opt.is_correct)
        .map(|(_, letter)| letter)
        .collect::<Vec<_>>()
        .join(",")
}

// ─────────────────────────────────────────────────────────────────────────────
// Taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// A fully selected category → subject → question-group path (ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub category: String,
    pub subject: String,
    pub question_group: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// ImportRecord
// ─────────────────────────────────────────────────────────────────────────────

fn default_marks() -> f64 {
    1.0
}

/// One prospective question, as POSTed to the single-create endpoint.
///
/// Fields the importer does not know about are kept in `extra` and sent back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default = "default_marks")]
    pub marks: f64,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImportRecord {
    pub fn new(question_text: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            question_text: question_text.into(),
            question_type,
            marks: default_marks(),
            options: Vec::new(),
            tips: None,
            word_limit: None,
            category: None,
            subject: None,
            question_group: None,
            status: None,
            extra: Map::new(),
        }
    }

    pub fn has_correct_option(&self) -> bool {
        self.options.iter().any(|o| o.is_correct)
    }

    /// Checks the record-level rules that hold before submission.
    ///
    /// Returns the reason the record is unusable, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("question text is empty".into());
        }
        if !self.marks.is_finite() || self.marks < 0.0 {
            return Err(format!("marks must be a non-negative number, got {}", self.marks));
        }
        if self.question_type.is_choice() && !self.has_correct_option() {
            return Err(format!(
                "{} question needs at least one correct option",
                self.question_type
            ));
        }
        Ok(())
    }

    /// Applies the selected taxonomy and marks the record active.
    pub fn stamp(&mut self, taxonomy: &Taxonomy) {
        self.category = Some(taxonomy.category.clone());
        self.subject = Some(taxonomy.subject.clone());
        self.question_group = Some(taxonomy.question_group.clone());
        self.status = Some(QuestionStatus::Active);
    }

    /// First 30 characters of the question text, for per-record messages.
    pub fn short_label(&self) -> String {
        self.question_text.chars().take(30).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
