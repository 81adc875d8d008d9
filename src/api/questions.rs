//! Question endpoints: bulk CSV create, single create, and export.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::client::{http_status_error, parse_body, read_body, QuestionApiClient};
use crate::error::AppError;
use crate::model::{correct_letters, ImportRecord, QuestionOption};
use crate::validation::CsvQuestionRow;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

pub const QUESTIONS_PATH: &str = "/api/questions";
pub const BULK_IMPORT_PATH: &str = "/api/questions/import";
pub const EXPORT_PATH: &str = "/api/questions/export";

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// One CSV row as sent to the bulk endpoint.
///
/// The backend accepts either spelling, so most fields appear twice: once in
/// camelCase and once under the CSV header name.
#[derive(Debug, Serialize)]
pub struct BulkQuestionPayload<'a> {
    #[serde(rename = "questionText")]
    pub question_text: &'a str,
    #[serde(rename = "Question Text")]
    pub question_text_header: &'a str,
    #[serde(rename = "Option A")]
    pub option_a: &'a str,
    #[serde(rename = "Option B")]
    pub option_b: &'a str,
    #[serde(rename = "Option C")]
    pub option_c: &'a str,
    #[serde(rename = "Option D")]
    pub option_d: &'a str,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: &'a str,
    #[serde(rename = "Correct Answer")]
    pub correct_answer_header: &'a str,
    #[serde(rename = "type")]
    pub question_type: &'a str,
    #[serde(rename = "Question Type")]
    pub question_type_header: &'a str,
    #[serde(rename = "questionGroup")]
    pub question_group: &'a str,
    #[serde(rename = "Question Group")]
    pub question_group_header: &'a str,
    pub difficulty: &'a str,
}

impl<'a> From<&'a CsvQuestionRow> for BulkQuestionPayload<'a> {
    fn from(row: &'a CsvQuestionRow) -> Self {
        Self {
            question_text: &row.question_text,
            question_text_header: &row.question_text,
            option_a: &row.option_a,
            option_b: &row.option_b,
            option_c: &row.option_c,
            option_d: &row.option_d,
            correct_answer: &row.correct_answer,
            correct_answer_header: &row.correct_answer,
            question_type: &row.question_type,
            question_type_header: &row.question_type,
            question_group: &row.question_group,
            question_group_header: &row.question_group,
            difficulty: &row.difficulty,
        }
    }
}

#[derive(Debug, Serialize)]
struct BulkImportRequest<'a> {
    questions: Vec<BulkQuestionPayload<'a>>,
}

/// Bulk endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BulkImportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub imported: usize,
    /// Per-row problems reported by the server.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Reason for a rejected batch.
    #[serde(default)]
    pub error: Option<String>,
}

/// Single-create endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQuestionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// The created question, as returned by the server.
    #[serde(default)]
    pub data: Option<Value>,
}

impl CreateQuestionResponse {
    /// Server-assigned id, if the response carries one.
    pub fn created_id(&self) -> Option<&str> {
        self.data.as_ref()?.get("_id")?.as_str()
    }
}

/// Which questions to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    All,
    Ids(Vec<String>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    question_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    export_all: bool,
}

/// One question as returned by the export endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedQuestion {
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: Option<String>,
    /// Group name, or a populated `{_id, name}` object.
    #[serde(default)]
    pub question_group: Option<Value>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl ExportedQuestion {
    /// `correctAnswer` when the server sent one, else letters of the correct options.
    pub fn correct_answer_cell(&self) -> String {
        match self.correct_answer.as_deref() {
            Some(answer) if !answer.is_empty() => answer.to_string(),
            _ => correct_letters(&self.options),
        }
    }

    pub fn group_cell(&self) -> String {
        match &self.question_group {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Object(map)) => map
                .get("name")
                .or_else(|| map.get("_id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    /// The nine cells of an export row, in header order.
    pub fn to_row(&self) -> [String; 9] {
        let option = |i: usize| {
            self.options
                .get(i)
                .map(|o| o.text.clone())
                .unwrap_or_default()
        };
        [
            self.question_text.clone(),
            option(0),
            option(1),
            option(2),
            option(3),
            self.correct_answer_cell(),
            self.question_type.clone().unwrap_or_default(),
            self.group_cell(),
            self.difficulty.clone().unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    questions: Vec<ExportedQuestion>,
    #[serde(default)]
    error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Endpoints
// ─────────────────────────────────────────────────────────────────────────────

impl QuestionApiClient {
    /// Sends every parsed CSV row to the bulk-create endpoint in one request.
    ///
    /// Returns the decoded response whether or not `success` is set; the
    /// caller decides what a rejected batch means.
    ///
    /// # Errors
    ///
    /// - `AppError::RequestFailed` on transport failure or a non-2xx status
    /// - `AppError::InvalidResponse` on an empty or unparsable body
    pub async fn bulk_import(&self, rows: &[CsvQuestionRow]) -> Result<BulkImportResponse, AppError> {
        let body = BulkImportRequest {
            questions: rows.iter().map(BulkQuestionPayload::from).collect(),
        };

        info!("[API] Bulk import of {} rows", rows.len());
        let response = self.post_json(BULK_IMPORT_PATH, &body).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status));
        }

        let text = read_body(response).await?;
        parse_body(&text)
    }

    /// Creates one question.
    ///
    /// The server answers failures with `{success: false, message}` and a
    /// non-2xx status, so the body is decoded regardless of status.
    ///
    /// # Errors
    ///
    /// - `AppError::RequestFailed` on transport failure, or a non-2xx status
    ///   whose body is not a question envelope
    /// - `AppError::InvalidResponse` on an empty or unparsable 2xx body
    pub async fn create_question(&self, record: &ImportRecord) -> Result<CreateQuestionResponse, AppError> {
        let response = self.post_json(QUESTIONS_PATH, record).await?;
        let status = response.status();
        let text = read_body(response).await?;

        match parse_body::<CreateQuestionResponse>(&text) {
            Ok(parsed) => {
                if let Some(id) = parsed.created_id() {
                    debug!("[API] Created question {}", super::client::redact_id(id));
                }
                Ok(parsed)
            }
            Err(_) if !status.is_success() => Err(http_status_error(status)),
            Err(e) => Err(e),
        }
    }

    /// Fetches questions for CSV export.
    ///
    /// # Errors
    ///
    /// - `AppError::ExportFailed` for an empty id list or `success: false`
    /// - `AppError::RequestFailed` / `AppError::InvalidResponse` as for other calls
    pub async fn export_questions(&self, selection: &ExportSelection) -> Result<Vec<ExportedQuestion>, AppError> {
        let body = match selection {
            ExportSelection::All => ExportRequest {
                question_ids: None,
                export_all: true,
            },
            ExportSelection::Ids(ids) if ids.is_empty() => {
                return Err(AppError::ExportFailed(
                    "No questions specified for export".to_string(),
                ))
            }
            ExportSelection::Ids(ids) => ExportRequest {
                question_ids: Some(ids.as_slice()),
                export_all: false,
            },
        };

        let response = self.post_json(EXPORT_PATH, &body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status));
        }

        let text = read_body(response).await?;
        let parsed: ExportResponse = parse_body(&text)?;
        if !parsed.success {
            return Err(AppError::ExportFailed(
                parsed.error.unwrap_or_else(|| "Export failed".to_string()),
            ));
        }

        info!("[EXPORT] Received {} questions", parsed.questions.len());
        Ok(parsed.questions)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
