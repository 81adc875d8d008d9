use serde::Serialize;
use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "bearer ",
    "authorization:",
    "api_token",
    "access_token",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// User-friendly error presentation, the equivalent of an error toast.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Source ────────────────────────────────────────────────────────────────
    #[error("Please select a CSV file")]
    NotCsvFile,

    #[error("Input is not valid UTF-8")]
    NotUtf8,

    #[error("Input is empty")]
    EmptyInput,

    // ── CSV ───────────────────────────────────────────────────────────────────
    #[error("CSV file must have at least a header row and one data row")]
    CsvTooShort,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Row {row} has incorrect number of columns")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    // ── JSON ──────────────────────────────────────────────────────────────────
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("No valid questions found in JSON. Ensure keys like \"questionText\" and \"type\" exist.")]
    NoValidQuestions,

    // ── Taxonomy ──────────────────────────────────────────────────────────────
    #[error("Please select Category, Subject, and Group first.")]
    TaxonomyIncomplete,

    #[error("Unknown {level}: {id}")]
    UnknownTaxonomy { level: &'static str, id: String },

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    // ── Submission ────────────────────────────────────────────────────────────
    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("No questions were imported ({failed} failed)")]
    ImportFailed { failed: usize, errors: Vec<String> },

    #[error("Export failed: {0}")]
    ExportFailed(String),

    // ── Session ───────────────────────────────────────────────────────────────
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("Option index {index} out of range (len {len})")]
    OptionOutOfRange { index: usize, len: usize },

    // ── Environment ───────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a user-facing presentation.
    /// Never leaks tokens or authorization headers.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Source ────────────────────────────────────────────────────────
            AppError::NotCsvFile => ErrorPresentation {
                title: "Wrong File Type".into(),
                message: "Please select a CSV file.".into(),
                action: Some("Choose a file ending in .csv".into()),
            },

            AppError::NotUtf8 => ErrorPresentation {
                title: "Invalid File Encoding".into(),
                message: "The input must be UTF-8 encoded. Please re-save it with UTF-8 encoding."
                    .into(),
                action: Some("Convert file to UTF-8".into()),
            },

            AppError::EmptyInput => ErrorPresentation {
                title: "Nothing to Import".into(),
                message: "The input is empty.".into(),
                action: Some("Select a file or paste content".into()),
            },

            // ── CSV ───────────────────────────────────────────────────────────
            AppError::CsvTooShort | AppError::MissingColumn(_) => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: self.to_string(),
                action: Some("Download the sample CSV to see the expected format".into()),
            },

            AppError::ColumnCountMismatch { expected, found, .. } => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: format!("{} (expected {}, found {}).", self, expected, found),
                action: Some("Fix the CSV file and try again".into()),
            },

            // ── JSON ──────────────────────────────────────────────────────────
            AppError::InvalidJson(msg) => ErrorPresentation {
                title: "Invalid JSON".into(),
                message: sanitize_message(msg, "The JSON could not be parsed."),
                action: Some("Fix the JSON syntax and scan again".into()),
            },

            AppError::NoValidQuestions => ErrorPresentation {
                title: "Invalid JSON".into(),
                message: self.to_string(),
                action: Some("Download the demo JSON to see the expected shape".into()),
            },

            // ── Taxonomy ──────────────────────────────────────────────────────
            AppError::TaxonomyIncomplete => ErrorPresentation {
                title: "Selection Required".into(),
                message: self.to_string(),
                action: Some("Select a category, subject and group".into()),
            },

            AppError::UnknownTaxonomy { level, .. } => ErrorPresentation {
                title: "Selection Not Found".into(),
                message: format!("The selected {} does not exist or is inactive.", level),
                action: Some("List the available entries and pick one".into()),
            },

            // ── Network ───────────────────────────────────────────────────────
            AppError::RequestFailed(msg) => ErrorPresentation {
                title: "Request Failed".into(),
                message: sanitize_message(msg, "The request to the server failed."),
                action: Some("Check network and retry".into()),
            },

            AppError::InvalidResponse(_) => ErrorPresentation {
                title: "Invalid Response".into(),
                message: "Invalid response from server. Please try again.".into(),
                action: Some("Try again".into()),
            },

            // ── Submission ────────────────────────────────────────────────────
            AppError::ImportRejected(msg) => ErrorPresentation {
                title: "Import Failed".into(),
                message: sanitize_message(msg, "Failed to import questions."),
                action: Some("Review the file and try again".into()),
            },

            AppError::ImportFailed { errors, .. } => {
                let details = sanitize_message(&errors.join("\n"), "");
                let message = if details.is_empty() {
                    "No questions were imported.".to_string()
                } else {
                    format!("No questions were imported. {}", details)
                };
                ErrorPresentation {
                    title: "Import Failed".into(),
                    message,
                    action: Some("Review the errors and try again".into()),
                }
            }

            AppError::ExportFailed(msg) => ErrorPresentation {
                title: "Export Failed".into(),
                message: sanitize_message(msg, "Failed to export questions."),
                action: Some("Try again".into()),
            },

            // ── Session ───────────────────────────────────────────────────────
            AppError::InvalidTransition { .. } | AppError::OptionOutOfRange { .. } => {
                ErrorPresentation {
                    title: "Not Allowed".into(),
                    message: self.to_string(),
                    action: None,
                }
            }

            // ── Environment ───────────────────────────────────────────────────
            AppError::Config(msg) => ErrorPresentation {
                title: "Configuration Error".into(),
                message: sanitize_message(msg, "The configuration is invalid."),
                action: Some("Check flags and environment variables".into()),
            },

            AppError::Io(msg) => ErrorPresentation {
                title: "File Error".into(),
                message: sanitize_message(msg, "A file could not be read or written."),
                action: Some("Check the path and permissions".into()),
            },

            // ── Generic ───────────────────────────────────────────────────────
            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            // Source
            AppError::NotCsvFile,
            AppError::NotUtf8,
            AppError::EmptyInput,
            // CSV
            AppError::CsvTooShort,
            AppError::MissingColumn("Difficulty".into()),
            AppError::ColumnCountMismatch { row: 3, expected: 9, found: 8 },
            // JSON
            AppError::InvalidJson("expected value at line 1".into()),
            AppError::NoValidQuestions,
            // Taxonomy
            AppError::TaxonomyIncomplete,
            AppError::UnknownTaxonomy { level: "subject", id: "s1".into() },
            // Network
            AppError::RequestFailed("HTTP 500".into()),
            AppError::InvalidResponse("empty body".into()),
            // Submission
            AppError::ImportRejected("bad rows".into()),
            AppError::ImportFailed { failed: 2, errors: vec!["Error: Q1...".into()] },
            AppError::ExportFailed("HTTP 404".into()),
            // Session
            AppError::InvalidTransition { from: "importing", action: "close" },
            AppError::OptionOutOfRange { index: 5, len: 4 },
            // Environment
            AppError::Config("concurrency must be between 1 and 8".into()),
            AppError::Io("permission denied".into()),
            // Generic
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(
                !presentation.title.trim().is_empty(),
                "Empty title for {:?}",
                variant
            );
            assert!(
                !presentation.message.trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn missing_column_message_names_the_column() {
        let presentation = AppError::MissingColumn("Difficulty".into()).to_presentation();
        assert!(presentation.message.contains("Difficulty"));
    }

    #[test]
    fn column_mismatch_names_the_row() {
        let err = AppError::ColumnCountMismatch { row: 4, expected: 9, found: 7 };
        assert_eq!(err.to_string(), "Row 4 has incorrect number of columns");
        let presentation = err.to_presentation();
        assert!(presentation.message.contains("Row 4"));
        assert!(presentation.message.contains("expected 9, found 7"));
    }

    #[test]
    fn transport_and_response_failures_are_distinct() {
        let failed = AppError::RequestFailed("HTTP 502".into()).to_presentation();
        let invalid = AppError::InvalidResponse("eof".into()).to_presentation();
        assert_ne!(failed.title, invalid.title);
        assert!(invalid.message.contains("Invalid response from server"));
    }

    #[test]
    fn serialization_produces_valid_json_with_required_fields() {
        for variant in all_variants() {
            let json = serde_json::to_string(&variant)
                .unwrap_or_else(|_| panic!("Failed to serialize {:?}", variant));

            let parsed: serde_json::Value = serde_json::from_str(&json)
                .unwrap_or_else(|_| panic!("Failed to parse JSON for {:?}", variant));

            assert!(parsed.get("title").is_some(), "{:?} missing 'title'", variant);
            assert!(parsed.get("message").is_some(), "{:?} missing 'message'", variant);
            assert!(parsed.get("action").is_some(), "{:?} missing 'action'", variant);
        }
    }

    #[test]
    fn no_secret_leakage_in_presentation() {
        let test_cases: Vec<(&str, AppError)> = vec![
            ("RequestFailed", AppError::RequestFailed("Authorization: Bearer abc".into())),
            ("ImportRejected", AppError::ImportRejected("api_token=xyz".into())),
            ("Config", AppError::Config("bearer secret-value".into())),
            (
                "ImportFailed",
                AppError::ImportFailed {
                    failed: 1,
                    errors: vec!["Bearer token invalid".into()],
                },
            ),
        ];

        for (label, variant) in test_cases {
            let presentation = variant.to_presentation();
            let output_lower = format!(
                "{} {} {}",
                presentation.title,
                presentation.message,
                presentation.action.as_deref().unwrap_or("")
            )
            .to_ascii_lowercase();

            for pattern in SENSITIVE_PATTERNS {
                assert!(
                    !output_lower.contains(pattern),
                    "{} presentation contains sensitive pattern",
                    label
                );
            }
        }
    }
}
