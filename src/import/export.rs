//! CSV export of existing questions, in the same 9-column layout the
//! importer reads.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::QuoteStyle;
use serde::Serialize;
use tracing::info;

use crate::api::{ExportSelection, QuestionApiOps};
use crate::error::AppError;
use crate::files::AtomicCsvWriter;
use crate::validation::EXPECTED_HEADERS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Question rows written, header excluded.
    pub count: usize,
}

/// `all_questions_YYYY-MM-DD.csv` or `selected_questions_YYYY-MM-DD.csv`.
pub fn default_export_file_name(selection: &ExportSelection, date: NaiveDate) -> String {
    let prefix = match selection {
        ExportSelection::All => "all",
        ExportSelection::Ids(_) => "selected",
    };
    format!("{}_questions_{}.csv", prefix, date.format("%Y-%m-%d"))
}

/// Fetches the selected questions and writes them to `path`.
///
/// The file only appears once every row has been written.
pub async fn export_to_csv<C: QuestionApiOps>(
    api: &C,
    selection: &ExportSelection,
    path: &Path,
) -> Result<ExportReport, AppError> {
    let questions = api.export_questions(selection).await?;

    let mut writer = AtomicCsvWriter::new(path, QuoteStyle::Always)?;
    writer.write_row(EXPECTED_HEADERS)?;
    for question in &questions {
        writer.write_row(question.to_row())?;
    }
    let path = writer.finish()?;

    info!("[EXPORT] Wrote {} questions", questions.len());
    Ok(ExportReport {
        path,
        count: questions.len(),
    })
}
