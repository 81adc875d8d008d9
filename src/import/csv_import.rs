//! CSV submission: one request to the bulk-create endpoint.

use tracing::{info, warn};

use crate::api::{BulkImportResponse, QuestionApiOps};
use crate::error::AppError;
use crate::import::ImportOutcome;
use crate::validation::CsvScan;

const DEFAULT_REJECTION: &str = "Failed to import questions";

/// Submits every scanned row (not just the preview) in one bulk request.
///
/// # Errors
///
/// - `AppError::ImportRejected` when the server answers `success: false`
/// - `AppError::RequestFailed` / `AppError::InvalidResponse` from the call itself
pub async fn submit_csv<C: QuestionApiOps>(api: &C, scan: &CsvScan) -> Result<ImportOutcome, AppError> {
    info!("[IMPORT-CSV] Submitting {} rows", scan.len());
    let response = api.bulk_import(&scan.rows).await?;

    if !response.success {
        let reason = response
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
        warn!("[IMPORT-CSV] Server rejected batch");
        return Err(AppError::ImportRejected(reason));
    }

    let outcome = outcome_from_response(response);
    info!(
        "[IMPORT-CSV] Imported {}, {} row errors",
        outcome.imported, outcome.failed
    );
    Ok(outcome)
}

/// Builds the outcome for an accepted batch.
pub fn outcome_from_response(response: BulkImportResponse) -> ImportOutcome {
    let message = if response.errors.is_empty() {
        format!("Successfully imported {} questions!", response.imported)
    } else {
        format!(
            "Successfully imported {} questions! {} had errors.",
            response.imported,
            response.errors.len()
        )
    };

    ImportOutcome {
        imported: response.imported,
        failed: response.errors.len(),
        errors: response.errors,
        message,
    }
}
