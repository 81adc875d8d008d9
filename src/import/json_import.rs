//! JSON submission: one create request per record.
//!
//! Serial by default. With `concurrency > 1` requests run on a `JoinSet`
//! capped at that many in flight; results are still reported in input order.

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::api::{CreateQuestionResponse, QuestionApiOps};
use crate::config::MAX_CONCURRENCY;
use crate::error::AppError;
use crate::import::ImportOutcome;
use crate::model::ImportRecord;

/// Submits every record and aggregates the results.
///
/// A failing record never stops the loop.
///
/// # Errors
///
/// `AppError::ImportFailed` when no record was created.
pub async fn submit_json<C: QuestionApiOps>(
    api: &C,
    records: &[ImportRecord],
    concurrency: usize,
) -> Result<ImportOutcome, AppError> {
    let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
    info!(
        "[IMPORT-JSON] Submitting {} records (concurrency {})",
        records.len(),
        concurrency
    );

    let failures = if concurrency == 1 {
        submit_serial(api, records).await
    } else {
        submit_bounded(api, records, concurrency).await
    };

    let errors: Vec<String> = failures.into_iter().flatten().collect();
    let imported = records.len() - errors.len();

    if imported == 0 {
        warn!("[IMPORT-JSON] No records were imported");
        return Err(AppError::ImportFailed {
            failed: errors.len(),
            errors,
        });
    }

    let mut message = format!("Successfully imported {} questions.", imported);
    if !errors.is_empty() {
        message.push_str(&format!(" {} failed.", errors.len()));
    }
    info!("[IMPORT-JSON] {} imported, {} failed", imported, errors.len());

    Ok(ImportOutcome {
        imported,
        failed: errors.len(),
        errors,
        message,
    })
}

/// Failure line for one record, or `None` if it was created.
pub fn record_failure(
    record: &ImportRecord,
    result: Result<CreateQuestionResponse, AppError>,
) -> Option<String> {
    match result {
        Ok(response) if response.success => None,
        Ok(response) => Some(format!(
            "Failed: {}... - {}",
            record.short_label(),
            response.message.as_deref().unwrap_or("Unknown error")
        )),
        Err(_) => Some(format!("Error: {}...", record.short_label())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn submit_serial<C: QuestionApiOps>(api: &C, records: &[ImportRecord]) -> Vec<Option<String>> {
    let mut failures = Vec::with_capacity(records.len());
    for record in records {
        let result = api.create_question(record).await;
        failures.push(record_failure(record, result));
    }
    failures
}

/// Runs creates on a `JoinSet` with at most `max_in_flight` tasks.
async fn submit_bounded<C: QuestionApiOps>(
    api: &C,
    records: &[ImportRecord],
    max_in_flight: usize,
) -> Vec<Option<String>> {
    let mut slots: Vec<Option<Option<String>>> = vec![None; records.len()];
    let mut join_set: JoinSet<(usize, Option<String>)> = JoinSet::new();
    let mut pending = records.iter().cloned().enumerate();

    loop {
        while join_set.len() < max_in_flight {
            let Some((index, record)) = pending.next() else {
                break;
            };
            let api = api.clone();
            join_set.spawn(async move {
                let result = api.create_question(&record).await;
                (index, record_failure(&record, result))
            });
        }

        match join_set.join_next().await {
            Some(Ok((index, failure))) => slots[index] = Some(failure),
            Some(Err(e)) => warn!("[IMPORT-JSON] Task join error: {:?}", e),
            None => break,
        }
    }

    // A slot is only empty if its task panicked.
    slots
        .into_iter()
        .zip(records)
        .map(|(slot, record)| slot.unwrap_or_else(|| Some(format!("Error: {}...", record.short_label()))))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionOption, QuestionType};
    use crate::testing::{created_ok, rejected, FakeApi};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn records(n: usize) -> Vec<ImportRecord> {
        (0..n)
            .map(|i| {
                let mut r = ImportRecord::new(format!("Question {}", i), QuestionType::Mcq);
                r.options = vec![QuestionOption::text("yes", true)];
                r
            })
            .collect()
    }

    /// Fails questions 1, 2 and 4 (two rejections, one transport error).
    fn three_of_five_fail() -> FakeApi {
        FakeApi::default().with_create(|record| match record.question_text.as_str() {
            "Question 1" | "Question 4" => Ok(rejected("Failed to create question")),
            "Question 2" => Err(AppError::RequestFailed("Connection to the server failed".into())),
            _ => Ok(created_ok()),
        })
    }

    #[tokio::test]
    async fn all_created_message() {
        let api = FakeApi::default();
        let outcome = submit_json(&api, &records(3), 1).await.unwrap();
        assert_eq!(outcome.message, "Successfully imported 3 questions.");
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_counts_and_formats_errors() {
        let api = three_of_five_fail();
        let outcome = submit_json(&api, &records(5), 1).await.unwrap();

        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.failed, 3);
        assert_eq!(outcome.message, "Successfully imported 2 questions. 3 failed.");
        assert_eq!(
            outcome.errors,
            vec![
                "Failed: Question 1... - Failed to create question".to_string(),
                "Error: Question 2...".to_string(),
                "Failed: Question 4... - Failed to create question".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn serial_submission_preserves_order() {
        let api = FakeApi::default();
        submit_json(&api, &records(4), 1).await.unwrap();
        assert_eq!(
            api.created_texts(),
            vec!["Question 0", "Question 1", "Question 2", "Question 3"]
        );
        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_submission_respects_limit_and_reports_in_order() {
        let api = three_of_five_fail().with_create_delay(Duration::from_millis(20));
        let outcome = submit_json(&api, &records(5), 2).await.unwrap();

        assert!(api.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(api.created_texts().len(), 5);
        assert_eq!(outcome.message, "Successfully imported 2 questions. 3 failed.");
        assert!(outcome.errors[0].contains("Question 1"));
        assert!(outcome.errors[1].starts_with("Error: Question 2"));
        assert!(outcome.errors[2].contains("Question 4"));
    }

    #[tokio::test]
    async fn zero_successes_is_import_failed() {
        let api = FakeApi::default().with_create(|_| Ok(rejected("duplicate")));
        let err = submit_json(&api, &records(2), 1).await.unwrap_err();
        match err {
            AppError::ImportFailed { failed, errors } => {
                assert_eq!(failed, 2);
                assert_eq!(errors[0], "Failed: Question 0... - duplicate");
            }
            e => panic!("Expected ImportFailed, got: {:?}", e),
        }
    }

    #[test]
    fn failure_label_is_thirty_chars() {
        let record = ImportRecord::new("x".repeat(50), QuestionType::ShortAnswer);
        let line = record_failure(&record, Err(AppError::InvalidResponse("eof".into()))).unwrap();
        assert_eq!(line, format!("Error: {}...", "x".repeat(30)));
    }
}
