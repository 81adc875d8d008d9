//! Scan → preview → import session shared by the CSV and JSON paths.
//!
//! ```text
//! Input ──scan──▶ Scanning ──ok──▶ Preview ──import──▶ Importing ──ok──▶ Closed
//!   ▲                │  err           │ back              │ err
//!   └────────────────┘◀───────────────┘      Preview ◀────┘
//! ```
//!
//! The last error is kept as an `ErrorPresentation` so a caller can show it
//! after the state has already moved back.

use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::api::client::redact_id;
use crate::api::QuestionApiOps;
use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{AppError, ErrorPresentation};
use crate::files::SourceText;
use crate::import::{submit_csv, submit_json, ImportOutcome};
use crate::model::Taxonomy;
use crate::preview::PreviewTable;
use crate::validation::{self, CsvScan, JsonScan};

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Input,
    Scanning,
    Preview,
    Importing,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Input => "input",
            SessionState::Scanning => "scanning",
            SessionState::Preview => "preview",
            SessionState::Importing => "importing",
            SessionState::Closed => "closed",
        }
    }
}

/// Parsed batch held between scan and import.
#[derive(Debug, Clone)]
pub enum ScanResult {
    Csv(CsvScan),
    Json(JsonScan),
}

impl ScanResult {
    pub fn preview(&self) -> PreviewTable {
        match self {
            ScanResult::Csv(scan) => scan.preview(),
            ScanResult::Json(scan) => scan.preview(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ScanResult::Csv(scan) => scan.len(),
            ScanResult::Json(scan) => scan.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type SuccessCallback = Box<dyn FnMut() + Send>;

/// One import dialog's worth of state.
pub struct ImportSession<C: QuestionApiOps> {
    api: C,
    state: SessionState,
    batch_id: Option<Uuid>,
    scan: Option<ScanResult>,
    last_error: Option<ErrorPresentation>,
    concurrency: usize,
    scan_delay: Duration,
    on_import_success: Option<SuccessCallback>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction and accessors
// ─────────────────────────────────────────────────────────────────────────────

impl<C: QuestionApiOps> ImportSession<C> {
    pub fn new(api: C) -> Self {
        Self {
            api,
            state: SessionState::Input,
            batch_id: None,
            scan: None,
            last_error: None,
            concurrency: DEFAULT_CONCURRENCY,
            scan_delay: Duration::ZERO,
            on_import_success: None,
        }
    }

    /// Worker count for JSON submission. Ignored by the CSV path.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Pause before each scan. Cosmetic only.
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    /// Called once after an import that created at least one question.
    pub fn on_import_success<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_import_success = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&ErrorPresentation> {
        self.last_error.as_ref()
    }

    pub fn scan(&self) -> Option<&ScanResult> {
        self.scan.as_ref()
    }

    /// Preview of the current batch, if one has been scanned.
    pub fn preview(&self) -> Option<PreviewTable> {
        self.scan.as_ref().map(ScanResult::preview)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────────────────────────

impl<C: QuestionApiOps> ImportSession<C> {
    /// Scans CSV text and moves to `Preview`.
    ///
    /// On failure the session returns to `Input` with the error kept.
    pub async fn scan_csv(&mut self, source: &SourceText) -> Result<PreviewTable, AppError> {
        self.begin_scan().await?;
        let result = validation::scan_csv(source).map(ScanResult::Csv);
        self.finish_scan(result)
    }

    /// Scans JSON text against the selected taxonomy and moves to `Preview`.
    ///
    /// `None` means the category/subject/group selection is not complete;
    /// the session stays in `Input`.
    pub async fn scan_json(
        &mut self,
        source: &SourceText,
        taxonomy: Option<&Taxonomy>,
    ) -> Result<PreviewTable, AppError> {
        self.require(SessionState::Input, "scan")?;
        let Some(taxonomy) = taxonomy else {
            return Err(self.keep_error(AppError::TaxonomyIncomplete));
        };

        self.begin_scan().await?;
        let result = validation::scan_json(source, taxonomy).map(ScanResult::Json);
        self.finish_scan(result)
    }

    /// Discards the scanned batch and returns to `Input`.
    pub fn back(&mut self) -> Result<(), AppError> {
        self.require(SessionState::Preview, "go back")?;
        self.scan = None;
        self.last_error = None;
        self.state = SessionState::Input;
        Ok(())
    }

    /// Submits the scanned batch.
    ///
    /// Success (including partial success) closes the session and fires the
    /// success callback. Total failure returns to `Preview` so the batch can be
    /// retried.
    pub async fn import(&mut self) -> Result<ImportOutcome, AppError> {
        self.require(SessionState::Preview, "import")?;
        let batch = self.batch_label();
        self.state = SessionState::Importing;
        info!("[SESSION] Importing batch {}", batch);

        let result = match &self.scan {
            Some(ScanResult::Csv(scan)) => submit_csv(&self.api, scan).await,
            Some(ScanResult::Json(scan)) => {
                submit_json(&self.api, &scan.records, self.concurrency).await
            }
            None => Err(AppError::Internal("No scanned batch to import".into())),
        };

        match result {
            Ok(outcome) => {
                info!("[SESSION] Batch {} closed: {}", batch, outcome.message);
                self.state = SessionState::Closed;
                self.scan = None;
                self.last_error = None;
                if let Some(mut callback) = self.on_import_success.take() {
                    callback();
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("[SESSION] Batch {} import failed", batch);
                self.state = SessionState::Preview;
                Err(self.keep_error(e))
            }
        }
    }

    /// Closes the session. Not allowed mid-scan or mid-import.
    pub fn close(&mut self) -> Result<(), AppError> {
        if matches!(self.state, SessionState::Scanning | SessionState::Importing) {
            return Err(self.transition_error("close"));
        }
        self.scan = None;
        self.state = SessionState::Closed;
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    async fn begin_scan(&mut self) -> Result<(), AppError> {
        self.require(SessionState::Input, "scan")?;
        self.state = SessionState::Scanning;
        self.last_error = None;
        let batch_id = Uuid::new_v4();
        self.batch_id = Some(batch_id);
        info!("[SESSION] Scanning batch {}", redact_id(&batch_id.to_string()));

        if !self.scan_delay.is_zero() {
            tokio::time::sleep(self.scan_delay).await;
        }
        Ok(())
    }

    fn finish_scan(&mut self, result: Result<ScanResult, AppError>) -> Result<PreviewTable, AppError> {
        match result {
            Ok(scan) => {
                info!(
                    "[SESSION] Batch {} ready: {} records",
                    self.batch_label(),
                    scan.len()
                );
                let preview = scan.preview();
                self.scan = Some(scan);
                self.state = SessionState::Preview;
                Ok(preview)
            }
            Err(e) => {
                warn!("[SESSION] Batch {} scan failed", self.batch_label());
                self.state = SessionState::Input;
                Err(self.keep_error(e))
            }
        }
    }

    fn require(&self, expected: SessionState, action: &'static str) -> Result<(), AppError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.transition_error(action))
        }
    }

    fn transition_error(&self, action: &'static str) -> AppError {
        AppError::InvalidTransition {
            from: self.state.as_str(),
            action,
        }
    }

    fn keep_error(&mut self, e: AppError) -> AppError {
        self.last_error = Some(e.to_presentation());
        e
    }

    fn batch_label(&self) -> String {
        self.batch_id
            .map(|id| redact_id(&id.to_string()))
            .unwrap_or_else(|| "-".into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
