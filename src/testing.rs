//! In-memory `QuestionApiOps` fake shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{
    ApiFuture, BulkImportResponse, CreateQuestionResponse, ExportSelection, ExportedQuestion,
    QuestionApiOps, TaxonomyEntity,
};
use crate::error::AppError;
use crate::model::ImportRecord;
use crate::validation::CsvQuestionRow;

type CreateFn = dyn Fn(&ImportRecord) -> Result<CreateQuestionResponse, AppError> + Send + Sync;

#[derive(Clone)]
pub(crate) struct FakeApi {
    pub bulk_response: BulkImportResponse,
    pub exported: Vec<ExportedQuestion>,
    pub categories: Vec<TaxonomyEntity>,
    pub subjects: Vec<TaxonomyEntity>,
    pub groups: Vec<TaxonomyEntity>,
    pub create: Arc<CreateFn>,
    pub create_delay: Duration,
    /// Row counts of each bulk call.
    pub bulk_calls: Arc<Mutex<Vec<usize>>>,
    /// Question text of each create call, in call order.
    pub created: Arc<Mutex<Vec<String>>>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            bulk_response: BulkImportResponse::default(),
            exported: Vec::new(),
            categories: Vec::new(),
            subjects: Vec::new(),
            groups: Vec::new(),
            create: Arc::new(always_created),
            create_delay: Duration::ZERO,
            bulk_calls: Arc::new(Mutex::new(Vec::new())),
            created: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

pub(crate) fn created_ok() -> CreateQuestionResponse {
    CreateQuestionResponse {
        success: true,
        message: Some("Question created successfully".into()),
        data: None,
    }
}

fn always_created(_record: &ImportRecord) -> Result<CreateQuestionResponse, AppError> {
    Ok(created_ok())
}

pub(crate) fn rejected(message: &str) -> CreateQuestionResponse {
    CreateQuestionResponse {
        success: false,
        message: Some(message.into()),
        data: None,
    }
}

impl FakeApi {
    pub fn with_create<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportRecord) -> Result<CreateQuestionResponse, AppError> + Send + Sync + 'static,
    {
        self.create = Arc::new(f);
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn created_texts(&self) -> Vec<String> {
        self.created.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn bulk_call_sizes(&self) -> Vec<usize> {
        self.bulk_calls.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl QuestionApiOps for FakeApi {
    fn bulk_import<'a>(&'a self, rows: &'a [CsvQuestionRow]) -> ApiFuture<'a, BulkImportResponse> {
        Box::pin(async move {
            if let Ok(mut calls) = self.bulk_calls.lock() {
                calls.push(rows.len());
            }
            Ok(self.bulk_response.clone())
        })
    }

    fn create_question<'a>(&'a self, record: &'a ImportRecord) -> ApiFuture<'a, CreateQuestionResponse> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.create_delay.is_zero() {
                tokio::time::sleep(self.create_delay).await;
            }
            if let Ok(mut created) = self.created.lock() {
                created.push(record.question_text.clone());
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            (self.create.as_ref())(record)
        })
    }

    fn list_categories(&self) -> ApiFuture<'_, Vec<TaxonomyEntity>> {
        Box::pin(async move { Ok(self.categories.clone()) })
    }

    fn list_subjects<'a>(&'a self, _category_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>> {
        Box::pin(async move { Ok(self.subjects.clone()) })
    }

    fn list_groups<'a>(&'a self, subject_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>> {
        Box::pin(async move {
            Ok(self
                .groups
                .iter()
                .filter(|g| g.belongs_to_subject(subject_id))
                .cloned()
                .collect())
        })
    }

    fn export_questions<'a>(&'a self, selection: &'a ExportSelection) -> ApiFuture<'a, Vec<ExportedQuestion>> {
        Box::pin(async move {
            match selection {
                ExportSelection::Ids(ids) if ids.is_empty() => Err(AppError::ExportFailed(
                    "No questions specified for export".into(),
                )),
                _ => Ok(self.exported.clone()),
            }
        })
    }
}
