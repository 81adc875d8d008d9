//! Trait over the API calls the import flows make, so they can run against fakes.

use std::future::Future;
use std::pin::Pin;

use crate::api::questions::{BulkImportResponse, CreateQuestionResponse, ExportSelection, ExportedQuestion};
use crate::api::taxonomy::TaxonomyEntity;
use crate::api::QuestionApiClient;
use crate::error::AppError;
use crate::model::ImportRecord;
use crate::validation::CsvQuestionRow;

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

/// Platform API operations used by the import, export and taxonomy flows.
pub trait QuestionApiOps: Send + Sync + Clone + 'static {
    /// Sends all CSV rows to the bulk-create endpoint.
    fn bulk_import<'a>(&'a self, rows: &'a [CsvQuestionRow]) -> ApiFuture<'a, BulkImportResponse>;

    /// Creates one question.
    fn create_question<'a>(&'a self, record: &'a ImportRecord) -> ApiFuture<'a, CreateQuestionResponse>;

    fn list_categories(&self) -> ApiFuture<'_, Vec<TaxonomyEntity>>;

    fn list_subjects<'a>(&'a self, category_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>>;

    /// Groups of a subject, already filtered client-side.
    fn list_groups<'a>(&'a self, subject_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>>;

    fn export_questions<'a>(&'a self, selection: &'a ExportSelection) -> ApiFuture<'a, Vec<ExportedQuestion>>;
}

impl QuestionApiOps for QuestionApiClient {
    fn bulk_import<'a>(&'a self, rows: &'a [CsvQuestionRow]) -> ApiFuture<'a, BulkImportResponse> {
        Box::pin(QuestionApiClient::bulk_import(self, rows))
    }

    fn create_question<'a>(&'a self, record: &'a ImportRecord) -> ApiFuture<'a, CreateQuestionResponse> {
        Box::pin(QuestionApiClient::create_question(self, record))
    }

    fn list_categories(&self) -> ApiFuture<'_, Vec<TaxonomyEntity>> {
        Box::pin(QuestionApiClient::list_categories(self))
    }

    fn list_subjects<'a>(&'a self, category_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>> {
        Box::pin(QuestionApiClient::list_subjects(self, category_id))
    }

    fn list_groups<'a>(&'a self, subject_id: &'a str) -> ApiFuture<'a, Vec<TaxonomyEntity>> {
        Box::pin(QuestionApiClient::list_groups(self, subject_id))
    }

    fn export_questions<'a>(&'a self, selection: &'a ExportSelection) -> ApiFuture<'a, Vec<ExportedQuestion>> {
        Box::pin(QuestionApiClient::export_questions(self, selection))
    }
}
