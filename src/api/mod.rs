//! Platform REST API client.

pub mod client;
pub mod ops;
pub mod questions;
pub mod taxonomy;

pub use client::{sanitize_url_for_logs, LoggingMode, QuestionApiClient};
pub use ops::{ApiFuture, QuestionApiOps};
pub use questions::{
    BulkImportResponse, BulkQuestionPayload, CreateQuestionResponse, ExportSelection,
    ExportedQuestion,
};
pub use taxonomy::{TaxonomyEntity, TaxonomyPicker};
