//! Bulk question import for the exam platform's admin API.
//!
//! Two pipelines share one scan → preview → import flow:
//! - CSV: a fixed 9-column file, sent to the bulk-create endpoint in one request
//! - JSON: a pasted or file-based batch, stamped with a taxonomy and created
//!   one question at a time

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod files;
pub mod import;
pub mod model;
pub mod preview;
pub mod validation;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{AppError, ErrorPresentation};
