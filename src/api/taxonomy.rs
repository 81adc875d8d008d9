//! Category → subject → question-group lookups and the cascading picker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::api::client::{http_status_error, parse_body, read_body, redact_id, QuestionApiClient};
use crate::api::ops::QuestionApiOps;
use crate::error::AppError;
use crate::model::Taxonomy;

pub const CATEGORIES_PATH: &str = "/api/categories";
pub const SUBJECTS_PATH: &str = "/api/subjects";
pub const GROUPS_PATH: &str = "/api/question-groups";

/// A category, subject or question group as returned by the lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntity {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Owning subject of a group: an id, or a populated `{_id, name}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
}

impl TaxonomyEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subject: None,
        }
    }

    /// Whether this group belongs to `subject_id`.
    pub fn belongs_to_subject(&self, subject_id: &str) -> bool {
        match &self.subject {
            Some(Value::String(id)) => id == subject_id,
            Some(Value::Object(map)) => map.get("_id").and_then(Value::as_str) == Some(subject_id),
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookups
// ─────────────────────────────────────────────────────────────────────────────

impl QuestionApiClient {
    pub async fn list_categories(&self) -> Result<Vec<TaxonomyEntity>, AppError> {
        self.fetch_entities(CATEGORIES_PATH, &[("status", "active")]).await
    }

    pub async fn list_subjects(&self, category_id: &str) -> Result<Vec<TaxonomyEntity>, AppError> {
        self.fetch_entities(SUBJECTS_PATH, &[("category", category_id), ("status", "active")])
            .await
    }

    /// Groups of a subject. The server filter is not trusted; groups whose
    /// `subject` does not match are dropped.
    pub async fn list_groups(&self, subject_id: &str) -> Result<Vec<TaxonomyEntity>, AppError> {
        let groups = self
            .fetch_entities(GROUPS_PATH, &[("subject", subject_id), ("status", "active")])
            .await?;
        Ok(groups
            .into_iter()
            .filter(|g| g.belongs_to_subject(subject_id))
            .collect())
    }

    /// GETs a list that may come as `{data: [...]}` or as a bare array.
    ///
    /// An envelope with `success: false` is a failed lookup, whatever its `data`.
    async fn fetch_entities(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<TaxonomyEntity>, AppError> {
        let response = self.get(path, query).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status));
        }

        let text = read_body(response).await?;
        let value: Value = parse_body(&text)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                if map.get("success") == Some(&Value::Bool(false)) {
                    let message = map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("lookup rejected");
                    return Err(AppError::RequestFailed(format!("{}: {}", path, message)));
                }
                match map.remove("data") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        serde_json::from_value(Value::Array(items))
            .map_err(|e| AppError::InvalidResponse(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TaxonomyPicker
// ─────────────────────────────────────────────────────────────────────────────

/// Cascading category → subject → group selection.
///
/// Changing a level clears everything below it and refetches the next list.
/// A picker from [`TaxonomyPicker::load`] logs a failed lookup and leaves that
/// list empty; one from [`TaxonomyPicker::try_load`] returns the error.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyPicker {
    strict: bool,
    categories: Vec<TaxonomyEntity>,
    subjects: Vec<TaxonomyEntity>,
    groups: Vec<TaxonomyEntity>,
    category: Option<String>,
    subject: Option<String>,
    group: Option<String>,
}

impl TaxonomyPicker {
    /// Loads active categories.
    pub async fn load<C: QuestionApiOps>(api: &C) -> Self {
        let categories = api.list_categories().await.unwrap_or_else(|e| {
            warn!("[TAXONOMY] Failed to load categories: {}", e);
            Vec::new()
        });
        info!("[TAXONOMY] {} categories available", categories.len());
        Self {
            categories,
            ..Default::default()
        }
    }

    /// Loads active categories, failing if any lookup fails.
    ///
    /// # Errors
    ///
    /// Whatever `list_categories` returns. Later subject and group lookups
    /// through this picker propagate their errors the same way.
    pub async fn try_load<C: QuestionApiOps>(api: &C) -> Result<Self, AppError> {
        let categories = api.list_categories().await?;
        info!("[TAXONOMY] {} categories available", categories.len());
        Ok(Self {
            strict: true,
            categories,
            ..Default::default()
        })
    }

    /// Applies the picker's failure policy to one lookup.
    fn settle(
        &self,
        result: Result<Vec<TaxonomyEntity>, AppError>,
        what: &str,
        id: &str,
    ) -> Result<Vec<TaxonomyEntity>, AppError> {
        match result {
            Ok(list) => Ok(list),
            Err(e) if self.strict => Err(e),
            Err(e) => {
                warn!("[TAXONOMY] Failed to load {} for {}: {}", what, redact_id(id), e);
                Ok(Vec::new())
            }
        }
    }

    pub fn categories(&self) -> &[TaxonomyEntity] {
        &self.categories
    }

    pub fn subjects(&self) -> &[TaxonomyEntity] {
        &self.subjects
    }

    pub fn groups(&self) -> &[TaxonomyEntity] {
        &self.groups
    }

    /// Selects a category and refetches its subjects.
    ///
    /// # Errors
    ///
    /// `AppError::UnknownTaxonomy` if `id` is not among the loaded categories,
    /// or the subject lookup error on a strict picker.
    pub async fn select_category<C: QuestionApiOps>(&mut self, api: &C, id: &str) -> Result<(), AppError> {
        ensure_listed(&self.categories, "category", id)?;

        self.category = Some(id.to_string());
        self.subject = None;
        self.group = None;
        self.subjects.clear();
        self.groups.clear();

        let subjects = api.list_subjects(id).await;
        self.subjects = self.settle(subjects, "subjects", id)?;
        Ok(())
    }

    /// Selects a subject and refetches its groups.
    ///
    /// # Errors
    ///
    /// `AppError::UnknownTaxonomy` if `id` is not among the loaded subjects,
    /// or the group lookup error on a strict picker.
    pub async fn select_subject<C: QuestionApiOps>(&mut self, api: &C, id: &str) -> Result<(), AppError> {
        ensure_listed(&self.subjects, "subject", id)?;

        self.subject = Some(id.to_string());
        self.group = None;
        self.groups.clear();

        let groups = api.list_groups(id).await;
        self.groups = self.settle(groups, "groups", id)?;
        Ok(())
    }

    pub fn select_group(&mut self, id: &str) -> Result<(), AppError> {
        ensure_listed(&self.groups, "question group", id)?;
        self.group = Some(id.to_string());
        Ok(())
    }

    /// The complete selection.
    ///
    /// # Errors
    ///
    /// `AppError::TaxonomyIncomplete` unless all three levels are selected.
    pub fn selection(&self) -> Result<Taxonomy, AppError> {
        match (&self.category, &self.subject, &self.group) {
            (Some(category), Some(subject), Some(group)) => Ok(Taxonomy {
                category: category.clone(),
                subject: subject.clone(),
                question_group: group.clone(),
            }),
            _ => Err(AppError::TaxonomyIncomplete),
        }
    }

    /// Selects all three levels in order.
    pub async fn select_path<C: QuestionApiOps>(
        &mut self,
        api: &C,
        category: &str,
        subject: &str,
        group: &str,
    ) -> Result<Taxonomy, AppError> {
        self.select_category(api, category).await?;
        self.select_subject(api, subject).await?;
        self.select_group(group)?;
        self.selection()
    }
}

fn ensure_listed(entities: &[TaxonomyEntity], level: &'static str, id: &str) -> Result<(), AppError> {
    if entities.iter().any(|e| e.id == id) {
        Ok(())
    } else {
        Err(AppError::UnknownTaxonomy {
            level,
            id: id.to_string(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
