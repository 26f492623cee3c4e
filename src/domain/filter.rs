//! List and export filters.
//!
//! Narrowing cascades downward: picking a vertical clears the exam and
//! subject, picking an exam clears the subject.

use serde::Serialize;

/// Filter applied to `GET /metadata`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemFilter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vertical: String,

    /// Exam
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,

    /// Subject
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subcategory: String,

    /// Only items created by the caller
    pub user_only: bool,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertical(mut self, vertical: impl Into<String>) -> Self {
        self.set_vertical(vertical);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.set_category(category);
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn mine_only(mut self, user_only: bool) -> Self {
        self.user_only = user_only;
        self
    }

    pub fn set_vertical(&mut self, vertical: impl Into<String>) {
        self.vertical = vertical.into();
        self.category.clear();
        self.subcategory.clear();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.subcategory.clear();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The same narrowing for `GET /export` (which has no per-user switch)
    pub fn export_filter(&self) -> ExportFilter {
        ExportFilter {
            vertical: self.vertical.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }
}

/// Filter applied to `GET /export`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportFilter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vertical: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub subcategory: String,
}
