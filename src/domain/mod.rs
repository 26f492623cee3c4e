//! Domain types for the sprint dashboard.
//!
//! This module contains the data the item store and options service
//! exchange with the client:
//! - ContentItem: a submission and its taxonomy tags
//! - TaxonomyOptions: verticals with their exams and subjects
//! - ItemFilter: list/export narrowing
//! - ItemSubmission: create/update payload plus files to upload

pub mod filter;
pub mod item;
pub mod options;
pub mod submission;

// Re-export commonly used types
pub use filter::{ExportFilter, ItemFilter};
pub use item::{ContentItem, ContentType, ItemId, Status};
pub use options::TaxonomyOptions;
pub use submission::{Attachment, ItemPayload, ItemSubmission};
