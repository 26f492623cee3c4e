//! Submission preconditions.
//!
//! Rules, in evaluation order:
//! 1. Status Re-edit: a video file is attached and within the upload limit.
//!    Any other status: the link has been verified.
//! 2. Content type `Content`: a content subcategory is set.
//! 3. Vertical, exam, status and content type are set.
//!
//! `validate` reports every violated rule in that order; callers that
//! short-circuit take the first.

use std::fmt;

use thiserror::Error;

use super::form::ItemForm;

/// Upload ceiling for a single submission (20 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// A field the store refuses to accept blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Vertical,
    Exam,
    Status,
    ContentType,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::Vertical => write!(f, "vertical"),
            RequiredField::Exam => write!(f, "exam"),
            RequiredField::Status => write!(f, "status"),
            RequiredField::ContentType => write!(f, "content type"),
        }
    }
}

/// A violated precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Video file required for Re-edit status")]
    MissingEvidence,

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Link has not been verified")]
    UnverifiedLink,

    #[error("Content subcategory required for Content items")]
    MissingSubcategory,

    #[error("Missing required field: {0}")]
    MissingRequiredField(RequiredField),
}

/// Check `form` against every submission rule.
///
/// `link_verified` is the workflow's verification flag for the current link.
/// `max_upload_bytes` bounds the Re-edit video file and the combined size of
/// all attachments.
pub fn validate(form: &ItemForm, link_verified: bool, max_upload_bytes: u64) -> Vec<Violation> {
    let mut violations = Vec::new();

    if form.needs_video_file() {
        match &form.video_file {
            None => violations.push(Violation::MissingEvidence),
            Some(file) if file.size > max_upload_bytes => {
                violations.push(Violation::FileTooLarge {
                    size: file.size,
                    limit: max_upload_bytes,
                });
            }
            Some(_) => {}
        }
    } else if !link_verified {
        violations.push(Violation::UnverifiedLink);
    }

    let total: u64 = form.video_file.iter().chain(&form.files).map(|a| a.size).sum();
    let already_too_large = violations
        .iter()
        .any(|v| matches!(v, Violation::FileTooLarge { .. }));
    if total > max_upload_bytes && !already_too_large {
        violations.push(Violation::FileTooLarge {
            size: total,
            limit: max_upload_bytes,
        });
    }

    if form.content_type.map(|c| c.requires_subcategory()).unwrap_or(false)
        && form.content_subcategory.trim().is_empty()
    {
        violations.push(Violation::MissingSubcategory);
    }

    if form.vertical.trim().is_empty() {
        violations.push(Violation::MissingRequiredField(RequiredField::Vertical));
    }
    if form.exam.trim().is_empty() {
        violations.push(Violation::MissingRequiredField(RequiredField::Exam));
    }
    if form.status.is_none() {
        violations.push(Violation::MissingRequiredField(RequiredField::Status));
    }
    if form.content_type.is_none() {
        violations.push(Violation::MissingRequiredField(RequiredField::ContentType));
    }

    violations
}

/// The first violated rule, if any
pub fn first_violation(
    form: &ItemForm,
    link_verified: bool,
    max_upload_bytes: u64,
) -> Option<Violation> {
    validate(form, link_verified, max_upload_bytes).into_iter().next()
}
