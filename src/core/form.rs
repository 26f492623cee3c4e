//! Editable form state for one item.

use crate::domain::{Attachment, ContentItem, ContentType, ItemPayload, ItemSubmission, Status};

/// Fields the submitter fills in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemForm {
    pub verification_link: String,
    pub video_file: Option<Attachment>,
    pub files: Vec<Attachment>,
    pub content_type: Option<ContentType>,
    pub content_subcategory: String,
    pub vertical: String,
    pub exam: String,
    pub subject: String,
    pub status: Option<Status>,
}

impl ItemForm {
    /// Pre-populate from an existing item (files are never re-uploaded)
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            verification_link: item.verification_link.clone().unwrap_or_default(),
            video_file: None,
            files: Vec::new(),
            content_type: item.content_type,
            content_subcategory: item.content_subcategory.clone().unwrap_or_default(),
            vertical: item.vertical.clone(),
            exam: item.exam.clone().unwrap_or_default(),
            subject: item.subject.clone().unwrap_or_default(),
            status: item.status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether the current status needs a video file rather than a link
    pub fn needs_video_file(&self) -> bool {
        self.status.map(|s| s.requires_video_file()).unwrap_or(false)
    }

    /// Build the outgoing request on behalf of `submitter`
    pub fn to_submission(&self, submitter: &str) -> ItemSubmission {
        ItemSubmission {
            payload: ItemPayload {
                email: submitter.to_string(),
                verification_link: self.verification_link.trim().to_string(),
                content_type: self.content_type,
                vertical: self.vertical.trim().to_string(),
                exam: self.exam.trim().to_string(),
                subject: self.subject.trim().to_string(),
                status: self.status,
                content_subcategory: self.content_subcategory.trim().to_string(),
            },
            video_file: self.video_file.clone(),
            files: self.files.clone(),
        }
    }
}
