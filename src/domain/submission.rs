//! What the client sends to create or update an item.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::item::{ContentType, Status};

/// A local file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub file_name: String,
    /// Size in bytes, taken when the file was attached
    pub size: u64,
}

impl Attachment {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            path,
            file_name,
            size,
        }
    }

    /// Attach a file from disk, recording its current size
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }
        Ok(Self::new(path, metadata.len()))
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Item fields as the store expects them on create/update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Submitter contact (the authenticated identity)
    pub email: String,

    #[serde(rename = "verificationLink")]
    pub verification_link: String,

    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,

    pub vertical: String,

    pub exam: String,

    pub subject: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    #[serde(rename = "contentSubcategory")]
    pub content_subcategory: String,
}

impl ItemPayload {
    /// Text fields for a multipart body, in wire spelling
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.clone()),
            ("verificationLink", self.verification_link.clone()),
            (
                "contentType",
                self.content_type.map(|c| c.to_string()).unwrap_or_default(),
            ),
            ("vertical", self.vertical.clone()),
            ("exam", self.exam.clone()),
            ("subject", self.subject.clone()),
            (
                "status",
                self.status.map(|s| s.to_string()).unwrap_or_default(),
            ),
            ("contentSubcategory", self.content_subcategory.clone()),
        ]
    }
}

/// A full create/update request: fields plus any files to upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSubmission {
    pub payload: ItemPayload,
    pub video_file: Option<Attachment>,
    pub files: Vec<Attachment>,
}

impl ItemSubmission {
    /// Whether the request must go out as multipart
    pub fn has_attachments(&self) -> bool {
        self.video_file.is_some() || !self.files.is_empty()
    }

    /// Combined size of every attached file
    pub fn upload_bytes(&self) -> u64 {
        self.video_file.iter().chain(&self.files).map(|a| a.size).sum()
    }
}
