//! Item submission workflow.
//!
//! Owns one form session: link verification against the duplicate-check
//! service, the conditional submission rules, create/update, and delete.
//!
//! ```text
//! Empty -> Unverified -> Verified -> (submit) -> Empty
//!              ^            |            |
//!              +-- link ----+            +-> Unverified/Verified (error)
//! ```
//!
//! `submit` borrows the workflow mutably until the store answers, so a
//! second submit (or any edit) cannot start while one is outstanding.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::board::Board;
use super::form::ItemForm;
use super::link::{extract_video_id, VideoId};
use super::validation::{first_violation, validate, RequiredField, Violation, MAX_UPLOAD_BYTES};
use crate::adapters::{DuplicateCheck, ItemService, ServiceError};
use crate::auth::Identity;
use crate::domain::{Attachment, ContentItem, ContentType, ItemId, Status};

fn megabytes(bytes: &u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Why an interaction failed. The form is never cleared on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid YouTube URL format: {link}")]
    InvalidLinkFormat { link: String },

    #[error("Video already exists! Uploaded by: {created_by}")]
    DuplicateContent { video_id: String, created_by: String },

    #[error("Please verify the YouTube link first")]
    UnverifiedLink,

    #[error("Video file is required for Re-edit status")]
    MissingEvidence,

    #[error("Content subcategory is required for Content items")]
    MissingSubcategory,

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: RequiredField },

    #[error("File too large. Maximum upload size is {} MB", megabytes(.limit))]
    FileTooLarge { limit: u64 },

    #[error("Not authorized: {message}")]
    NotAuthorized { message: String },

    #[error("{message}")]
    SubmissionFailed { message: String },

    #[error("Network error: {message}")]
    NetworkUnavailable { message: String },
}

impl WorkflowError {
    /// Failures the user fixes by switching identity rather than editing
    pub fn is_authorization(&self) -> bool {
        matches!(self, WorkflowError::NotAuthorized { .. })
    }

    /// Map a store failure onto the workflow taxonomy.
    ///
    /// 403 and 413 get their own variants; anything else carries the server
    /// message, or `fallback` when the server gave none.
    pub fn from_service(err: ServiceError, limit: u64, fallback: &str) -> Self {
        match err {
            ServiceError::Forbidden(message) => WorkflowError::NotAuthorized { message },
            ServiceError::PayloadTooLarge(_) => WorkflowError::FileTooLarge { limit },
            other => WorkflowError::SubmissionFailed {
                message: other
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback.to_string()),
            },
        }
    }

    /// Map a failed read (options, item list) onto the workflow taxonomy.
    ///
    /// Only an unreachable store is a network problem; a reachable store
    /// that answered badly keeps its own message.
    pub fn from_fetch(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(message) => WorkflowError::NotAuthorized { message },
            e if e.is_network() => WorkflowError::NetworkUnavailable {
                message: e.to_string(),
            },
            e => WorkflowError::SubmissionFailed {
                message: e.to_string(),
            },
        }
    }
}

impl From<Violation> for WorkflowError {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::MissingEvidence => WorkflowError::MissingEvidence,
            Violation::FileTooLarge { limit, .. } => WorkflowError::FileTooLarge { limit },
            Violation::UnverifiedLink => WorkflowError::UnverifiedLink,
            Violation::MissingSubcategory => WorkflowError::MissingSubcategory,
            Violation::MissingRequiredField(field) => WorkflowError::MissingRequiredField { field },
        }
    }
}

/// What to do when the duplicate-check service cannot be reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateCheckPolicy {
    /// Fail verification
    #[default]
    Strict,
    /// Accept the link unchecked
    Lenient,
}

impl fmt::Display for DuplicateCheckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateCheckPolicy::Strict => write!(f, "strict"),
            DuplicateCheckPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for DuplicateCheckPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DuplicateCheckPolicy::Strict),
            "lenient" => Ok(DuplicateCheckPolicy::Lenient),
            _ => anyhow::bail!("Unknown duplicate check policy: {} (expected strict or lenient)", s),
        }
    }
}

/// Successful link verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The service confirmed nobody submitted this video
    Verified { video_id: VideoId },
    /// The service was unreachable and the lenient policy accepted the link
    Unchecked { video_id: VideoId },
}

impl VerifyOutcome {
    pub fn video_id(&self) -> &VideoId {
        match self {
            VerifyOutcome::Verified { video_id } | VerifyOutcome::Unchecked { video_id } => {
                video_id
            }
        }
    }
}

/// Where the form session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Unverified,
    Verified,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// One form session on behalf of one identity
pub struct SubmissionWorkflow {
    service: Arc<dyn ItemService>,
    identity: Identity,
    policy: DuplicateCheckPolicy,
    max_upload_bytes: u64,
    form: ItemForm,
    link_verified: bool,
    editing: Option<ContentItem>,
    open: bool,
}

impl SubmissionWorkflow {
    pub fn new(service: Arc<dyn ItemService>, identity: Identity) -> Self {
        Self {
            service,
            identity,
            policy: DuplicateCheckPolicy::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            form: ItemForm::default(),
            link_verified: false,
            editing: None,
            open: false,
        }
    }

    pub fn with_policy(mut self, policy: DuplicateCheckPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn form(&self) -> &ItemForm {
        &self.form
    }

    pub fn is_link_verified(&self) -> bool {
        self.link_verified
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn editing(&self) -> Option<&ContentItem> {
        self.editing.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if !self.open {
            Phase::Empty
        } else if self.link_verified {
            Phase::Verified
        } else {
            Phase::Unverified
        }
    }

    /// Start a blank submission
    pub fn open_new(&mut self) {
        self.reset();
        self.open = true;
    }

    /// Start editing `item`. Its link was verified when it was first
    /// submitted, so no duplicate check is made.
    pub fn edit(&mut self, item: ContentItem) {
        debug!(id = %item.id, "editing item");
        self.form = ItemForm::from_item(&item);
        self.link_verified = true;
        self.editing = Some(item);
        self.open = true;
    }

    /// Abandon the session
    pub fn close(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.form = ItemForm::default();
        self.link_verified = false;
        self.editing = None;
        self.open = false;
    }

    /// Replace the link; any change drops verification
    pub fn set_link(&mut self, link: impl Into<String>) {
        let link = link.into();
        if link != self.form.verification_link {
            self.link_verified = false;
        }
        self.form.verification_link = link;
    }

    /// Replace every field at once; a changed link drops verification
    pub fn set_form(&mut self, form: ItemForm) {
        if form.verification_link != self.form.verification_link {
            self.link_verified = false;
        }
        self.form = form;
    }

    pub fn set_status(&mut self, status: Status) {
        self.form.status = Some(status);
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.form.content_type = Some(content_type);
        if !content_type.requires_subcategory() {
            self.form.content_subcategory.clear();
        }
    }

    pub fn set_content_subcategory(&mut self, subcategory: impl Into<String>) {
        self.form.content_subcategory = subcategory.into();
    }

    /// Exam and subject belong to a vertical, so both clear when it changes
    pub fn set_vertical(&mut self, vertical: impl Into<String>) {
        let vertical = vertical.into();
        if vertical != self.form.vertical {
            self.form.exam.clear();
            self.form.subject.clear();
        }
        self.form.vertical = vertical;
    }

    pub fn set_exam(&mut self, exam: impl Into<String>) {
        self.form.exam = exam.into();
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.form.subject = subject.into();
    }

    pub fn attach_video(&mut self, video: Option<Attachment>) {
        self.form.video_file = video;
    }

    pub fn add_file(&mut self, file: Attachment) {
        self.form.files.push(file);
    }

    /// Every rule the form currently breaks, in evaluation order
    pub fn violations(&self) -> Vec<Violation> {
        validate(&self.form, self.link_verified, self.max_upload_bytes)
    }

    /// Whether a submit would be attempted right now
    pub fn can_submit(&self) -> bool {
        self.open
            && first_violation(&self.form, self.link_verified, self.max_upload_bytes).is_none()
    }

    /// Whether the duplicate check reported the item being edited
    fn is_self_match(&self, check: &DuplicateCheck, video_id: &VideoId) -> bool {
        let Some(editing) = &self.editing else {
            return false;
        };
        match check.existing_id() {
            Some(id) => id == &editing.id,
            None => editing.youtube_id.as_deref() == Some(video_id.as_str()),
        }
    }

    /// Check the current link's format, then ask the store whether the
    /// video was already submitted.
    pub async fn verify_link(&mut self) -> Result<VerifyOutcome, WorkflowError> {
        self.link_verified = false;

        let Some(video_id) = extract_video_id(&self.form.verification_link) else {
            debug!(link = %self.form.verification_link, "link did not match");
            return Err(WorkflowError::InvalidLinkFormat {
                link: self.form.verification_link.trim().to_string(),
            });
        };

        match self.service.check_duplicate(&self.identity, &video_id).await {
            Ok(check) if check.exists && !self.is_self_match(&check, &video_id) => {
                info!(%video_id, owner = check.owner(), "duplicate video");
                Err(WorkflowError::DuplicateContent {
                    video_id: video_id.to_string(),
                    created_by: check.owner().to_string(),
                })
            }
            Ok(_) => {
                debug!(%video_id, "link verified");
                self.link_verified = true;
                Ok(VerifyOutcome::Verified { video_id })
            }
            Err(e) => match self.policy {
                DuplicateCheckPolicy::Strict => {
                    warn!(%video_id, error = %e, "duplicate check failed");
                    Err(WorkflowError::NetworkUnavailable {
                        message: e.to_string(),
                    })
                }
                DuplicateCheckPolicy::Lenient => {
                    warn!(%video_id, error = %e, "duplicate check failed, accepting link unchecked");
                    self.link_verified = true;
                    Ok(VerifyOutcome::Unchecked { video_id })
                }
            },
        }
    }

    /// Create or update the item.
    ///
    /// Preconditions are checked first and nothing is sent if one fails.
    /// On success the session resets and `board` is refetched; on failure
    /// the form is left exactly as it was. Dropping the future before the
    /// store answers also leaves the form untouched.
    pub async fn submit(&mut self, board: &mut Board) -> Result<ContentItem, WorkflowError> {
        if let Some(violation) =
            first_violation(&self.form, self.link_verified, self.max_upload_bytes)
        {
            debug!(%violation, "submission rejected");
            return Err(violation.into());
        }

        let submission = self.form.to_submission(self.identity.id());

        let result = match &self.editing {
            Some(item) => {
                info!(id = %item.id, "updating item");
                self.service
                    .update_item(&self.identity, &item.id, &submission)
                    .await
            }
            None => {
                info!("creating item");
                self.service.create_item(&self.identity, &submission).await
            }
        };

        match result {
            Ok(item) => {
                info!(id = %item.id, "item saved");
                self.reset();
                board.refresh().await;
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                Err(WorkflowError::from_service(
                    e,
                    self.max_upload_bytes,
                    "Failed to save item",
                ))
            }
        }
    }

    /// Delete `id` after the user confirms
    pub async fn delete(
        &mut self,
        id: &ItemId,
        confirm: &dyn Confirm,
        board: &mut Board,
    ) -> Result<DeleteOutcome, WorkflowError> {
        if !confirm.confirm("Are you sure you want to delete this item?") {
            debug!(%id, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        info!(%id, "deleting item");
        if let Err(e) = self.service.delete_item(&self.identity, id).await {
            warn!(%id, error = %e, "delete failed");
            return Err(WorkflowError::from_service(
                e,
                self.max_upload_bytes,
                "Failed to delete item",
            ));
        }

        if self.editing.as_ref().map(|item| &item.id == id).unwrap_or(false) {
            self.reset();
        }
        board.refresh().await;
        Ok(DeleteOutcome::Deleted)
    }
}
