//! Adapter interfaces for the dashboard's backend services.
//!
//! `ItemService` covers the whole HTTP contract: taxonomy options, item
//! CRUD, duplicate checks, CSV transfer and asset downloads. Every call
//! takes the caller's `Identity` explicitly.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Identity;
use crate::core::link::VideoId;
use crate::domain::{
    Attachment, ContentItem, ExportFilter, ItemFilter, ItemId, ItemSubmission, TaxonomyOptions,
};

pub use http::HttpItemService;
pub use memory::MemoryItemService;

/// Failures talking to a backend service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 403: the caller does not own the item
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// 413: request body over the store's limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server returned {code}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { code: u16, message: Option<String> },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Server-supplied message, when there is one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ServiceError::Forbidden(m)
            | ServiceError::PayloadTooLarge(m)
            | ServiceError::NotFound(m) => Some(m),
            ServiceError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the service could not be reached at all
    pub fn is_network(&self) -> bool {
        match self {
            ServiceError::Unavailable(_) => true,
            ServiceError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

/// Answer from the duplicate-check service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub exists: bool,

    #[serde(default)]
    pub item: Option<DuplicateOwner>,

    #[serde(default)]
    pub message: Option<String>,
}

impl DuplicateCheck {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn existing(id: ItemId, created_by: impl Into<String>) -> Self {
        Self {
            exists: true,
            item: Some(DuplicateOwner {
                id: Some(id),
                created_by: Some(created_by.into()),
            }),
            message: None,
        }
    }

    /// Who submitted the existing item
    pub fn owner(&self) -> &str {
        self.item
            .as_ref()
            .and_then(|i| i.created_by.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn existing_id(&self) -> Option<&ItemId> {
        self.item.as_ref().and_then(|i| i.id.as_ref())
    }
}

/// The part of the existing item the client cares about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateOwner {
    #[serde(default)]
    pub id: Option<ItemId>,

    #[serde(default)]
    pub created_by: Option<String>,
}

/// Result of a bulk CSV import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub items_created: usize,
}

/// The dashboard backend
#[async_trait]
pub trait ItemService: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    async fn fetch_options(&self, identity: &Identity) -> Result<TaxonomyOptions, ServiceError>;

    async fn list_items(
        &self,
        identity: &Identity,
        filter: &ItemFilter,
    ) -> Result<Vec<ContentItem>, ServiceError>;

    async fn check_duplicate(
        &self,
        identity: &Identity,
        video_id: &VideoId,
    ) -> Result<DuplicateCheck, ServiceError>;

    async fn create_item(
        &self,
        identity: &Identity,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError>;

    async fn update_item(
        &self,
        identity: &Identity,
        id: &ItemId,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError>;

    async fn delete_item(&self, identity: &Identity, id: &ItemId) -> Result<(), ServiceError>;

    /// CSV bytes for the filtered view
    async fn export_csv(
        &self,
        identity: &Identity,
        filter: &ExportFilter,
    ) -> Result<Vec<u8>, ServiceError>;

    async fn bulk_upload(
        &self,
        identity: &Identity,
        csv: &Attachment,
    ) -> Result<ImportSummary, ServiceError>;

    /// Short-lived URL for a stored asset
    async fn download_url(
        &self,
        identity: &Identity,
        id: &ItemId,
        file_key: &str,
    ) -> Result<String, ServiceError>;
}
