//! In-process item store.
//!
//! Honours the same contract as the HTTP API: ownership checks on
//! update/delete, a duplicate index keyed by video identifier, list
//! filters, and the upload ceiling. CSV transfer is left to the real
//! backend and answers 501.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{DuplicateCheck, ImportSummary, ItemService, ServiceError};
use crate::auth::Identity;
use crate::core::link::{extract_video_id, VideoId};
use crate::core::validation::MAX_UPLOAD_BYTES;
use crate::domain::{
    Attachment, ContentItem, ExportFilter, ItemFilter, ItemId, ItemSubmission, TaxonomyOptions,
};

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<ContentItem>,
    calls: HashMap<&'static str, usize>,
    available: bool,
}

/// Item store held in memory
#[derive(Debug)]
pub struct MemoryItemService {
    options: TaxonomyOptions,
    max_upload_bytes: u64,
    state: Mutex<StoreState>,
}

impl Default for MemoryItemService {
    fn default() -> Self {
        Self::new(TaxonomyOptions::default())
    }
}

impl MemoryItemService {
    pub fn new(options: TaxonomyOptions) -> Self {
        Self {
            options,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            state: Mutex::new(StoreState {
                available: true,
                ..Default::default()
            }),
        }
    }

    /// Seed the store with existing items
    pub fn with_items(self, items: Vec<ContentItem>) -> Self {
        self.lock().items = items;
        self
    }

    /// Simulate an outage: every call fails with `Unavailable`
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// How many times `endpoint` (e.g. `"check_duplicate"`) was called
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Snapshot of the stored items
    pub fn items(&self) -> Vec<ContentItem> {
        self.lock().items.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave the item list half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a call and fail if the store is "down"
    fn enter(&self, endpoint: &'static str) -> Result<std::sync::MutexGuard<'_, StoreState>, ServiceError> {
        let mut state = self.lock();
        *state.calls.entry(endpoint).or_insert(0) += 1;
        if !state.available {
            return Err(ServiceError::Unavailable(format!(
                "memory store offline ({})",
                endpoint
            )));
        }
        Ok(state)
    }

    fn check_fields(submission: &ItemSubmission) -> Result<(), ServiceError> {
        let payload = &submission.payload;
        if payload.vertical.trim().is_empty()
            || payload.content_type.is_none()
            || payload.exam.trim().is_empty()
            || payload.status.is_none()
        {
            return Err(ServiceError::Status {
                code: 400,
                message: Some("Missing required fields".to_string()),
            });
        }
        Ok(())
    }

    fn check_size(&self, submission: &ItemSubmission) -> Result<(), ServiceError> {
        if submission.upload_bytes() > self.max_upload_bytes {
            return Err(ServiceError::PayloadTooLarge(format!(
                "File too large. Maximum {}MB allowed.",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    fn storage_key(id: &ItemId, attachment: &Attachment) -> String {
        format!("uploads/{}/{}", id, attachment.file_name)
    }

    /// Copy submitted fields onto `item`
    fn apply(item: &mut ContentItem, submission: &ItemSubmission) {
        let payload = &submission.payload;
        let link = payload.verification_link.trim();

        item.verification_link = Some(link.to_string()).filter(|l| !l.is_empty());
        item.youtube_id = extract_video_id(link).map(|id| id.as_str().to_string());
        item.content_type = payload.content_type;
        item.content_subcategory =
            Some(payload.content_subcategory.clone()).filter(|s| !s.is_empty());
        item.vertical = payload.vertical.clone();
        item.exam = Some(payload.exam.clone()).filter(|s| !s.is_empty());
        item.subject = Some(payload.subject.clone()).filter(|s| !s.is_empty());
        item.status = payload.status;
        item.email = Some(payload.email.clone()).filter(|s| !s.is_empty());

        if let Some(video) = &submission.video_file {
            item.video_file = Some(Self::storage_key(&item.id, video));
        }
        let keys: Vec<String> = submission
            .files
            .iter()
            .map(|f| Self::storage_key(&item.id, f))
            .collect();
        item.files.extend(keys);
    }

    fn find_duplicate<'a>(
        items: &'a [ContentItem],
        youtube_id: &str,
        except: Option<&ItemId>,
    ) -> Option<&'a ContentItem> {
        items
            .iter()
            .filter(|i| Some(&i.id) != except)
            .find(|i| i.youtube_id.as_deref() == Some(youtube_id))
    }

    fn matches(item: &ContentItem, identity: &Identity, filter: &ItemFilter) -> bool {
        (filter.vertical.is_empty() || item.vertical == filter.vertical)
            && (filter.category.is_empty() || item.exam.as_deref() == Some(filter.category.as_str()))
            && (filter.subcategory.is_empty()
                || item.subject.as_deref() == Some(filter.subcategory.as_str()))
            && (!filter.user_only || item.is_owned_by(identity.id()))
    }
}

fn conflict(existing: &ContentItem) -> ServiceError {
    ServiceError::Status {
        code: 409,
        message: Some(format!(
            "Video already exists! Uploaded by: {}",
            existing.created_by
        )),
    }
}

#[async_trait]
impl ItemService for MemoryItemService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_options(&self, _identity: &Identity) -> Result<TaxonomyOptions, ServiceError> {
        self.enter("fetch_options")?;
        Ok(self.options.clone())
    }

    async fn list_items(
        &self,
        identity: &Identity,
        filter: &ItemFilter,
    ) -> Result<Vec<ContentItem>, ServiceError> {
        let state = self.enter("list_items")?;
        Ok(state
            .items
            .iter()
            .filter(|item| Self::matches(item, identity, filter))
            .cloned()
            .collect())
    }

    async fn check_duplicate(
        &self,
        _identity: &Identity,
        video_id: &VideoId,
    ) -> Result<DuplicateCheck, ServiceError> {
        let state = self.enter("check_duplicate")?;
        Ok(
            match Self::find_duplicate(&state.items, video_id.as_str(), None) {
                Some(existing) => {
                    DuplicateCheck::existing(existing.id.clone(), existing.created_by.clone())
                }
                None => DuplicateCheck::none(),
            },
        )
    }

    async fn create_item(
        &self,
        identity: &Identity,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError> {
        let mut state = self.enter("create_item")?;
        self.check_size(submission)?;
        Self::check_fields(submission)?;

        if let Some(youtube_id) = extract_video_id(&submission.payload.verification_link) {
            if let Some(existing) = Self::find_duplicate(&state.items, youtube_id.as_str(), None) {
                return Err(conflict(existing));
            }
        }

        let id = ItemId::new(uuid::Uuid::new_v4().to_string());
        let mut item = ContentItem {
            id,
            verification_link: None,
            youtube_id: None,
            video_file: None,
            files: Vec::new(),
            content_type: None,
            content_subcategory: None,
            vertical: String::new(),
            exam: None,
            subject: None,
            status: None,
            email: None,
            created_by: identity.id().to_string(),
            created_at: Some(Utc::now().naive_utc()),
            updated_at: None,
        };
        Self::apply(&mut item, submission);

        debug!(id = %item.id, created_by = %item.created_by, "stored item");
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        identity: &Identity,
        id: &ItemId,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError> {
        let mut state = self.enter("update_item")?;
        self.check_size(submission)?;

        let pos = state
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        if !state.items[pos].is_owned_by(identity.id()) {
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }
        Self::check_fields(submission)?;

        if let Some(youtube_id) = extract_video_id(&submission.payload.verification_link) {
            if let Some(existing) = Self::find_duplicate(&state.items, youtube_id.as_str(), Some(id))
            {
                return Err(conflict(existing));
            }
        }

        let item = &mut state.items[pos];
        Self::apply(item, submission);
        item.updated_at = Some(Utc::now().naive_utc());
        Ok(item.clone())
    }

    async fn delete_item(&self, identity: &Identity, id: &ItemId) -> Result<(), ServiceError> {
        let mut state = self.enter("delete_item")?;

        let pos = state
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        if !state.items[pos].is_owned_by(identity.id()) {
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }

        state.items.remove(pos);
        Ok(())
    }

    async fn export_csv(
        &self,
        _identity: &Identity,
        _filter: &ExportFilter,
    ) -> Result<Vec<u8>, ServiceError> {
        self.enter("export_csv")?;
        Err(ServiceError::Status {
            code: 501,
            message: Some("Export is not available from the memory store".to_string()),
        })
    }

    async fn bulk_upload(
        &self,
        _identity: &Identity,
        _csv: &Attachment,
    ) -> Result<ImportSummary, ServiceError> {
        self.enter("bulk_upload")?;
        Err(ServiceError::Status {
            code: 501,
            message: Some("Bulk upload is not available from the memory store".to_string()),
        })
    }

    async fn download_url(
        &self,
        _identity: &Identity,
        id: &ItemId,
        file_key: &str,
    ) -> Result<String, ServiceError> {
        let state = self.enter("download_url")?;
        let item = state
            .items
            .iter()
            .find(|i| &i.id == id)
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;

        let known = item.video_file.as_deref() == Some(file_key)
            || item.files.iter().any(|f| f == file_key);
        if !known {
            return Err(ServiceError::NotFound(format!("No such file: {}", file_key)));
        }
        Ok(format!("memory://{}", file_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentType, ItemPayload, Status};

    fn submission(link: &str, vertical: &str) -> ItemSubmission {
        ItemSubmission {
            payload: ItemPayload {
                email: "a@adda247.com".to_string(),
                verification_link: link.to_string(),
                content_type: Some(ContentType::ExamInformation),
                vertical: vertical.to_string(),
                exam: "CGL".to_string(),
                subject: "Maths".to_string(),
                status: Some(Status::Pending),
                content_subcategory: String::new(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_sets_owner_and_video_id() {
        let store = MemoryItemService::default();
        let owner = Identity::email("a@adda247.com");

        let item = store
            .create_item(&owner, &submission("https://youtu.be/dQw4w9WgXcQ", "SSC"))
            .await
            .unwrap();
        assert_eq!(item.created_by, "a@adda247.com");
        assert_eq!(item.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert!(item.created_at.is_some());

        let check = store
            .check_duplicate(&owner, &extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap())
            .await
            .unwrap();
        assert!(check.exists);
        assert_eq!(check.owner(), "a@adda247.com");
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemoryItemService::default();
        let owner = Identity::email("a@adda247.com");
        let link = "https://youtu.be/dQw4w9WgXcQ";

        store.create_item(&owner, &submission(link, "SSC")).await.unwrap();
        let err = store
            .create_item(&Identity::email("b@adda247.com"), &submission(link, "SSC"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Status { code: 409, .. }));
    }

    #[tokio::test]
    async fn test_only_owner_mutates() {
        let store = MemoryItemService::default();
        let owner = Identity::email("a@adda247.com");
        let other = Identity::email("b@adda247.com");

        let item = store
            .create_item(&owner, &submission("", "SSC"))
            .await
            .unwrap();

        let err = store
            .update_item(&other, &item.id, &submission("", "Teaching"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = store.delete_item(&other, &item.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = store
            .update_item(&owner, &item.id, &submission("", "Teaching"))
            .await
            .unwrap();
        assert_eq!(updated.vertical, "Teaching");
        assert_eq!(updated.created_by, "a@adda247.com");
        assert!(updated.updated_at.is_some());

        store.delete_item(&owner, &item.id).await.unwrap();
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryItemService::default();
        let a = Identity::email("a@adda247.com");
        let b = Identity::email("b@adda247.com");

        store.create_item(&a, &submission("", "SSC")).await.unwrap();
        store.create_item(&b, &submission("", "SSC")).await.unwrap();
        store.create_item(&b, &submission("", "Teaching")).await.unwrap();

        let ssc = store
            .list_items(&a, &ItemFilter::new().with_vertical("SSC"))
            .await
            .unwrap();
        assert_eq!(ssc.len(), 2);

        let mine = store
            .list_items(&b, &ItemFilter::new().mine_only(true))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let by_subject = store
            .list_items(
                &a,
                &ItemFilter::new()
                    .with_vertical("SSC")
                    .with_category("CGL")
                    .with_subcategory("Reasoning"),
            )
            .await
            .unwrap();
        assert!(by_subject.is_empty());
    }

    #[tokio::test]
    async fn test_offline_store() {
        let store = MemoryItemService::default();
        store.set_available(false);
        let err = store
            .fetch_options(&Identity::email("a@adda247.com"))
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(store.call_count("fetch_options"), 1);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let store = MemoryItemService::default();
        let mut big = submission("", "SSC");
        big.video_file = Some(Attachment::new("cut.mp4", MAX_UPLOAD_BYTES + 1));

        let err = store
            .create_item(&Identity::email("a@adda247.com"), &big)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_download_url_for_known_key() {
        let store = MemoryItemService::default();
        let owner = Identity::email("a@adda247.com");
        let mut with_file = submission("", "SSC");
        with_file.video_file = Some(Attachment::new("cut.mp4", 10));

        let item = store.create_item(&owner, &with_file).await.unwrap();
        let key = item.video_file.clone().unwrap();
        assert_eq!(key, format!("uploads/{}/cut.mp4", item.id));

        let url = store.download_url(&owner, &item.id, &key).await.unwrap();
        assert_eq!(url, format!("memory://{}", key));

        assert!(store
            .download_url(&owner, &item.id, "uploads/other.mp4")
            .await
            .is_err());
    }
}
