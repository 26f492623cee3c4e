//! HTTP client for the dashboard REST API.
//!
//! Endpoints (relative to the API base):
//! - GET    /options
//! - GET    /metadata
//! - GET    /check-duplicate/{videoId}
//! - POST   /item, PUT /item/{id}, DELETE /item/{id}
//! - GET    /export, POST /bulk-upload
//! - GET    /item/{id}/download/{fileKey}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DuplicateCheck, ImportSummary, ItemService, ServiceError};
use crate::auth::Identity;
use crate::core::link::VideoId;
use crate::domain::{
    Attachment, ContentItem, ExportFilter, ItemFilter, ItemId, ItemSubmission, TaxonomyOptions,
};

/// Error body the API returns on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<ContentItem>,
}

/// Create/update answer: `{item: ...}` or the bare item
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemResponse {
    Wrapped { item: ContentItem },
    Bare(ContentItem),
}

impl ItemResponse {
    fn into_item(self) -> ContentItem {
        match self {
            ItemResponse::Wrapped { item } | ItemResponse::Bare(item) => item,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    url: String,
}

/// REST implementation of `ItemService`
pub struct HttpItemService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpItemService {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Result<Self, ServiceError> {
        Self::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.timeout_seconds),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach identity headers to a request
    fn identified(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        identity
            .headers()
            .into_iter()
            .fold(request, |req, (name, value)| req.header(name, value))
    }

    /// Map non-success responses onto `ServiceError`
    async fn check(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|text| {
                serde_json::from_str::<ErrorBody>(&text)
                    .ok()
                    .and_then(|b| b.error)
                    .or_else(|| Some(text).filter(|t| !t.trim().is_empty()))
            });

        Err(match status {
            StatusCode::FORBIDDEN => {
                ServiceError::Forbidden(message.unwrap_or_else(|| "Not authorized".to_string()))
            }
            StatusCode::PAYLOAD_TOO_LARGE => ServiceError::PayloadTooLarge(
                message.unwrap_or_else(|| "Request body too large".to_string()),
            ),
            StatusCode::NOT_FOUND => {
                ServiceError::NotFound(message.unwrap_or_else(|| "Not found".to_string()))
            }
            other => ServiceError::Status {
                code: other.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    /// Streamed multipart part for a local file
    async fn file_part(attachment: &Attachment) -> Result<Part, ServiceError> {
        let file = tokio::fs::File::open(&attachment.path).await?;
        let part = Part::stream_with_length(Body::from(file), attachment.size)
            .file_name(attachment.file_name.clone());
        Ok(part)
    }

    /// Multipart body: text fields, `videoFile`, then each of `files`
    async fn multipart_body(submission: &ItemSubmission) -> Result<Form, ServiceError> {
        let mut form = Form::new();
        for (name, value) in submission.payload.form_fields() {
            form = form.text(name, value);
        }
        if let Some(video) = &submission.video_file {
            form = form.part("videoFile", Self::file_part(video).await?);
        }
        for file in &submission.files {
            form = form.part("files", Self::file_part(file).await?);
        }
        Ok(form)
    }

    /// Send an item create/update as JSON or multipart
    async fn send_item(
        &self,
        request: RequestBuilder,
        identity: &Identity,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError> {
        let request = self.identified(request, identity);
        let request = if submission.has_attachments() {
            request.multipart(Self::multipart_body(submission).await?)
        } else {
            request.json(&submission.payload)
        };

        let response = Self::check(request.send().await?).await?;
        let item: ItemResponse = Self::decode(response).await?;
        Ok(item.into_item())
    }
}

#[async_trait]
impl ItemService for HttpItemService {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_options(&self, identity: &Identity) -> Result<TaxonomyOptions, ServiceError> {
        let url = self.api_url("options");
        debug!(%url, "fetching options");

        let request = self.identified(self.client.get(&url), identity);
        let response = Self::check(request.send().await?).await?;
        Self::decode(response).await
    }

    async fn list_items(
        &self,
        identity: &Identity,
        filter: &ItemFilter,
    ) -> Result<Vec<ContentItem>, ServiceError> {
        let url = self.api_url("metadata");
        debug!(%url, ?filter, "listing items");

        let request = self.identified(self.client.get(&url).query(filter), identity);
        let response = Self::check(request.send().await?).await?;
        let envelope: ItemsEnvelope = Self::decode(response).await?;
        Ok(envelope.items)
    }

    async fn check_duplicate(
        &self,
        identity: &Identity,
        video_id: &VideoId,
    ) -> Result<DuplicateCheck, ServiceError> {
        let url = self.api_url(&format!("check-duplicate/{}", video_id));
        debug!(%url, "checking duplicate");

        let request = self.identified(self.client.get(&url), identity);
        let response = Self::check(request.send().await?).await?;
        Self::decode(response).await
    }

    async fn create_item(
        &self,
        identity: &Identity,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError> {
        let url = self.api_url("item");
        info!(%url, multipart = submission.has_attachments(), "creating item");
        self.send_item(self.client.post(&url), identity, submission)
            .await
    }

    async fn update_item(
        &self,
        identity: &Identity,
        id: &ItemId,
        submission: &ItemSubmission,
    ) -> Result<ContentItem, ServiceError> {
        let url = self.api_url(&format!("item/{}", id));
        info!(%url, multipart = submission.has_attachments(), "updating item");
        self.send_item(self.client.put(&url), identity, submission)
            .await
    }

    async fn delete_item(&self, identity: &Identity, id: &ItemId) -> Result<(), ServiceError> {
        let url = self.api_url(&format!("item/{}", id));
        info!(%url, "deleting item");

        let request = self.identified(self.client.delete(&url), identity);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn export_csv(
        &self,
        identity: &Identity,
        filter: &ExportFilter,
    ) -> Result<Vec<u8>, ServiceError> {
        let url = self.api_url("export");
        debug!(%url, ?filter, "exporting");

        let request = self.identified(self.client.get(&url).query(filter), identity);
        let response = Self::check(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn bulk_upload(
        &self,
        identity: &Identity,
        csv: &Attachment,
    ) -> Result<ImportSummary, ServiceError> {
        let url = self.api_url("bulk-upload");
        info!(%url, file = %csv.file_name, "bulk upload");

        let form = Form::new().part("file", Self::file_part(csv).await?.mime_str("text/csv")?);
        let request = self.identified(self.client.post(&url).multipart(form), identity);
        let response = Self::check(request.send().await?).await?;
        Self::decode(response).await
    }

    async fn download_url(
        &self,
        identity: &Identity,
        id: &ItemId,
        file_key: &str,
    ) -> Result<String, ServiceError> {
        let url = self.api_url(&format!("item/{}/download/{}", id, file_key));
        debug!(%url, "requesting download url");

        let request = self.identified(self.client.get(&url), identity);
        let response = Self::check(request.send().await?).await?;
        let body: DownloadResponse = Self::decode(response).await?;
        Ok(body.url)
    }
}
