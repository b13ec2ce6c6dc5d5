//! Remote materials API client.
//!
//! Thin typed wrapper over the `/api/materials` endpoints. Every call takes
//! the bearer token explicitly; the view-model decides when one is required.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::debug;

use crate::types::errors::ApiError;
use crate::types::material::{
    DocumentList, FileBlob, FilePayload, MaterialRecord, UploadDraft, UploadedDocument,
};

/// Trait defining the remote materials API.
#[async_trait]
pub trait MaterialsApiTrait: Send + Sync {
    /// `GET /api/materials/documents`
    async fn list_documents(&self, token: &str) -> Result<Vec<MaterialRecord>, ApiError>;
    /// `POST /api/materials/upload`
    async fn upload(&self, token: &str, form: UploadForm) -> Result<MaterialRecord, ApiError>;
    /// `DELETE /api/materials/{id}`
    async fn delete(&self, token: &str, id: &str) -> Result<(), ApiError>;
    /// `GET /api/materials/download/{file_id}`
    async fn download(&self, token: &str, file_id: &str) -> Result<FilePayload, ApiError>;
    /// `GET /api/materials/view/{file_id}?inline=true`
    async fn view(&self, token: &str, file_id: &str) -> Result<FilePayload, ApiError>;
}

/// Validated upload request, built from an [`UploadDraft`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub file: FileBlob,
    pub title: String,
    pub description: String,
    /// `None` is sent as the literal `null`.
    pub category_id: Option<String>,
    pub tags: Vec<String>,
}

impl UploadForm {
    /// Builds the form from a draft, or `None` when no file is attached.
    pub fn from_draft(draft: &UploadDraft) -> Option<Self> {
        let file = draft.file.clone()?;
        Some(Self {
            file,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category_id: draft.category_id(),
            tags: draft.tag_list(),
        })
    }

    /// Encodes the form as multipart fields `file`, `title`, `description`,
    /// `category_id` and `tags` (a JSON array string).
    pub fn into_multipart(self) -> Result<Form, ApiError> {
        let mut file_part = Part::bytes(self.file.bytes.to_vec()).file_name(self.file.name);
        if let Some(mime) = &self.file.mime_type {
            file_part = file_part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        }
        let tags = serde_json::to_string(&self.tags)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Form::new()
            .part("file", file_part)
            .text("title", self.title)
            .text("description", self.description)
            .text(
                "category_id",
                self.category_id.unwrap_or_else(|| "null".to_string()),
            )
            .text("tags", tags))
    }
}

/// HTTP implementation of [`MaterialsApiTrait`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpMaterialsApi {
    client: Client,
    base_url: String,
}

impl HttpMaterialsApi {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/api/materials/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("base URL cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "materials"])
            .extend(segments);
        Ok(url)
    }

    /// Turns a non-2xx response into [`ApiError::Status`], keeping the
    /// server's `message` field when the body is JSON.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_payload(&self, token: &str, url: Url, query: &[(&str, &str)]) -> Result<FilePayload, ApiError> {
        debug!(%url, "fetching material payload");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok(FilePayload {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl MaterialsApiTrait for HttpMaterialsApi {
    async fn list_documents(&self, token: &str) -> Result<Vec<MaterialRecord>, ApiError> {
        let url = self.endpoint(&["documents"])?;
        debug!(%url, "listing materials");
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let response = Self::check_status(response).await?;
        let list: DocumentList = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(list.documents)
    }

    async fn upload(&self, token: &str, form: UploadForm) -> Result<MaterialRecord, ApiError> {
        let url = self.endpoint(&["upload"])?;
        debug!(%url, title = %form.title, "uploading material");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form.into_multipart()?)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let uploaded: UploadedDocument = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(uploaded.document)
    }

    async fn delete(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[id])?;
        debug!(%url, "deleting material");
        let response = self.client.delete(url).bearer_auth(token).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn download(&self, token: &str, file_id: &str) -> Result<FilePayload, ApiError> {
        let url = self.endpoint(&["download", file_id])?;
        self.fetch_payload(token, url, &[]).await
    }

    async fn view(&self, token: &str, file_id: &str) -> Result<FilePayload, ApiError> {
        let url = self.endpoint(&["view", file_id])?;
        self.fetch_payload(token, url, &[("inline", "true")]).await
    }
}
