//! Domain methods for the publishing API client.
//!
//! Each method maps one remote call onto its JSON:API request and response
//! shapes and implements [`PublishingApi`] for [`ApiClient`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tspub_core::models::{
    Credentials, DraftAttributes, FileAttachment, FileId, FileKind, PreviewAttachment, Product,
    UploadJobState, UploadStatus,
};
use tspub_core::{PublishError, PublishResult};

use crate::jsonapi::Document;
use crate::{ApiClient, PublishingApi};

#[derive(Debug, Deserialize)]
struct CredentialAttributes {
    key_prefix: String,
    bucket: String,
    access_key: String,
    secret_key: String,
    session_token: String,
    expiration: DateTime<Utc>,
    region: String,
}

#[derive(Debug, Serialize)]
struct UploadRequestAttributes<'a> {
    upload_key: &'a str,
}

fn default_upload_status() -> UploadStatus {
    UploadStatus::Queued
}

#[derive(Debug, Deserialize)]
struct UploadAttributes {
    #[serde(default = "default_upload_status")]
    status: UploadStatus,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    file_id: Option<FileId>,
}

impl UploadAttributes {
    fn into_state(self, job_id: String) -> UploadJobState {
        UploadJobState {
            job_id,
            status: self.status,
            file_id: self.file_id,
            message: self.message.filter(|m| !m.is_empty()),
        }
    }
}

/// Collection path segment for a resource type (`product_file` -> `product_files`).
fn collection(resource_type: &str) -> String {
    format!("{}s", resource_type)
}

/// Request document for a file attachment.
pub fn file_document(attachment: &FileAttachment) -> Document<Value> {
    let attributes = match &attachment.kind {
        FileKind::ProductFile(info) => {
            let mut attributes = json!({
                "file_id": attachment.file_id,
                "file_format": info.file_format,
                "is_native": info.is_native,
            });
            for (name, value) in [
                ("format_version", &info.format_version),
                ("renderer", &info.renderer),
                ("renderer_version", &info.renderer_version),
            ] {
                if !value.is_empty() {
                    attributes[name] = json!(value);
                }
            }
            attributes
        }
        // The server reads these variants' free text from `file_format`.
        FileKind::CustomerFile { description }
        | FileKind::PromotionalFile { description }
        | FileKind::TextureFile { description }
        | FileKind::ViewerFile { description } => json!({
            "file_id": attachment.file_id,
            "file_format": description,
        }),
    };
    Document::new(attachment.kind.resource_type(), attributes)
}

/// Request document for a preview attachment.
pub fn preview_document(preview: &PreviewAttachment) -> Document<Value> {
    let (mut attributes, thumbnail_type) = match preview {
        PreviewAttachment::Thumbnail {
            file_id,
            thumbnail_type,
        } => (json!({ "file_id": file_id }), thumbnail_type),
        PreviewAttachment::Turntable {
            file_ids,
            thumbnail_type,
        } => (json!({ "file_ids": file_ids }), thumbnail_type),
    };
    if !thumbnail_type.is_empty() {
        attributes["thumbnail_type"] = json!(thumbnail_type);
    }
    Document::new(preview.resource_type(), attributes)
}

#[async_trait]
impl PublishingApi for ApiClient {
    async fn request_credentials(&self) -> PublishResult<Credentials> {
        let doc: Document<CredentialAttributes> = self
            .post_empty("/api/uploads/credentials", "request upload credentials")
            .await
            .map_err(|e| match e {
                PublishError::RemoteRejection { status, body } => {
                    PublishError::Auth(format!("credential request rejected ({}): {}", status, body))
                }
                other => other,
            })?;

        let attributes = doc.data.attributes;
        Ok(Credentials {
            access_key: attributes.access_key,
            secret_key: attributes.secret_key,
            session_token: attributes.session_token,
            expiration: attributes.expiration,
            bucket: attributes.bucket,
            key_prefix: attributes.key_prefix,
            region: attributes.region,
        })
    }

    async fn register_upload(&self, upload_key: &str) -> PublishResult<UploadJobState> {
        let body = Document::new("upload", UploadRequestAttributes { upload_key });
        let doc: Document<UploadAttributes> = self
            .post_json("/api/uploads", &body, "register upload")
            .await?;

        let job_id = doc
            .id()
            .map(str::to_string)
            .ok_or_else(|| PublishError::Decode("register upload: missing job id".to_string()))?;
        Ok(doc.data.attributes.into_state(job_id))
    }

    async fn upload_status(&self, job_id: &str) -> PublishResult<UploadJobState> {
        let doc: Document<UploadAttributes> = self
            .get(&format!("/api/uploads/{}", job_id), "poll upload")
            .await?;
        Ok(doc.data.attributes.into_state(job_id.to_string()))
    }

    async fn create_draft(&self, attributes: &DraftAttributes) -> PublishResult<String> {
        let body = Document::new("draft", attributes);
        let doc: Document<Option<Value>> =
            self.post_json("/api/drafts", &body, "create draft").await?;

        doc.id()
            .map(str::to_string)
            .ok_or_else(|| PublishError::Decode("create draft: missing draft id".to_string()))
    }

    async fn add_file(&self, draft_id: &str, attachment: &FileAttachment) -> PublishResult<()> {
        let path = format!(
            "/api/drafts/{}/{}",
            draft_id,
            collection(attachment.kind.resource_type())
        );
        self.post_unit(&path, &file_document(attachment), "add file")
            .await
    }

    async fn add_preview(
        &self,
        draft_id: &str,
        preview: &PreviewAttachment,
    ) -> PublishResult<()> {
        let path = format!(
            "/api/drafts/{}/{}",
            draft_id,
            collection(preview.resource_type())
        );
        self.post_unit(&path, &preview_document(preview), "add preview")
            .await
    }

    async fn add_certification(&self, draft_id: &str, certification: &str) -> PublishResult<()> {
        let body = Document::new(
            "certification",
            json!({ "certification_id": certification }),
        );
        self.post_unit(
            &format!("/api/drafts/{}/certifications", draft_id),
            &body,
            "add certification",
        )
        .await
    }

    async fn publish_draft(&self, draft_id: &str) -> PublishResult<Product> {
        let body =
            Document::new("product", json!({})).with_relationship("draft", "draft", draft_id);
        let doc: Document<Option<Value>> = self
            .post_json("/api/products", &body, "publish draft")
            .await?;

        let id = doc
            .id()
            .map(str::to_string)
            .ok_or_else(|| PublishError::Decode("publish draft: missing product id".to_string()))?;
        Ok(Product {
            id,
            draft_id: draft_id.to_string(),
        })
    }
}
