//! Remote publishing API abstraction
//!
//! One method per remote call of the publishing protocol. The upload path and
//! the draft pipeline only depend on this trait, so they can be driven by the
//! HTTP [`crate::ApiClient`] or by an in-process fake.

use async_trait::async_trait;
use tspub_core::models::{
    Credentials, DraftAttributes, FileAttachment, PreviewAttachment, Product, UploadJobState,
};
use tspub_core::PublishResult;

#[async_trait]
pub trait PublishingApi: Send + Sync {
    /// `POST /api/uploads/credentials`: issue temporary object-storage credentials.
    async fn request_credentials(&self) -> PublishResult<Credentials>;

    /// `POST /api/uploads`: register an uploaded object for processing.
    async fn register_upload(&self, upload_key: &str) -> PublishResult<UploadJobState>;

    /// `GET /api/uploads/{job_id}`: current processing status of a job.
    async fn upload_status(&self, job_id: &str) -> PublishResult<UploadJobState>;

    /// `POST /api/drafts`: create a draft and return its id.
    async fn create_draft(&self, attributes: &DraftAttributes) -> PublishResult<String>;

    /// `POST /api/drafts/{draft_id}/{variant}s`: attach an uploaded file.
    async fn add_file(&self, draft_id: &str, attachment: &FileAttachment) -> PublishResult<()>;

    /// `POST /api/drafts/{draft_id}/{thumbnails|turntables}`: attach a preview.
    async fn add_preview(&self, draft_id: &str, preview: &PreviewAttachment)
        -> PublishResult<()>;

    /// `POST /api/drafts/{draft_id}/certifications`: attach one certification.
    async fn add_certification(&self, draft_id: &str, certification: &str) -> PublishResult<()>;

    /// `POST /api/products`: publish the draft as a product.
    async fn publish_draft(&self, draft_id: &str) -> PublishResult<Product>;
}
