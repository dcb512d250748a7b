//! Test helpers for publisher integration tests
//!
//! [`MockPublishingApi`] records every remote call in order and simulates
//! upload jobs; fixtures write bundle directories to a temp dir.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tspub_api_client::PublishingApi;
use tspub_core::models::{
    Credentials, DraftAttributes, FileAttachment, FileId, PreviewAttachment, Product,
    UploadJobState, UploadStatus,
};
use tspub_core::{PublishError, PublishResult, Settings};
use tspub_publisher::DraftPipeline;
use tspub_storage::MemorySessionFactory;

pub const DRAFT_ID: &str = "555";
pub const PRODUCT_ID: &str = "8080";
pub const KEY_PREFIX: &str = "incoming/42/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestCredentials,
    RegisterUpload(String),
    UploadStatus { job_id: String, status: UploadStatus },
    CreateDraft(String),
    AddFile(String, FileAttachment),
    AddPreview(String, PreviewAttachment),
    AddCertification(String, String),
    PublishDraft(String),
}

#[derive(Debug)]
struct Job {
    key: String,
    file_id: FileId,
    polls: u32,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    jobs: HashMap<String, Job>,
    next_job: u64,
    transient_failures_left: u32,
}

/// Recording fake of the publishing API.
#[derive(Debug)]
pub struct MockPublishingApi {
    state: Mutex<State>,
    credential_ttl_secs: i64,
    reject_credentials: bool,
    pending_polls: u32,
    finished_on_register: bool,
    never_finish: bool,
    failing_files: Vec<String>,
    rejected_certifications: Vec<String>,
}

impl Default for MockPublishingApi {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            credential_ttl_secs: 3600,
            reject_credentials: false,
            pending_polls: 1,
            finished_on_register: false,
            never_finish: false,
            failing_files: Vec::new(),
            rejected_certifications: Vec::new(),
        }
    }
}

impl MockPublishingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime of issued credentials.
    pub fn with_credential_ttl(mut self, secs: i64) -> Self {
        self.credential_ttl_secs = secs;
        self
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.reject_credentials = true;
        self
    }

    /// Polls answering `processing` before a job reaches its terminal status.
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Jobs are already successful when registered.
    pub fn finished_on_register(mut self) -> Self {
        self.finished_on_register = true;
        self
    }

    pub fn never_finishing(mut self) -> Self {
        self.never_finish = true;
        self
    }

    /// Jobs of keys ending with `file_name` end in `failure`.
    pub fn failing_file(mut self, file_name: &str) -> Self {
        self.failing_files.push(file_name.to_string());
        self
    }

    /// The first `count` status polls fail with a network error.
    pub fn with_transient_poll_failures(self, count: u32) -> Self {
        self.state.lock().unwrap().transient_failures_left = count;
        self
    }

    pub fn rejecting_certification(mut self, certification: &str) -> Self {
        self.rejected_certifications.push(certification.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    /// Calls that change the draft, without the upload traffic.
    pub fn draft_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                !matches!(
                    c,
                    Call::RequestCredentials | Call::RegisterUpload(_) | Call::UploadStatus { .. }
                )
            })
            .collect()
    }

    /// Registered upload keys, in registration order.
    pub fn registered_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::RegisterUpload(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn file_id_of(&self, key: &str) -> Option<FileId> {
        let state = self.state.lock().unwrap();
        state
            .jobs
            .values()
            .find(|job| job.key == key)
            .map(|job| job.file_id)
    }

    pub fn job_of_file_id(&self, file_id: FileId) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .jobs
            .iter()
            .find(|(_, job)| job.file_id == file_id)
            .map(|(id, _)| id.clone())
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn terminal_status(&self, key: &str) -> UploadStatus {
        if self.failing_files.iter().any(|f| key.ends_with(f.as_str())) {
            UploadStatus::Failure
        } else {
            UploadStatus::Success
        }
    }

    fn job_state(&self, job_id: &str, status: UploadStatus, file_id: FileId) -> UploadJobState {
        UploadJobState {
            job_id: job_id.to_string(),
            status,
            file_id: (status == UploadStatus::Success).then_some(file_id),
            message: (status == UploadStatus::Failure).then(|| "corrupt archive".to_string()),
        }
    }
}

#[async_trait]
impl PublishingApi for MockPublishingApi {
    async fn request_credentials(&self) -> PublishResult<Credentials> {
        self.record(Call::RequestCredentials);
        if self.reject_credentials {
            return Err(PublishError::Auth("status 401: invalid token".into()));
        }
        Ok(credentials(self.credential_ttl_secs))
    }

    async fn register_upload(&self, upload_key: &str) -> PublishResult<UploadJobState> {
        self.record(Call::RegisterUpload(upload_key.to_string()));

        let mut state = self.state.lock().unwrap();
        state.next_job += 1;
        let job_id = format!("job-{}", state.next_job);
        let file_id = 1000 + state.next_job;
        state.jobs.insert(
            job_id.clone(),
            Job {
                key: upload_key.to_string(),
                file_id,
                polls: 0,
            },
        );
        drop(state);

        let status = if self.finished_on_register {
            self.terminal_status(upload_key)
        } else {
            UploadStatus::Queued
        };
        Ok(self.job_state(&job_id, status, file_id))
    }

    async fn upload_status(&self, job_id: &str) -> PublishResult<UploadJobState> {
        let mut state = self.state.lock().unwrap();
        if state.transient_failures_left > 0 {
            state.transient_failures_left -= 1;
            return Err(PublishError::Network("connection reset".into()));
        }

        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| PublishError::RemoteRejection {
                status: 404,
                body: format!("unknown job {}", job_id),
            })?;
        job.polls += 1;
        let (key, file_id, polls) = (job.key.clone(), job.file_id, job.polls);

        let status = if self.never_finish || polls <= self.pending_polls {
            UploadStatus::Processing
        } else {
            self.terminal_status(&key)
        };
        state.calls.push(Call::UploadStatus {
            job_id: job_id.to_string(),
            status,
        });
        drop(state);

        Ok(self.job_state(job_id, status, file_id))
    }

    async fn create_draft(&self, attributes: &DraftAttributes) -> PublishResult<String> {
        self.record(Call::CreateDraft(attributes.name.clone()));
        Ok(DRAFT_ID.to_string())
    }

    async fn add_file(&self, draft_id: &str, attachment: &FileAttachment) -> PublishResult<()> {
        self.record(Call::AddFile(draft_id.to_string(), attachment.clone()));
        Ok(())
    }

    async fn add_preview(
        &self,
        draft_id: &str,
        preview: &PreviewAttachment,
    ) -> PublishResult<()> {
        self.record(Call::AddPreview(draft_id.to_string(), preview.clone()));
        Ok(())
    }

    async fn add_certification(&self, draft_id: &str, certification: &str) -> PublishResult<()> {
        self.record(Call::AddCertification(
            draft_id.to_string(),
            certification.to_string(),
        ));
        if self.rejected_certifications.iter().any(|c| c == certification) {
            return Err(PublishError::RemoteRejection {
                status: 422,
                body: "unknown certification".into(),
            });
        }
        Ok(())
    }

    async fn publish_draft(&self, draft_id: &str) -> PublishResult<Product> {
        self.record(Call::PublishDraft(draft_id.to_string()));
        Ok(Product {
            id: PRODUCT_ID.to_string(),
            draft_id: draft_id.to_string(),
        })
    }
}

pub fn credentials(ttl_secs: i64) -> Credentials {
    Credentials {
        access_key: "AKIA".into(),
        secret_key: "secret".into(),
        session_token: "session".into(),
        expiration: Utc::now() + Duration::seconds(ttl_secs),
        bucket: "uploads".into(),
        key_prefix: KEY_PREFIX.into(),
        region: "us-east-1".into(),
    }
}

pub fn settings() -> Settings {
    Settings {
        token: "test-token".into(),
        upload_timeout: 30,
        ..Settings::default()
    }
}

/// Pipeline wired to the mock API and an in-memory object store.
pub fn pipeline(api: &Arc<MockPublishingApi>, settings: &Settings) -> (DraftPipeline, MemorySessionFactory) {
    let factory = MemorySessionFactory::new();
    let pipeline = DraftPipeline::from_settings(
        Arc::clone(api) as Arc<dyn PublishingApi>,
        Arc::new(factory.clone()),
        settings,
    );
    (pipeline, factory)
}
