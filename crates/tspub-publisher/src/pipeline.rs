//! Draft assembly pipeline.
//!
//! A draft moves through `Created -> DraftOpen -> FilesAttached ->
//! PreviewsAttached -> CertificationsSet -> Published`. A stage state is
//! reached only once every item of that stage is attached. Nothing is rolled
//! back: a failed call leaves the pipeline in the last completed stage.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use tspub_api_client::PublishingApi;
use tspub_core::models::{
    DraftAttributes, FileAttachment, FileEntry, FileId, PreviewAttachment, PreviewEntry, Product,
    ProductBundle,
};
use tspub_core::{FailurePolicy, LogLevel, PublishError, PublishResult, Settings};
use tspub_storage::SessionFactory;

use crate::checkpoint::Checkpoint;
use crate::credentials::CredentialManager;
use crate::poller::UploadStatusPoller;
use crate::report::{ItemKind, ItemOutcome, PublishReport};
use crate::transfer::FileTransfer;
use crate::uploader::ObjectUploader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Created,
    DraftOpen,
    FilesAttached,
    PreviewsAttached,
    CertificationsSet,
    Published,
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineState::Created => "created",
            PipelineState::DraftOpen => "draft_open",
            PipelineState::FilesAttached => "files_attached",
            PipelineState::PreviewsAttached => "previews_attached",
            PipelineState::CertificationsSet => "certifications_set",
            PipelineState::Published => "published",
        };
        write!(f, "{}", name)
    }
}

/// Options of a full [`DraftPipeline::run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Publish the draft once everything is attached
    pub publish: bool,
    /// Continue the draft recorded in the bundle's checkpoint
    pub resume: bool,
    pub on_error: FailurePolicy,
    /// Write a checkpoint after every successful transition
    pub checkpoint: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            publish: false,
            resume: false,
            on_error: FailurePolicy::Halt,
            checkpoint: true,
        }
    }
}

impl RunOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            on_error: settings.on_error,
            ..Self::default()
        }
    }
}

pub struct DraftPipeline {
    api: Arc<dyn PublishingApi>,
    transfer: FileTransfer,
    concurrency: usize,
    state: PipelineState,
    draft_id: Option<String>,
    product: Option<Product>,
}

impl DraftPipeline {
    pub fn new(api: Arc<dyn PublishingApi>, transfer: FileTransfer) -> Self {
        Self {
            api,
            transfer,
            concurrency: 1,
            state: PipelineState::Created,
            draft_id: None,
            product: None,
        }
    }

    /// Wire the full upload path (credentials, uploader, poller) from settings.
    pub fn from_settings(
        api: Arc<dyn PublishingApi>,
        factory: Arc<dyn SessionFactory>,
        settings: &Settings,
    ) -> Self {
        let credentials = Arc::new(CredentialManager::new(Arc::clone(&api), factory));
        let transfer = FileTransfer::new(
            ObjectUploader::new(credentials),
            UploadStatusPoller::from_settings(Arc::clone(&api), settings),
        );
        Self::new(api, transfer).with_concurrency(settings.max_concurrent_uploads)
    }

    /// Number of uploads allowed in flight at once. Attach calls stay sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.as_deref()
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    fn require_draft(&self, operation: &str) -> PublishResult<String> {
        if self.state == PipelineState::Published {
            return Err(PublishError::Precondition(format!(
                "{}: draft has already been published",
                operation
            )));
        }
        self.draft_id.clone().ok_or_else(|| {
            PublishError::Precondition(format!("{}: no draft has been created", operation))
        })
    }

    /// Move `from -> to` once a whole stage has been attached. A stage whose
    /// predecessor never completed leaves the state where it is.
    fn complete_stage(&mut self, from: PipelineState, to: PipelineState) {
        if self.state == from {
            tracing::debug!(from = %self.state, to = %to, "Pipeline state changed");
            self.state = to;
        }
    }

    /// Continue an existing remote draft instead of creating one.
    pub fn open_existing(&mut self, draft_id: impl Into<String>) -> PublishResult<()> {
        if self.state != PipelineState::Created {
            return Err(PublishError::Precondition(format!(
                "cannot open a draft in state {}",
                self.state
            )));
        }
        self.draft_id = Some(draft_id.into());
        self.state = PipelineState::DraftOpen;
        Ok(())
    }

    pub async fn create_draft(&mut self, attributes: &DraftAttributes) -> PublishResult<String> {
        if self.state != PipelineState::Created {
            return Err(PublishError::Precondition(format!(
                "create draft: draft already exists (state {})",
                self.state
            )));
        }

        let draft_id = self.api.create_draft(attributes).await?;
        tracing::info!(draft_id = %draft_id, name = %attributes.name, "Draft created");

        self.draft_id = Some(draft_id.clone());
        self.state = PipelineState::DraftOpen;
        Ok(draft_id)
    }

    /// Attach a file whose upload job already succeeded.
    pub async fn attach_file(&mut self, attachment: &FileAttachment) -> PublishResult<()> {
        let draft_id = self.require_draft("add file")?;
        self.api.add_file(&draft_id, attachment).await?;
        tracing::info!(
            draft_id = %draft_id,
            file_id = attachment.file_id,
            kind = %attachment.kind,
            "File attached"
        );
        Ok(())
    }

    /// Upload one bundle file, wait for its file id and attach it.
    pub async fn add_file(
        &mut self,
        bundle: &ProductBundle,
        entry: &FileEntry,
    ) -> PublishResult<FileId> {
        self.require_draft("add file")?;
        let file_id = self
            .transfer
            .transfer(&bundle.resolve(&entry.file_name))
            .await?;
        self.attach_file(&entry.attach(file_id)).await?;
        Ok(file_id)
    }

    /// Add every bundle file in order, stopping at the first failure.
    pub async fn add_files(&mut self, bundle: &ProductBundle) -> PublishResult<Vec<FileId>> {
        self.require_draft("add file")?;
        let mut file_ids = Vec::with_capacity(bundle.files.len());
        for entry in &bundle.files {
            file_ids.push(self.add_file(bundle, entry).await?);
        }
        self.complete_stage(PipelineState::DraftOpen, PipelineState::FilesAttached);
        Ok(file_ids)
    }

    pub async fn attach_preview(&mut self, preview: &PreviewAttachment) -> PublishResult<()> {
        let draft_id = self.require_draft("add preview")?;
        self.api.add_preview(&draft_id, preview).await?;
        tracing::info!(
            draft_id = %draft_id,
            kind = preview.resource_type(),
            "Preview attached"
        );
        Ok(())
    }

    /// Upload a preview and attach it.
    ///
    /// A turntable uploads every non-hidden entry of its directory in listing
    /// order and attaches the collected file ids in that same order.
    pub async fn add_preview(
        &mut self,
        bundle: &ProductBundle,
        entry: &PreviewEntry,
    ) -> PublishResult<PreviewAttachment> {
        self.require_draft("add preview")?;

        let attachment = match entry {
            PreviewEntry::Thumbnail {
                file_name,
                thumbnail_type,
            } => PreviewAttachment::Thumbnail {
                file_id: self.transfer.transfer(&bundle.resolve(file_name)).await?,
                thumbnail_type: thumbnail_type.clone(),
            },
            PreviewEntry::Turntable {
                file_name,
                thumbnail_type,
            } => {
                let frames = bundle.turntable_frames(file_name)?;
                if frames.is_empty() {
                    return Err(PublishError::Validation(format!(
                        "turntable directory {} contains no frames",
                        file_name
                    )));
                }
                PreviewAttachment::Turntable {
                    file_ids: self.upload_all(bundle, &frames).await?,
                    thumbnail_type: thumbnail_type.clone(),
                }
            }
        };

        self.attach_preview(&attachment).await?;
        Ok(attachment)
    }

    /// Add every bundle preview in order, stopping at the first failure.
    pub async fn add_previews(
        &mut self,
        bundle: &ProductBundle,
    ) -> PublishResult<Vec<PreviewAttachment>> {
        self.require_draft("add preview")?;
        let mut attachments = Vec::with_capacity(bundle.previews.len());
        for entry in &bundle.previews {
            attachments.push(self.add_preview(bundle, entry).await?);
        }
        self.complete_stage(PipelineState::FilesAttached, PipelineState::PreviewsAttached);
        Ok(attachments)
    }

    /// Upload files through the bounded buffer; ids come back in input order.
    async fn upload_all(
        &self,
        bundle: &ProductBundle,
        file_names: &[String],
    ) -> PublishResult<Vec<FileId>> {
        let transfer = &self.transfer;
        stream::iter(file_names)
            .map(|name| {
                let path = bundle.resolve(name);
                async move { transfer.transfer(&path).await }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    pub async fn add_certification(&mut self, certification: &str) -> PublishResult<()> {
        let draft_id = self.require_draft("set certifications")?;
        self.api.add_certification(&draft_id, certification).await?;
        tracing::info!(
            draft_id = %draft_id,
            certification = %certification,
            "Certification set"
        );
        Ok(())
    }

    /// One call per identifier, in order, duplicates included.
    pub async fn set_certifications(&mut self, certifications: &[String]) -> PublishResult<()> {
        self.require_draft("set certifications")?;
        for certification in certifications {
            self.add_certification(certification).await?;
        }
        self.complete_stage(PipelineState::PreviewsAttached, PipelineState::CertificationsSet);
        Ok(())
    }

    pub async fn publish(&mut self) -> PublishResult<Product> {
        let draft_id = self.require_draft("publish")?;
        let product = self.api.publish_draft(&draft_id).await?;
        tracing::info!(draft_id = %draft_id, product_id = %product.id, "Draft published");

        self.state = PipelineState::Published;
        self.product = Some(product.clone());
        Ok(product)
    }

    /// Build the bundle's draft end to end.
    ///
    /// Only a failure to create (or resume) the draft is returned as an
    /// error; everything after that is reported per item in the
    /// [`PublishReport`].
    pub async fn run(
        &mut self,
        bundle: &ProductBundle,
        options: &RunOptions,
    ) -> PublishResult<PublishReport> {
        let mut checkpoint = self.open_draft(bundle, options).await?;
        let mut report = PublishReport::new(self.state);

        let halted = self
            .run_files(bundle, options, &mut checkpoint, &mut report)
            .await;
        let halted = self
            .run_previews(bundle, options, &mut checkpoint, &mut report, halted)
            .await;
        let halted = self
            .run_certifications(bundle, options, &mut checkpoint, &mut report, halted)
            .await;

        if options.publish {
            if halted || report.has_failures() {
                let err = PublishError::Precondition(
                    "publish refused: not every file, preview and certification was attached"
                        .to_string(),
                );
                tracing::warn!(draft_id = ?self.draft_id, "{}", err);
                report.error = Some(err.to_string());
            } else {
                match self.publish().await {
                    Ok(product) => {
                        report.product_id = Some(product.id);
                        if options.checkpoint {
                            if let Err(e) = Checkpoint::remove(&bundle.directory) {
                                tracing::warn!(error = %e, "Failed to remove checkpoint");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(draft_id = ?self.draft_id, error = %e, "Publish failed");
                        report.error = Some(e.to_string());
                    }
                }
            }
        }

        report.draft_id = self.draft_id.clone();
        report.state = self.state;
        Ok(report)
    }

    async fn open_draft(
        &mut self,
        bundle: &ProductBundle,
        options: &RunOptions,
    ) -> PublishResult<Checkpoint> {
        if options.resume {
            if let Some(checkpoint) = Checkpoint::load(&bundle.directory)? {
                tracing::info!(
                    draft_id = %checkpoint.draft_id,
                    files = checkpoint.files.len(),
                    previews = checkpoint.previews.len(),
                    "Resuming draft from checkpoint"
                );
                self.open_existing(checkpoint.draft_id.clone())?;
                return Ok(checkpoint);
            }
            tracing::info!("No checkpoint found, creating a new draft");
        }

        let draft_id = match self.draft_id.clone() {
            Some(id) => id,
            None => self.create_draft(&bundle.draft_attributes()).await?,
        };
        let checkpoint = Checkpoint::new(draft_id);
        save_checkpoint(&checkpoint, bundle, options);
        Ok(checkpoint)
    }

    /// Returns true when the run halted.
    async fn run_files(
        &mut self,
        bundle: &ProductBundle,
        options: &RunOptions,
        checkpoint: &mut Checkpoint,
        report: &mut PublishReport,
    ) -> bool {
        let mut pending = Vec::new();
        for entry in &bundle.files {
            if checkpoint.has_file(&entry.file_name) {
                report.record(ItemKind::File, &entry.file_name, ItemOutcome::Resumed);
            } else {
                pending.push(entry);
            }
        }

        // Uploads may run ahead up to `concurrency` files; attaches follow in bundle order.
        let transfer = self.transfer.clone();
        let mut uploads = stream::iter(pending.iter().copied())
            .map(|entry| {
                let path = bundle.resolve(&entry.file_name);
                let transfer = &transfer;
                async move { transfer.transfer(&path).await }
            })
            .buffered(self.concurrency);

        let mut consumed = 0;
        let mut halted = false;
        let mut failed = false;
        while let Some(result) = uploads.next().await {
            let entry = pending[consumed];
            consumed += 1;

            let result = match result {
                Ok(file_id) => self.attach_file(&entry.attach(file_id)).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    report.record(ItemKind::File, &entry.file_name, ItemOutcome::Attached);
                    checkpoint.files.push(entry.file_name.clone());
                    save_checkpoint(checkpoint, bundle, options);
                }
                Err(e) => {
                    log_item_failure(ItemKind::File, &entry.file_name, &e);
                    report.record_failure(ItemKind::File, &entry.file_name, &e);
                    failed = true;
                    if options.on_error == FailurePolicy::Halt {
                        halted = true;
                        break;
                    }
                }
            }
        }
        drop(uploads);

        for entry in &pending[consumed..] {
            report.record(ItemKind::File, &entry.file_name, ItemOutcome::Skipped);
        }
        if !failed {
            self.complete_stage(PipelineState::DraftOpen, PipelineState::FilesAttached);
        }
        halted
    }

    async fn run_previews(
        &mut self,
        bundle: &ProductBundle,
        options: &RunOptions,
        checkpoint: &mut Checkpoint,
        report: &mut PublishReport,
        mut halted: bool,
    ) -> bool {
        let mut failed = false;
        for entry in &bundle.previews {
            let name = entry.file_name();
            if checkpoint.has_preview(name) {
                report.record(ItemKind::Preview, name, ItemOutcome::Resumed);
                continue;
            }
            if halted {
                report.record(ItemKind::Preview, name, ItemOutcome::Skipped);
                continue;
            }

            match self.add_preview(bundle, entry).await {
                Ok(_) => {
                    report.record(ItemKind::Preview, name, ItemOutcome::Attached);
                    checkpoint.previews.push(name.to_string());
                    save_checkpoint(checkpoint, bundle, options);
                }
                Err(e) => {
                    log_item_failure(ItemKind::Preview, name, &e);
                    report.record_failure(ItemKind::Preview, name, &e);
                    failed = true;
                    halted = options.on_error == FailurePolicy::Halt;
                }
            }
        }

        if !halted && !failed {
            self.complete_stage(PipelineState::FilesAttached, PipelineState::PreviewsAttached);
        }
        halted
    }

    async fn run_certifications(
        &mut self,
        bundle: &ProductBundle,
        options: &RunOptions,
        checkpoint: &mut Checkpoint,
        report: &mut PublishReport,
        mut halted: bool,
    ) -> bool {
        let mut failed = false;
        for (index, certification) in bundle.certifications.iter().enumerate() {
            if checkpoint.has_certification(index) {
                report.record(ItemKind::Certification, certification, ItemOutcome::Resumed);
                continue;
            }
            if halted {
                report.record(ItemKind::Certification, certification, ItemOutcome::Skipped);
                continue;
            }

            match self.add_certification(certification).await {
                Ok(()) => {
                    report.record(ItemKind::Certification, certification, ItemOutcome::Attached);
                    checkpoint.certifications.push(index);
                    save_checkpoint(checkpoint, bundle, options);
                }
                Err(e) => {
                    log_item_failure(ItemKind::Certification, certification, &e);
                    report.record_failure(ItemKind::Certification, certification, &e);
                    failed = true;
                    halted = options.on_error == FailurePolicy::Halt;
                }
            }
        }

        if !halted && !failed {
            self.complete_stage(
                PipelineState::PreviewsAttached,
                PipelineState::CertificationsSet,
            );
        }
        halted
    }
}

fn log_item_failure(kind: ItemKind, name: &str, err: &PublishError) {
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(kind = ?kind, item = %name, error = %err, "Item failed")
        }
        LogLevel::Warn => {
            tracing::warn!(kind = ?kind, item = %name, error = %err, "Item failed")
        }
        LogLevel::Error => {
            tracing::error!(
                kind = ?kind,
                item = %name,
                error = %err,
                error_code = err.error_code(),
                "Item failed"
            )
        }
    }
}

/// A checkpoint that cannot be written costs only the ability to resume.
fn save_checkpoint(checkpoint: &Checkpoint, bundle: &ProductBundle, options: &RunOptions) {
    if !options.checkpoint {
        return;
    }
    if let Err(e) = checkpoint.save(&bundle.directory) {
        tracing::warn!(error = %e, "Failed to write checkpoint");
    }
}

impl std::fmt::Debug for DraftPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftPipeline")
            .field("state", &self.state)
            .field("draft_id", &self.draft_id)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_ordered() {
        assert!(PipelineState::Created < PipelineState::DraftOpen);
        assert!(PipelineState::DraftOpen < PipelineState::FilesAttached);
        assert!(PipelineState::CertificationsSet < PipelineState::Published);
    }

    #[test]
    fn test_state_display_matches_serde() {
        for state in [
            PipelineState::Created,
            PipelineState::DraftOpen,
            PipelineState::PreviewsAttached,
            PipelineState::Published,
        ] {
            let json = serde_json::to_value(state).unwrap();
            assert_eq!(json, state.to_string());
        }
    }

    #[test]
    fn test_run_options_from_settings() {
        let settings = Settings {
            token: "t".into(),
            on_error: FailurePolicy::Skip,
            ..Settings::default()
        };
        let options = RunOptions::from_settings(&settings);
        assert_eq!(options.on_error, FailurePolicy::Skip);
        assert!(!options.publish);
        assert!(options.checkpoint);
    }
}
