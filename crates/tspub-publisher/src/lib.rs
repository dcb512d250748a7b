//! tspub Publisher Library
//!
//! Upload orchestration and staged draft assembly:
//!
//! - [`CredentialManager`] keeps a storage session with valid temporary credentials
//! - [`ObjectUploader`] streams local files into the active session
//! - [`UploadStatusPoller`] registers uploaded objects and waits for processing
//! - [`DraftPipeline`] drives the draft from creation to publication
//!
//! Runs produce a [`PublishReport`] and, when enabled, a [`Checkpoint`] next
//! to the bundle that lets an interrupted run resume on the same draft.

pub mod checkpoint;
pub mod credentials;
pub mod pipeline;
pub mod poller;
pub mod report;
pub mod transfer;
pub mod uploader;

pub use checkpoint::{Checkpoint, CHECKPOINT_FILE};
pub use credentials::CredentialManager;
pub use pipeline::{DraftPipeline, PipelineState, RunOptions};
pub use poller::{BackoffPolicy, UploadStatusPoller};
pub use report::{ItemKind, ItemOutcome, ItemReport, PublishReport};
pub use transfer::FileTransfer;
pub use uploader::ObjectUploader;
