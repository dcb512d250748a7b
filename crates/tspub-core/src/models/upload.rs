use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use super::attachment::FileId;

/// Server-side processing status of an uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Queued,
    Processing,
    Success,
    Failure,
    /// Any status this client does not know; treated as a failed job.
    #[serde(other)]
    Unknown,
}

impl UploadStatus {
    /// Queued or processing: the job must be polled again.
    pub fn is_pending(&self) -> bool {
        matches!(self, UploadStatus::Queued | UploadStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Queued => write!(f, "queued"),
            UploadStatus::Processing => write!(f, "processing"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Failure => write!(f, "failure"),
            UploadStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of an upload job as reported by the processing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJobState {
    pub job_id: String,
    pub status: UploadStatus,
    pub file_id: Option<FileId>,
    pub message: Option<String>,
}

/// A local file registered for server-side processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub source: PathBuf,
    pub remote_key: String,
    pub job_id: String,
    pub status: UploadStatus,
    pub message: Option<String>,
    file_id: Option<FileId>,
}

impl UploadJob {
    pub fn new(source: PathBuf, remote_key: String, state: UploadJobState) -> Self {
        let mut job = Self {
            source,
            remote_key,
            job_id: state.job_id.clone(),
            status: UploadStatus::Queued,
            message: None,
            file_id: None,
        };
        job.apply(state);
        job
    }

    /// Record a polled state. Terminal jobs ignore further updates.
    pub fn apply(&mut self, state: UploadJobState) {
        if self.status.is_terminal() {
            return;
        }
        self.status = state.status;
        self.message = state.message;
        self.file_id = state.file_id;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Remote file id, only available once the job succeeded.
    pub fn file_id(&self) -> Option<FileId> {
        match self.status {
            UploadStatus::Success => self.file_id,
            _ => None,
        }
    }

    /// Source path as shown in logs and errors.
    pub fn display_name(&self) -> String {
        self.source.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: UploadStatus, file_id: Option<FileId>) -> UploadJobState {
        UploadJobState {
            job_id: "job-1".into(),
            status,
            file_id,
            message: None,
        }
    }

    #[test]
    fn test_status_deserialize_unknown() {
        let status: UploadStatus = serde_json::from_str("\"exploded\"").unwrap();
        assert_eq!(status, UploadStatus::Unknown);
        assert!(status.is_terminal());

        let status: UploadStatus = serde_json::from_str("\"processing\"").unwrap();
        assert!(status.is_pending());
    }

    #[test]
    fn test_file_id_only_on_success() {
        let mut job = UploadJob::new(
            PathBuf::from("/tmp/a.max"),
            "prefix/a.max".into(),
            state(UploadStatus::Processing, Some(7)),
        );
        assert_eq!(job.file_id(), None);

        job.apply(state(UploadStatus::Success, Some(7)));
        assert_eq!(job.file_id(), Some(7));
    }

    #[test]
    fn test_terminal_job_ignores_updates() {
        let mut job = UploadJob::new(
            PathBuf::from("a.max"),
            "a.max".into(),
            state(UploadStatus::Failure, None),
        );
        job.apply(state(UploadStatus::Success, Some(1)));
        assert_eq!(job.status, UploadStatus::Failure);
        assert_eq!(job.file_id(), None);
    }
}
