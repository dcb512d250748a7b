//! Storage sessions
//!
//! A [`StorageSession`] pairs one set of temporary credentials with the object
//! store opened from them. Sessions are immutable: refreshing credentials
//! produces a new session instead of mutating the current one.

use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tspub_core::models::Credentials;
use tspub_core::PublishError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Source file unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for PublishError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SourceUnavailable(msg) | StorageError::InvalidKey(msg) => {
                PublishError::Validation(msg)
            }
            StorageError::ConfigError(msg) => PublishError::Auth(msg),
            StorageError::UploadFailed(msg) => PublishError::Storage(msg),
        }
    }
}

/// Credentials together with the object store they grant access to.
pub struct StorageSession {
    credentials: Credentials,
    store: Arc<dyn ObjectStore>,
}

impl StorageSession {
    pub fn new(credentials: Credentials, store: Arc<dyn ObjectStore>) -> Self {
        Self { credentials, store }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn key_prefix(&self) -> &str {
        &self.credentials.key_prefix
    }

    pub fn bucket(&self) -> &str {
        &self.credentials.bucket
    }

    /// Stream the full contents of `source` to `key`. Returns the number of bytes written.
    ///
    /// A failed upload is not cleaned up; incomplete multipart parts are left to
    /// the bucket's own lifecycle rules.
    pub async fn upload_file(&self, source: &Path, key: &str) -> StorageResult<u64> {
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source).await.map_err(|e| {
            StorageError::SourceUnavailable(format!("{}: {}", source.display(), e))
        })?;

        let location = ObjectPath::from(key.to_string());
        let mut writer = BufWriter::new(Arc::clone(&self.store), location);

        let result = async {
            let size = tokio::io::copy(&mut file, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<u64, std::io::Error>(size)
        }
        .await;

        let size = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.credentials.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(format!("{}: {}", key, e))
        })?;

        tracing::info!(
            bucket = %self.credentials.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(size)
    }
}

impl std::fmt::Debug for StorageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession")
            .field("credentials", &self.credentials)
            .field("store", &self.store.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use object_store::memory::InMemory;
    use object_store::ObjectStoreExt;

    fn credentials() -> Credentials {
        Credentials {
            access_key: "AKIA".into(),
            secret_key: "secret".into(),
            session_token: "token".into(),
            expiration: Utc::now() + Duration::hours(1),
            bucket: "uploads".into(),
            key_prefix: "incoming/1/".into(),
            region: "us-east-1".into(),
        }
    }

    #[tokio::test]
    async fn test_upload_file_streams_contents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("chair.max");
        std::fs::write(&source, b"model bytes").unwrap();

        let store = Arc::new(InMemory::new());
        let session = StorageSession::new(credentials(), store.clone());

        let size = session
            .upload_file(&source, "incoming/1/chair.max")
            .await
            .unwrap();
        assert_eq!(size, 11);

        let stored = store
            .get(&ObjectPath::from("incoming/1/chair.max"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(stored.as_ref(), b"model bytes");
    }

    #[tokio::test]
    async fn test_upload_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let session = StorageSession::new(credentials(), Arc::new(InMemory::new()));

        let result = session
            .upload_file(&dir.path().join("missing.max"), "incoming/1/missing.max")
            .await;
        assert!(matches!(result, Err(StorageError::SourceUnavailable(_))));

        let err: PublishError = result.unwrap_err().into();
        assert!(matches!(err, PublishError::Validation(_)));
    }
}
