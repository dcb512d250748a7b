use std::path::Path;
use std::sync::Arc;
use tspub_core::PublishResult;
use tspub_storage::remote_key;

use crate::credentials::CredentialManager;

/// Streams local files into the bucket of the active storage session.
#[derive(Debug, Clone)]
pub struct ObjectUploader {
    credentials: Arc<CredentialManager>,
}

impl ObjectUploader {
    pub fn new(credentials: Arc<CredentialManager>) -> Self {
        Self { credentials }
    }

    /// Upload `source` to `{key_prefix}{file_name}` and return that key.
    ///
    /// Credentials are checked (and refreshed if needed) right before the
    /// transfer. A failed transfer leaves any partial object to the store.
    pub async fn upload(&self, source: &Path) -> PublishResult<String> {
        let session = self.credentials.ensure_valid().await?;
        let key = remote_key(session.key_prefix(), source)?;

        tracing::debug!(
            source = %source.display(),
            key = %key,
            "Uploading file"
        );

        session.upload_file(source, &key).await?;
        Ok(key)
    }
}
