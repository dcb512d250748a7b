use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::sync::Arc;
use tspub_core::models::Credentials;

use crate::session::{StorageError, StorageResult, StorageSession};

/// Opens an object store from a set of temporary credentials.
pub trait SessionFactory: Send + Sync {
    fn open_store(&self, credentials: &Credentials) -> StorageResult<Arc<dyn ObjectStore>>;

    /// Build a session bound to `credentials`.
    fn open(&self, credentials: Credentials) -> StorageResult<StorageSession> {
        let store = self.open_store(&credentials)?;
        Ok(StorageSession::new(credentials, store))
    }
}

/// S3 (or S3-compatible) sessions authenticated with the issued key material.
#[derive(Debug, Clone, Default)]
pub struct S3SessionFactory {
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3SessionFactory {
    /// # Arguments
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(endpoint_url: Option<String>) -> Self {
        Self { endpoint_url }
    }
}

impl SessionFactory for S3SessionFactory {
    fn open_store(&self, credentials: &Credentials) -> StorageResult<Arc<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::new()
            .with_region(credentials.region.clone())
            .with_bucket_name(credentials.bucket.clone())
            .with_access_key_id(credentials.access_key.clone())
            .with_secret_access_key(credentials.secret_key.clone())
            .with_token(credentials.session_token.clone());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::debug!(
            bucket = %credentials.bucket,
            region = %credentials.region,
            "Opened S3 storage session"
        );

        Ok(Arc::new(store))
    }
}

/// Sessions backed by one shared in-memory store, whatever the credentials.
///
/// Used for dry runs and tests; [`MemorySessionFactory::store`] exposes the
/// objects written so far.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionFactory {
    store: Arc<InMemory>,
}

impl MemorySessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> Arc<InMemory> {
        Arc::clone(&self.store)
    }
}

impl SessionFactory for MemorySessionFactory {
    fn open_store(&self, _credentials: &Credentials) -> StorageResult<Arc<dyn ObjectStore>> {
        Ok(self.store.clone())
    }
}
