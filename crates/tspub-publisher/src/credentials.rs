//! Temporary storage credentials.
//!
//! The manager owns the only [`StorageSession`] of a run. A refresh builds a
//! whole new session and swaps it in; callers hold `Arc` snapshots, so an
//! upload in flight keeps the session it started with.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tspub_api_client::PublishingApi;
use tspub_core::models::{Credentials, CREDENTIAL_SAFETY_MARGIN_SECS};
use tspub_core::{PublishError, PublishResult};
use tspub_storage::{SessionFactory, StorageSession};

pub struct CredentialManager {
    api: Arc<dyn PublishingApi>,
    factory: Arc<dyn SessionFactory>,
    current: Mutex<Option<Arc<StorageSession>>>,
}

impl CredentialManager {
    pub fn new(api: Arc<dyn PublishingApi>, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            api,
            factory,
            current: Mutex::new(None),
        }
    }

    /// Start from already issued credentials instead of an empty slot.
    pub fn with_credentials(
        api: Arc<dyn PublishingApi>,
        factory: Arc<dyn SessionFactory>,
        credentials: Credentials,
    ) -> PublishResult<Self> {
        let session = factory.open(credentials)?;
        Ok(Self {
            api,
            factory,
            current: Mutex::new(Some(Arc::new(session))),
        })
    }

    /// Current session, if credentials were issued yet.
    pub async fn current(&self) -> Option<Arc<StorageSession>> {
        self.current.lock().await.clone()
    }

    /// Return a session whose credentials stay valid past the safety margin,
    /// refreshing first when they are unset or about to expire.
    ///
    /// The check and the refresh run under one lock: concurrent callers wait
    /// for the single refresh instead of issuing their own.
    pub async fn ensure_valid(&self) -> PublishResult<Arc<StorageSession>> {
        let mut slot = self.current.lock().await;
        if let Some(session) = slot.as_ref() {
            if !session.credentials().needs_refresh(Utc::now()) {
                return Ok(Arc::clone(session));
            }
            tracing::debug!(
                expiration = %session.credentials().expiration,
                "Storage credentials expire within safety margin"
            );
        }
        self.refresh_locked(&mut slot).await
    }

    /// Request new credentials and open a new session bound to them.
    ///
    /// Failures are returned as is; a rejected or unreachable credential
    /// endpoint is not retried.
    pub async fn refresh(&self) -> PublishResult<Arc<StorageSession>> {
        let mut slot = self.current.lock().await;
        self.refresh_locked(&mut slot).await
    }

    async fn refresh_locked(
        &self,
        slot: &mut Option<Arc<StorageSession>>,
    ) -> PublishResult<Arc<StorageSession>> {
        let credentials = self.api.request_credentials().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to obtain storage credentials");
            e
        })?;

        if credentials.needs_refresh(Utc::now()) {
            return Err(PublishError::Auth(format!(
                "issued credentials expire at {}, inside the {}s safety margin",
                credentials.expiration, CREDENTIAL_SAFETY_MARGIN_SECS
            )));
        }

        let session = Arc::new(self.factory.open(credentials)?);
        tracing::info!(
            bucket = %session.bucket(),
            region = %session.credentials().region,
            expiration = %session.credentials().expiration,
            "Storage credentials refreshed"
        );

        *slot = Some(Arc::clone(&session));
        Ok(session)
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager").finish_non_exhaustive()
    }
}
