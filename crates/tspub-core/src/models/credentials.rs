use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Minimum remaining lifetime, in seconds, credentials must have before an upload.
pub const CREDENTIAL_SAFETY_MARGIN_SECS: i64 = 15;

/// Short-lived object-storage credentials issued by the publishing API.
///
/// A value is never mutated once issued; a refresh produces a new one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
    pub bucket: String,
    pub key_prefix: String,
    pub region: String,
}

impl Credentials {
    /// True when fewer than `margin` remain before expiration at `now`.
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expiration - now <= margin
    }

    /// True when the credentials must be refreshed before the next upload.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_within(Duration::seconds(CREDENTIAL_SAFETY_MARGIN_SECS), now)
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .field("bucket", &self.bucket)
            .field("key_prefix", &self.key_prefix)
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials_expiring_in(secs: i64, now: DateTime<Utc>) -> Credentials {
        Credentials {
            access_key: "AKIA".into(),
            secret_key: "secret".into(),
            session_token: "token".into(),
            expiration: now + Duration::seconds(secs),
            bucket: "uploads".into(),
            key_prefix: "incoming/42/".into(),
            region: "us-east-1".into(),
        }
    }

    #[test]
    fn test_needs_refresh_boundaries() {
        let now = Utc::now();
        assert!(credentials_expiring_in(-60, now).needs_refresh(now));
        assert!(credentials_expiring_in(0, now).needs_refresh(now));
        assert!(credentials_expiring_in(15, now).needs_refresh(now));
        assert!(!credentials_expiring_in(16, now).needs_refresh(now));
        assert!(!credentials_expiring_in(3600, now).needs_refresh(now));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", credentials_expiring_in(60, Utc::now()));
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("uploads"));
    }
}
