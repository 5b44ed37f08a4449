//! Ticketing credential acquisition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use incident_sync_sdk::{Credentials, IncidentSyncError};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::error::Category;
use tracing::{debug, error, instrument};

use super::ports::SecretStore;

/// Source of ticketing credentials for one invocation.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// # Errors
    /// Returns [`IncidentSyncError::CredentialUnavailable`] when the secret
    /// cannot be read or parsed.
    async fn fetch(&self) -> Result<Credentials, IncidentSyncError>;
}

#[derive(Deserialize)]
struct RawCredentials {
    instance_url: String,
    username: String,
    password: String,
}

/// Parse a `{instance_url, username, password}` secret document.
///
/// Error messages never echo the secret content.
///
/// # Errors
/// Returns [`IncidentSyncError::CredentialUnavailable`] on malformed JSON, a
/// missing field, or an `instance_url` that is not an http(s) URL.
pub fn parse_credentials(raw: &str) -> Result<Credentials, IncidentSyncError> {
    let parsed: RawCredentials = serde_json::from_str(raw).map_err(|e| {
        let kind = match e.classify() {
            Category::Io => "io",
            Category::Syntax => "syntax",
            Category::Data => "data",
            Category::Eof => "eof",
        };
        IncidentSyncError::credential_unavailable(format!(
            "secret is not a valid credentials document ({kind} error at line {}, column {})",
            e.line(),
            e.column()
        ))
    })?;

    let url = url::Url::parse(&parsed.instance_url).map_err(|_| {
        IncidentSyncError::credential_unavailable("instance_url is not a valid URL")
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IncidentSyncError::credential_unavailable(
            "instance_url must use http or https",
        ));
    }

    Ok(Credentials::new(
        parsed.instance_url,
        parsed.username,
        parsed.password,
    ))
}

/// Reads credentials from a [`SecretStore`] on every call.
pub struct SecretCredentialProvider {
    store: Arc<dyn SecretStore>,
    secret_id: String,
}

impl SecretCredentialProvider {
    pub fn new(store: Arc<dyn SecretStore>, secret_id: impl Into<String>) -> Self {
        Self {
            store,
            secret_id: secret_id.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for SecretCredentialProvider {
    #[instrument(skip(self), fields(secret_id = %self.secret_id))]
    async fn fetch(&self) -> Result<Credentials, IncidentSyncError> {
        let raw = self.store.get_secret(&self.secret_id).await.map_err(|e| {
            error!(error = %e, "Failed to read ticketing credentials");
            IncidentSyncError::credential_unavailable("unable to retrieve ticketing credentials")
        })?;

        parse_credentials(&raw).inspect_err(|e| {
            error!(error = %e, "Failed to parse ticketing credentials");
        })
    }
}

/// Time-bounded cache in front of another provider.
///
/// Only successful fetches are cached; an empty or expired slot falls through
/// to the inner provider.
pub struct CachedCredentialProvider<P> {
    inner: P,
    ttl: Duration,
    slot: Mutex<Option<(Instant, Credentials)>>,
}

impl<P: CredentialProvider> CachedCredentialProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<Credentials> {
        let slot = self.slot.lock();
        slot.as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, creds)| creds.clone())
    }
}

#[async_trait]
impl<P: CredentialProvider> CredentialProvider for CachedCredentialProvider<P> {
    async fn fetch(&self) -> Result<Credentials, IncidentSyncError> {
        if let Some(creds) = self.cached() {
            debug!("Using cached ticketing credentials");
            return Ok(creds);
        }

        let creds = self.inner.fetch().await?;
        *self.slot.lock() = Some((Instant::now(), creds.clone()));
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::ExposeSecret;

    struct MockSecretStore {
        value: Option<String>,
        reads: AtomicUsize,
    }

    impl MockSecretStore {
        fn new(value: Option<&str>) -> Self {
            Self {
                value: value.map(str::to_owned),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SecretStore for MockSecretStore {
        async fn get_secret(&self, secret_id: &str) -> anyhow::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.value
                .clone()
                .ok_or_else(|| anyhow::anyhow!("secret {secret_id} not found"))
        }
    }

    const VALID: &str =
        r#"{"instance_url":"https://acme.example.com","username":"svc","password":"hunter2"}"#;

    #[test]
    fn parse_valid_document() {
        let creds = parse_credentials(VALID).unwrap();
        assert_eq!(creds.instance_url, "https://acme.example.com");
        assert_eq!(creds.username, "svc");
        assert_eq!(creds.password.expose_secret(), "hunter2");
    }

    #[test]
    fn parse_rejects_missing_field_without_leaking_secret() {
        let err =
            parse_credentials(r#"{"instance_url":"https://a.example.com","password":"hunter2"}"#)
                .unwrap_err();
        assert!(matches!(err, IncidentSyncError::CredentialUnavailable { .. }));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn parse_rejects_non_json_and_bad_urls() {
        assert!(parse_credentials("not json").is_err());
        assert!(
            parse_credentials(r#"{"instance_url":"acme","username":"u","password":"p"}"#).is_err()
        );
        assert!(
            parse_credentials(r#"{"instance_url":"ftp://acme","username":"u","password":"p"}"#)
                .is_err()
        );
    }

    #[tokio::test]
    async fn missing_secret_is_credential_unavailable() {
        let provider =
            SecretCredentialProvider::new(Arc::new(MockSecretStore::new(None)), "itsm-creds");
        let err = provider.fetch().await.unwrap_err();
        assert!(matches!(err, IncidentSyncError::CredentialUnavailable { .. }));
    }

    #[tokio::test]
    async fn uncached_provider_reads_every_time() {
        let store = Arc::new(MockSecretStore::new(Some(VALID)));
        let provider = SecretCredentialProvider::new(store.clone(), "itsm-creds");
        provider.fetch().await.unwrap();
        provider.fetch().await.unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_serves_repeat_fetches_within_ttl() {
        let store = Arc::new(MockSecretStore::new(Some(VALID)));
        let provider = CachedCredentialProvider::new(
            SecretCredentialProvider::new(store.clone(), "itsm-creds"),
            Duration::from_secs(60),
        );
        provider.fetch().await.unwrap();
        let creds = provider.fetch().await.unwrap();
        assert_eq!(creds.username, "svc");
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_does_not_remember_failures() {
        let store = Arc::new(MockSecretStore::new(None));
        let provider = CachedCredentialProvider::new(
            SecretCredentialProvider::new(store.clone(), "itsm-creds"),
            Duration::from_secs(60),
        );
        assert!(provider.fetch().await.is_err());
        assert!(provider.fetch().await.is_err());
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let store = Arc::new(MockSecretStore::new(Some(VALID)));
        let provider = CachedCredentialProvider::new(
            SecretCredentialProvider::new(store.clone(), "itsm-creds"),
            Duration::ZERO,
        );
        provider.fetch().await.unwrap();
        provider.fetch().await.unwrap();
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }
}
