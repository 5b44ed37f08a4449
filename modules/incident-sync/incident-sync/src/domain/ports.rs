//! Output ports (interfaces) for domain services.

use async_trait::async_trait;
use incident_sync_sdk::{Credentials, IncidentSyncError, UpstreamRequest, UpstreamResponse};

/// Port for reading raw secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the raw secret string stored under `secret_id`.
    async fn get_secret(&self, secret_id: &str) -> anyhow::Result<String>;
}

/// Port for calling the ticketing service.
///
/// HTTP error statuses are ordinary responses; only connection-level failures
/// are reported as [`IncidentSyncError::Transport`].
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn send(
        &self,
        credentials: &Credentials,
        req: UpstreamRequest,
    ) -> Result<UpstreamResponse, IncidentSyncError>;
}
