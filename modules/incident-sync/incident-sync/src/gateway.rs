//! Gateway assembly from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{IncidentSyncConfig, SecretsKind, StorageKind};
use crate::domain::credentials::{
    CachedCredentialProvider, CredentialProvider, SecretCredentialProvider,
};
use crate::domain::mirror::IncidentMirror;
use crate::domain::ports::{SecretStore, UpstreamTransport};
use crate::domain::repo::{CallLogStore, IncidentStore};
use crate::domain::router::IncidentRouter;
use crate::domain::service::IncidentService;
use crate::domain::telemetry::CallTelemetry;
use crate::infra::secrets::{EnvSecretStore, FileSecretStore};
use crate::infra::storage::{InMemoryStore, SqlStore};
use crate::infra::transport::HttpTransport;

/// Adapters the gateway is assembled from.
#[derive(Clone)]
pub struct GatewayPorts {
    pub secrets: Arc<dyn SecretStore>,
    pub transport: Arc<dyn UpstreamTransport>,
    pub incidents: Arc<dyn IncidentStore>,
    pub call_logs: Arc<dyn CallLogStore>,
}

/// Wire the router over the given adapters.
#[must_use]
pub fn assemble(cfg: &IncidentSyncConfig, ports: GatewayPorts) -> Arc<IncidentRouter> {
    let direct = SecretCredentialProvider::new(ports.secrets, cfg.credentials_secret_id.clone());
    let credentials: Arc<dyn CredentialProvider> = match cfg.credential_cache_ttl() {
        Some(ttl) => Arc::new(CachedCredentialProvider::new(direct, ttl)),
        None => Arc::new(direct),
    };

    let telemetry = CallTelemetry::new(
        ports.call_logs,
        cfg.environment.clone(),
        cfg.project_name.clone(),
    );
    let mirror = IncidentMirror::new(
        ports.incidents,
        cfg.environment.clone(),
        cfg.project_name.clone(),
    );
    let service = Arc::new(IncidentService::new(ports.transport, telemetry, mirror));

    Arc::new(IncidentRouter::new(credentials, service))
}

/// Build the gateway with the adapters selected by `cfg`.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built, the file secret store
/// has no directory, or the local database cannot be opened.
pub async fn build_gateway(cfg: &IncidentSyncConfig) -> anyhow::Result<Arc<IncidentRouter>> {
    let secrets: Arc<dyn SecretStore> = match cfg.secrets.kind {
        SecretsKind::Env => Arc::new(EnvSecretStore),
        SecretsKind::File => {
            let dir = cfg
                .secrets
                .dir
                .as_ref()
                .context("secrets.dir is required when secrets.kind is `file`")?;
            Arc::new(FileSecretStore::new(dir))
        }
    };

    let transport: Arc<dyn UpstreamTransport> = Arc::new(HttpTransport::new(cfg.request_timeout())?);

    let (incidents, call_logs): (Arc<dyn IncidentStore>, Arc<dyn CallLogStore>) =
        match cfg.storage.kind {
            StorageKind::Memory => {
                let store = Arc::new(InMemoryStore::new());
                (store.clone(), store)
            }
            StorageKind::Sqlite => {
                let store = Arc::new(
                    SqlStore::connect(
                        &cfg.storage.dsn,
                        cfg.storage.incidents_table.clone(),
                        cfg.storage.call_logs_table.clone(),
                    )
                    .await?,
                );
                (store.clone(), store)
            }
        };

    info!(
        environment = %cfg.environment,
        project_name = %cfg.project_name,
        secrets = ?cfg.secrets.kind,
        storage = ?cfg.storage.kind,
        credential_cache = cfg.credential_cache_ttl().is_some(),
        "Incident sync gateway assembled"
    );

    Ok(assemble(
        cfg,
        GatewayPorts {
            secrets,
            transport,
            incidents,
            call_logs,
        },
    ))
}
