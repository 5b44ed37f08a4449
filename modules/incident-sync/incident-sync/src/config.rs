//! Incident sync module configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Incident sync module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncidentSyncConfig {
    /// Identifier of the secret holding `{instance_url, username, password}`.
    pub credentials_secret_id: String,
    /// Environment tag written to mirrored incidents and call logs.
    pub environment: String,
    /// Project tag written to mirrored incidents and call logs.
    pub project_name: String,
    /// Credential cache lifetime in seconds (0 = fetch on every invocation).
    pub credential_cache_ttl_sec: u64,
    /// Upstream request timeout in milliseconds (0 = no client timeout).
    pub request_timeout_ms: u64,
    pub secrets: SecretsConfig,
    pub storage: StorageConfig,
}

impl Default for IncidentSyncConfig {
    fn default() -> Self {
        Self {
            credentials_secret_id: "servicenow-credentials".to_owned(),
            environment: "dev".to_owned(),
            project_name: "incident-sync".to_owned(),
            credential_cache_ttl_sec: 0,
            request_timeout_ms: 0,
            secrets: SecretsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl IncidentSyncConfig {
    #[must_use]
    pub fn credential_cache_ttl(&self) -> Option<Duration> {
        (self.credential_cache_ttl_sec > 0)
            .then(|| Duration::from_secs(self.credential_cache_ttl_sec))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

/// Where ticketing credentials are read from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    pub kind: SecretsKind,
    /// Directory holding one file per secret (`kind: file`).
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretsKind {
    /// Environment variable named after the secret id.
    #[default]
    Env,
    /// File `<dir>/<secret id>`.
    File,
}

/// Local store holding mirrored incidents and call logs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Database DSN (`kind: sqlite`), e.g. `sqlite://incidents.db?mode=rwc`.
    pub dsn: String,
    pub incidents_table: String,
    pub call_logs_table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            dsn: "sqlite::memory:".to_owned(),
            incidents_table: "incidents".to_owned(),
            call_logs_table: "api_logs".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}
