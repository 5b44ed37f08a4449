//! Secret store adapters.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;

use crate::domain::ports::SecretStore;

/// Reads a secret from the environment variable named after its id.
///
/// `servicenow-credentials` is read from `SERVICENOW_CREDENTIALS`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    #[must_use]
    pub fn var_name(secret_id: &str) -> String {
        secret_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, secret_id: &str) -> anyhow::Result<String> {
        let var = Self::var_name(secret_id);
        std::env::var(&var).with_context(|| format!("secret {secret_id} not set (env {var})"))
    }
}

/// Reads a secret from `<dir>/<secret_id>`.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, secret_id: &str) -> anyhow::Result<String> {
        if secret_id.is_empty() || secret_id.contains(['/', '\\']) || secret_id.contains("..") {
            anyhow::bail!("invalid secret id: {secret_id}");
        }

        let path = self.dir.join(secret_id);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read secret {secret_id} from {}", path.display()))
    }
}
