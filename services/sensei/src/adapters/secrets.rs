//! services/sensei/src/adapters/secrets.rs
//!
//! A file-backed implementation of the `SecretStore` port. Secrets are kept as a
//! flat JSON object next to the service's other local state.

use async_trait::async_trait;
use code_sensei_core::ports::{PortError, PortResult, SecretStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// The single well-known key under which the completion API key is stored.
pub const API_KEY_SECRET: &str = "codesensei_api_key";

/// Stores secrets in a JSON file. Writes are serialized through a mutex so
/// concurrent `set`/`delete` calls cannot interleave their read-modify-write.
pub struct FileSecretStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> PortResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| PortError::Unexpected(format!("Corrupt secret store: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn save(&self, secrets: &BTreeMap<String, String>) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(secrets)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Written owner-only to a sibling file, then moved over the old one.
        let staged = self.path.with_extension("json.tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&staged)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.write_all(raw.as_bytes())
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        drop(file);

        tokio::fs::rename(&staged, &self.path)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.load().await?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets).await
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut secrets = self.load().await?;
        if secrets.remove(key).is_some() {
            self.save(&secrets).await?;
        }
        Ok(())
    }
}
