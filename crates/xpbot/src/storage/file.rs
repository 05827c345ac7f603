use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{BotError, BotResult};
use crate::storage::Storage;

/// One pretty-printed JSON file per key path under `root`.
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn build_dir(&self, keys: &[&str]) -> BotResult<PathBuf> {
        let mut path = self.root.clone();
        for key in keys {
            validate_key(key)?;
            path.push(key);
        }
        Ok(path)
    }

    fn build_path(&self, keys: &[&str]) -> BotResult<PathBuf> {
        let Some((last, parents)) = keys.split_last() else {
            return Err(BotError::InvalidInput("storage keys empty".to_string()));
        };
        let mut path = self.build_dir(parents)?;
        validate_key(last)?;
        path.push(format!("{last}.json"));
        Ok(path)
    }

    async fn ensure_parent_dir(path: &Path) -> BotResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                BotError::Internal(format!(
                    "failed to create storage directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> BotResult<()> {
        let path = self.build_path(keys)?;
        Self::ensure_parent_dir(&path).await?;
        let serialized = serde_json::to_vec_pretty(data)
            .map_err(|error| BotError::Internal(format!("storage serialize error: {error}")))?;
        tokio::fs::write(&path, serialized).await.map_err(|error| {
            BotError::Internal(format!(
                "failed to write storage file {}: {error}",
                path.display()
            ))
        })?;
        tracing::trace!("wrote {}", path.display());
        Ok(())
    }

    async fn read(&self, keys: &[&str]) -> BotResult<Option<Value>> {
        let path = self.build_path(keys)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(BotError::Internal(format!(
                    "failed to read storage file {}: {error}",
                    path.display()
                )))
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|error| {
            BotError::Internal(format!(
                "storage parse error in {}: {error}",
                path.display()
            ))
        })?;
        Ok(Some(value))
    }

    async fn list(&self, keys: &[&str]) -> BotResult<Vec<String>> {
        let dir = self.build_dir(keys)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(BotError::Internal(format!(
                    "failed to list storage directory {}: {error}",
                    dir.display()
                )))
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|error| {
                BotError::Internal(format!(
                    "failed to list storage directory {}: {error}",
                    dir.display()
                ))
            })?;
            let Some(entry) = entry else { break };
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_str().and_then(|name| name.strip_suffix(".json")) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate_key(key: &str) -> BotResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(BotError::InvalidInput(format!("invalid storage key {key}")));
    }
    Ok(())
}
