use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{BotError, BotResult};
use crate::storage::Storage;

/// Documents kept in a map keyed by their full key path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<Vec<String>, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned(keys: &[&str]) -> BotResult<Vec<String>> {
    if keys.is_empty() {
        return Err(BotError::InvalidInput("storage keys empty".to_string()));
    }
    Ok(keys.iter().map(|key| key.to_string()).collect())
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn write(&self, keys: &[&str], data: &Value) -> BotResult<()> {
        let path = owned(keys)?;
        self.documents.write().await.insert(path, data.clone());
        Ok(())
    }

    async fn read(&self, keys: &[&str]) -> BotResult<Option<Value>> {
        let path = owned(keys)?;
        Ok(self.documents.read().await.get(&path).cloned())
    }

    async fn list(&self, keys: &[&str]) -> BotResult<Vec<String>> {
        let documents = self.documents.read().await;
        Ok(documents
            .keys()
            .filter(|path| path.len() == keys.len() + 1 && path.iter().zip(keys).all(|(a, b)| a == b))
            .filter_map(|path| path.last().cloned())
            .collect())
    }
}
