pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::BotResult;

/// JSON documents addressed by key paths such as `["guilds", "42"]`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn write(&self, keys: &[&str], data: &Value) -> BotResult<()>;
    async fn read(&self, keys: &[&str]) -> BotResult<Option<Value>>;
    /// Names of the documents stored directly under `keys`, sorted.
    async fn list(&self, keys: &[&str]) -> BotResult<Vec<String>>;
}

pub type SharedStorage = Arc<dyn Storage>;
