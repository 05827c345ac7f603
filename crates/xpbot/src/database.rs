//! Per-guild documents on top of [`Storage`].
//!
//! Each guild is one JSON document stored under `["guilds", <id>]`. It is
//! created with defaults the first time it is touched, and so is each member
//! record inside it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{BotError, BotResult};
use crate::platform::{GuildId, RoleId, UserId};
use crate::storage::SharedStorage;

const GUILDS_KEY: &str = "guilds";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildDocument {
    pub guild_id: GuildId,
    pub prefix: String,
    /// Automatic roles keyed by the minimum XP that earns them.
    #[serde(default)]
    pub roles: BTreeMap<u64, RoleId>,
    #[serde(default)]
    pub rickroll_members: Vec<UserId>,
    #[serde(default)]
    pub rickroll_roles: Vec<RoleId>,
    #[serde(default)]
    pub members: BTreeMap<UserId, MemberRecord>,
}

impl GuildDocument {
    pub fn new(guild_id: GuildId, prefix: impl Into<String>) -> Self {
        Self {
            guild_id,
            prefix: prefix.into(),
            roles: BTreeMap::new(),
            rickroll_members: Vec::new(),
            rickroll_roles: Vec::new(),
            members: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Unrounded; voice time earns fractions.
    pub xp: f64,
    pub last_counted_message_time: f64,
    pub last_voice_checkpoint: Option<f64>,
}

/// What a generic `get`/`set` addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Guild(GuildId),
    Member(GuildId, UserId),
}

impl Scope {
    pub fn guild_id(&self) -> GuildId {
        match self {
            Scope::Guild(guild) | Scope::Member(guild, _) => *guild,
        }
    }
}

pub struct Database {
    storage: SharedStorage,
    default_prefix: String,
    // Held across every read-modify-write cycle.
    lock: Mutex<()>,
}

impl Database {
    pub fn new(storage: SharedStorage, default_prefix: impl Into<String>) -> Self {
        Self {
            storage,
            default_prefix: default_prefix.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn guild(&self, guild: GuildId) -> BotResult<GuildDocument> {
        let _guard = self.lock.lock().await;
        self.load(guild).await
    }

    /// Applies `update` to the guild document and stores the result.
    pub async fn update_guild<F, R>(&self, guild: GuildId, update: F) -> BotResult<R>
    where
        F: FnOnce(&mut GuildDocument) -> R + Send,
        R: Send,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.load(guild).await?;
        let result = update(&mut document);
        self.save(&document).await?;
        Ok(result)
    }

    pub async fn member(&self, guild: GuildId, user: UserId) -> BotResult<MemberRecord> {
        let _guard = self.lock.lock().await;
        let mut document = self.load(guild).await?;
        if let Some(record) = document.members.get(&user) {
            return Ok(record.clone());
        }
        let record = MemberRecord::default();
        document.members.insert(user, record.clone());
        self.save(&document).await?;
        Ok(record)
    }

    pub async fn update_member<F, R>(&self, guild: GuildId, user: UserId, update: F) -> BotResult<R>
    where
        F: FnOnce(&mut MemberRecord) -> R + Send,
        R: Send,
    {
        self.update_guild(guild, |document| {
            update(document.members.entry(user).or_default())
        })
        .await
    }

    /// Reads one field of a guild document or member record.
    pub async fn get(&self, scope: Scope, key: &str) -> BotResult<Value> {
        let value = match scope {
            Scope::Guild(guild) => to_json(&self.guild(guild).await?)?,
            Scope::Member(guild, user) => to_json(&self.member(guild, user).await?)?,
        };
        value
            .get(key)
            .cloned()
            .ok_or_else(|| BotError::NotFound(format!("field {key}")))
    }

    /// Replaces one field. The value must fit the document's shape.
    pub async fn set(&self, scope: Scope, key: &str, value: Value) -> BotResult<()> {
        let _guard = self.lock.lock().await;
        let guild = scope.guild_id();
        let mut document = self.load(guild).await?;
        match scope {
            Scope::Guild(_) => {
                document = with_field(&document, key, value)?;
                if document.guild_id != guild {
                    return Err(BotError::InvalidInput(
                        "guild_id cannot be changed".to_string(),
                    ));
                }
            }
            Scope::Member(_, user) => {
                let record = document.members.get(&user).cloned().unwrap_or_default();
                document
                    .members
                    .insert(user, with_field(&record, key, value)?);
            }
        }
        self.save(&document).await
    }

    async fn load(&self, guild: GuildId) -> BotResult<GuildDocument> {
        let id = guild.to_string();
        match self.storage.read(&[GUILDS_KEY, &id]).await? {
            Some(value) => serde_json::from_value(value).map_err(|error| {
                BotError::Internal(format!("failed to parse guild {guild}: {error}"))
            }),
            None => {
                let document = GuildDocument::new(guild, self.default_prefix.as_str());
                self.save(&document).await?;
                tracing::debug!("created document for guild {guild}");
                Ok(document)
            }
        }
    }

    async fn save(&self, document: &GuildDocument) -> BotResult<()> {
        let id = document.guild_id.to_string();
        self.storage
            .write(&[GUILDS_KEY, &id], &to_json(document)?)
            .await
    }
}

fn to_json<T: Serialize>(item: &T) -> BotResult<Value> {
    serde_json::to_value(item)
        .map_err(|error| BotError::Internal(format!("failed to serialize document: {error}")))
}

fn with_field<T: Serialize + DeserializeOwned>(item: &T, key: &str, value: Value) -> BotResult<T> {
    let mut json = to_json(item)?;
    let Some(fields) = json.as_object_mut() else {
        return Err(BotError::Internal("document is not an object".to_string()));
    };
    if !fields.contains_key(key) {
        return Err(BotError::InvalidInput(format!("unknown field {key}")));
    }
    fields.insert(key.to_string(), value);
    serde_json::from_value(json)
        .map_err(|error| BotError::InvalidInput(format!("invalid value for {key}: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::FileStorage;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::Storage;
    use serde_json::json;
    use std::sync::Arc;

    const GUILD: GuildId = GuildId(10);
    const USER: UserId = UserId(20);

    fn database() -> Database {
        Database::new(Arc::new(MemoryStorage::new()), "!")
    }

    #[tokio::test]
    async fn guild_is_created_on_first_access() {
        let storage = Arc::new(MemoryStorage::new());
        let database = Database::new(storage.clone(), "?");
        let document = database.guild(GUILD).await.expect("guild");
        assert_eq!(document, GuildDocument::new(GUILD, "?"));
        assert!(storage.read(&["guilds", "10"]).await.expect("read").is_some());
    }

    #[tokio::test]
    async fn member_records_start_at_zero() {
        let database = database();
        let record = database.member(GUILD, USER).await.expect("member");
        assert_eq!(record, MemberRecord::default());
        assert_eq!(record.last_voice_checkpoint, None);
        assert!(database
            .guild(GUILD)
            .await
            .expect("guild")
            .members
            .contains_key(&USER));
    }

    #[tokio::test]
    async fn scoped_get_and_set() {
        let database = database();
        database
            .set(Scope::Guild(GUILD), "prefix", json!("$"))
            .await
            .expect("set prefix");
        database
            .set(Scope::Member(GUILD, USER), "xp", json!(12.5))
            .await
            .expect("set xp");

        assert_eq!(
            database.get(Scope::Guild(GUILD), "prefix").await.expect("get"),
            json!("$")
        );
        assert_eq!(
            database
                .get(Scope::Member(GUILD, USER), "xp")
                .await
                .expect("get"),
            json!(12.5)
        );
        assert_eq!(database.member(GUILD, USER).await.expect("member").xp, 12.5);
    }

    #[tokio::test]
    async fn set_rejects_unknown_fields_and_bad_shapes() {
        let database = database();
        let err = database
            .set(Scope::Guild(GUILD), "colour", json!(1))
            .await
            .expect_err("unknown field");
        assert!(matches!(err, BotError::InvalidInput(_)));

        let err = database
            .set(Scope::Member(GUILD, USER), "xp", json!("lots"))
            .await
            .expect_err("bad shape");
        assert!(matches!(err, BotError::InvalidInput(_)));

        let err = database
            .set(Scope::Guild(GUILD), "guild_id", json!(99))
            .await
            .expect_err("guild id");
        assert!(matches!(err, BotError::InvalidInput(_)));

        let err = database
            .get(Scope::Guild(GUILD), "colour")
            .await
            .expect_err("missing");
        assert!(matches!(err, BotError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let database = Arc::new(database());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let database = database.clone();
            handles.push(tokio::spawn(async move {
                database
                    .update_member(GUILD, USER, |record| record.xp += 1.0)
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("update");
        }
        assert_eq!(database.member(GUILD, USER).await.expect("member").xp, 20.0);
    }

    #[tokio::test]
    async fn documents_survive_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Arc::new(FileStorage::new(dir.path().to_path_buf()));
        let database = Database::new(storage.clone(), "!");
        database
            .update_guild(GUILD, |document| {
                document.roles.insert(100, RoleId(7));
                document.rickroll_members.push(USER);
            })
            .await
            .expect("update");

        let reopened = Database::new(storage, "!");
        let document = reopened.guild(GUILD).await.expect("guild");
        assert_eq!(document.roles.get(&100), Some(&RoleId(7)));
        assert_eq!(document.rickroll_members, vec![USER]);
    }
}
