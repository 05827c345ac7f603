//! The narrow slice of the chat platform the bot talks to.

pub mod memory;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embed::Embed;
use crate::error::BotResult;

macro_rules! snowflake {
    ($($(#[$meta:meta])* $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

snowflake! {
    GuildId;
    UserId;
    RoleId;
    ChannelId;
    MessageId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    pub guild_id: GuildId,
    pub name: String,
    pub bot: bool,
    /// Holds the guild's administrator permission.
    pub administrator: bool,
    pub roles: Vec<RoleId>,
    pub avatar_url: Option<String>,
}

impl Member {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub guild_id: GuildId,
    pub name: String,
}

impl Role {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Thread,
}

/// A guild message with the mention lists the platform already resolved, in
/// order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub channel_kind: ChannelKind,
    pub author: Member,
    pub content: String,
    pub mentions: Vec<Member>,
    pub role_mentions: Vec<Role>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceState {
    pub channel_id: Option<ChannelId>,
    pub afk: bool,
    pub deaf: bool,
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub self_video: bool,
}

impl VoiceState {
    pub fn in_channel(channel_id: ChannelId) -> Self {
        Self {
            channel_id: Some(channel_id),
            ..Self::default()
        }
    }

    /// Muted or deafened by anyone, or parked in the AFK channel.
    pub fn is_idle(&self) -> bool {
        self.afk || self.deaf || self.mute || self.self_deaf || self.self_mute
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own account.
    fn bot_user(&self) -> UserId;

    async fn guilds(&self) -> BotResult<Vec<GuildId>>;
    async fn guild_icon_url(&self, guild: GuildId) -> BotResult<Option<String>>;

    async fn member(&self, guild: GuildId, user: UserId) -> BotResult<Option<Member>>;
    async fn members(&self, guild: GuildId) -> BotResult<Vec<Member>>;

    async fn role(&self, guild: GuildId, role: RoleId) -> BotResult<Option<Role>>;
    /// Fetches the guild's roles from the platform rather than a cache.
    async fn fetch_roles(&self, guild: GuildId) -> BotResult<Vec<Role>>;
    async fn add_roles(&self, member: &Member, roles: &[RoleId], reason: &str) -> BotResult<()>;
    async fn remove_roles(&self, member: &Member, roles: &[RoleId], reason: &str)
        -> BotResult<()>;

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> BotResult<()>;
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> BotResult<()>;

    async fn voice_channel_members(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> BotResult<Vec<Member>>;
    /// The voice channel the bot is connected to in `guild`, if any.
    async fn bot_voice_channel(&self, guild: GuildId) -> BotResult<Option<ChannelId>>;
    /// Connects to `channel` and starts playing the audio file.
    async fn play_audio(&self, guild: GuildId, channel: ChannelId, path: &Path) -> BotResult<()>;
}

pub type SharedPlatform = Arc<dyn Platform>;
