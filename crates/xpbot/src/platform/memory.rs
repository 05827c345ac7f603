//! In-process platform: a set of guilds held in memory.
//!
//! Used by the console binary and by tests. Everything the bot sends or does
//! is recorded so it can be inspected afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use interpreter::MentionKind;
use tokio::sync::Mutex;

use super::{
    ChannelId, ChannelKind, GuildId, Member, Message, MessageId, Platform, Role, RoleId, UserId,
};
use crate::embed::Embed;
use crate::error::{BotError, BotResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmbed {
    pub channel_id: ChannelId,
    pub embed: Embed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedAudio {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
struct GuildState {
    icon_url: Option<String>,
    members: BTreeMap<UserId, Member>,
    roles: BTreeMap<RoleId, Role>,
    voice: BTreeMap<UserId, ChannelId>,
}

#[derive(Debug, Default)]
struct State {
    guilds: BTreeMap<GuildId, GuildState>,
    sent: Vec<SentEmbed>,
    deleted: Vec<MessageId>,
    played: Vec<PlayedAudio>,
    next_message_id: u64,
}

impl State {
    fn guild(&self, guild: GuildId) -> BotResult<&GuildState> {
        self.guilds
            .get(&guild)
            .ok_or_else(|| BotError::NotFound(format!("guild {guild}")))
    }

    fn guild_mut(&mut self, guild: GuildId) -> BotResult<&mut GuildState> {
        self.guilds
            .get_mut(&guild)
            .ok_or_else(|| BotError::NotFound(format!("guild {guild}")))
    }
}

pub struct MemoryPlatform {
    bot_user: UserId,
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new(bot_user: UserId) -> Self {
        Self {
            bot_user,
            state: Mutex::new(State::default()),
        }
    }

    pub async fn add_guild(&self, guild: GuildId, icon_url: Option<String>) {
        let mut state = self.state.lock().await;
        state.guilds.entry(guild).or_default().icon_url = icon_url;
    }

    /// Adds or replaces a member, creating its guild when needed.
    pub async fn add_member(&self, member: Member) {
        let mut state = self.state.lock().await;
        state
            .guilds
            .entry(member.guild_id)
            .or_default()
            .members
            .insert(member.id, member);
    }

    pub async fn add_role(&self, role: Role) {
        let mut state = self.state.lock().await;
        state
            .guilds
            .entry(role.guild_id)
            .or_default()
            .roles
            .insert(role.id, role);
    }

    /// Moves a user into a voice channel, or out of voice with `None`.
    pub async fn set_voice(
        &self,
        guild: GuildId,
        user: UserId,
        channel: Option<ChannelId>,
    ) -> BotResult<()> {
        let mut state = self.state.lock().await;
        let guild = state.guild_mut(guild)?;
        match channel {
            Some(channel) => guild.voice.insert(user, channel),
            None => guild.voice.remove(&user),
        };
        Ok(())
    }

    /// Builds a text-channel message the way the platform delivers it: the
    /// mention lists hold each mentioned member or role once, in order of
    /// first appearance, and skip ids the guild does not know.
    pub async fn compose_message(
        &self,
        guild: GuildId,
        channel: ChannelId,
        author: UserId,
        content: &str,
    ) -> BotResult<Message> {
        let mut state = self.state.lock().await;
        state.next_message_id += 1;
        let id = MessageId(state.next_message_id);
        let guild_state = state.guild(guild)?;
        let author = guild_state
            .members
            .get(&author)
            .cloned()
            .ok_or_else(|| BotError::NotFound(format!("member {author}")))?;

        let (user_ids, role_ids) = mentioned_ids(content);
        let mentions = user_ids
            .into_iter()
            .filter_map(|id| guild_state.members.get(&UserId(id)).cloned())
            .collect();
        let role_mentions = role_ids
            .into_iter()
            .filter_map(|id| guild_state.roles.get(&RoleId(id)).cloned())
            .collect();

        Ok(Message {
            id,
            guild_id: guild,
            channel_id: channel,
            channel_kind: ChannelKind::Text,
            author,
            content: content.to_string(),
            mentions,
            role_mentions,
        })
    }

    pub async fn sent_embeds(&self) -> Vec<SentEmbed> {
        self.state.lock().await.sent.clone()
    }

    /// Returns and forgets everything sent so far.
    pub async fn take_sent(&self) -> Vec<SentEmbed> {
        std::mem::take(&mut self.state.lock().await.sent)
    }

    pub async fn deleted_messages(&self) -> Vec<MessageId> {
        self.state.lock().await.deleted.clone()
    }

    pub async fn played_audio(&self) -> Vec<PlayedAudio> {
        self.state.lock().await.played.clone()
    }

    pub async fn member_roles(&self, guild: GuildId, user: UserId) -> BotResult<Vec<RoleId>> {
        let state = self.state.lock().await;
        state
            .guild(guild)?
            .members
            .get(&user)
            .map(|member| member.roles.clone())
            .ok_or_else(|| BotError::NotFound(format!("member {user}")))
    }
}

/// Distinct user and role ids mentioned in `content`, in order of first appearance.
fn mentioned_ids(content: &str) -> (Vec<u64>, Vec<u64>) {
    let mut users = Vec::new();
    let mut roles = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find("<@") {
        let candidate = &rest[start..];
        let Some(end) = candidate.find('>') else {
            break;
        };
        let mention = &candidate[..=end];
        let digits = mention[2..end].trim_start_matches(['!', '&']);
        match (MentionKind::of(mention), digits.parse::<u64>()) {
            (Some(MentionKind::User), Ok(id)) if !users.contains(&id) => users.push(id),
            (Some(MentionKind::Role), Ok(id)) if !roles.contains(&id) => roles.push(id),
            _ => {}
        }
        rest = &candidate[2..];
    }

    (users, roles)
}

#[async_trait]
impl Platform for MemoryPlatform {
    fn bot_user(&self) -> UserId {
        self.bot_user
    }

    async fn guilds(&self) -> BotResult<Vec<GuildId>> {
        Ok(self.state.lock().await.guilds.keys().copied().collect())
    }

    async fn guild_icon_url(&self, guild: GuildId) -> BotResult<Option<String>> {
        Ok(self.state.lock().await.guild(guild)?.icon_url.clone())
    }

    async fn member(&self, guild: GuildId, user: UserId) -> BotResult<Option<Member>> {
        Ok(self.state.lock().await.guild(guild)?.members.get(&user).cloned())
    }

    async fn members(&self, guild: GuildId) -> BotResult<Vec<Member>> {
        Ok(self
            .state
            .lock()
            .await
            .guild(guild)?
            .members
            .values()
            .cloned()
            .collect())
    }

    async fn role(&self, guild: GuildId, role: RoleId) -> BotResult<Option<Role>> {
        Ok(self.state.lock().await.guild(guild)?.roles.get(&role).cloned())
    }

    async fn fetch_roles(&self, guild: GuildId) -> BotResult<Vec<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .guild(guild)?
            .roles
            .values()
            .cloned()
            .collect())
    }

    async fn add_roles(&self, member: &Member, roles: &[RoleId], reason: &str) -> BotResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .guild_mut(member.guild_id)?
            .members
            .get_mut(&member.id)
            .ok_or_else(|| BotError::NotFound(format!("member {}", member.id)))?;
        for role in roles {
            if !stored.roles.contains(role) {
                stored.roles.push(*role);
            }
        }
        tracing::debug!("added roles {roles:?} to {} ({reason})", member.name);
        Ok(())
    }

    async fn remove_roles(
        &self,
        member: &Member,
        roles: &[RoleId],
        reason: &str,
    ) -> BotResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .guild_mut(member.guild_id)?
            .members
            .get_mut(&member.id)
            .ok_or_else(|| BotError::NotFound(format!("member {}", member.id)))?;
        stored.roles.retain(|role| !roles.contains(role));
        tracing::debug!("removed roles {roles:?} from {} ({reason})", member.name);
        Ok(())
    }

    async fn send_embed(&self, channel: ChannelId, embed: Embed) -> BotResult<()> {
        self.state.lock().await.sent.push(SentEmbed {
            channel_id: channel,
            embed,
        });
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelId, message: MessageId) -> BotResult<()> {
        self.state.lock().await.deleted.push(message);
        Ok(())
    }

    async fn voice_channel_members(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> BotResult<Vec<Member>> {
        let state = self.state.lock().await;
        let guild = state.guild(guild)?;
        Ok(guild
            .voice
            .iter()
            .filter(|(_, joined)| **joined == channel)
            .filter_map(|(user, _)| guild.members.get(user).cloned())
            .collect())
    }

    async fn bot_voice_channel(&self, guild: GuildId) -> BotResult<Option<ChannelId>> {
        Ok(self
            .state
            .lock()
            .await
            .guild(guild)?
            .voice
            .get(&self.bot_user)
            .copied())
    }

    async fn play_audio(&self, guild: GuildId, channel: ChannelId, path: &Path) -> BotResult<()> {
        let mut state = self.state.lock().await;
        state.guild_mut(guild)?.voice.insert(self.bot_user, channel);
        state.played.push(PlayedAudio {
            guild_id: guild,
            channel_id: channel,
            path: path.to_path_buf(),
        });
        Ok(())
    }
}
