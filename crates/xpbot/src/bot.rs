//! Platform event entry points.

use std::sync::Arc;

use crate::command::Commands;
use crate::config::BotConfig;
use crate::database::Database;
use crate::error::BotResult;
use crate::platform::{ChannelKind, Member, Message, SharedPlatform, VoiceState};
use crate::rickroll::Rickroll;
use crate::storage::SharedStorage;
use crate::utils::time::Clock;
use crate::xp::XpManager;

pub struct Bot {
    platform: SharedPlatform,
    database: Arc<Database>,
    xp: Arc<XpManager>,
    rickroll: Rickroll,
    commands: Commands,
}

impl Bot {
    pub fn new(
        platform: SharedPlatform,
        storage: SharedStorage,
        config: &BotConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let database = Arc::new(Database::new(storage, config.default_prefix.clone()));
        let xp = Arc::new(XpManager::new(
            platform.clone(),
            database.clone(),
            clock,
            config.xp.clone(),
        ));
        let rickroll = Rickroll::new(
            platform.clone(),
            database.clone(),
            config.rickroll.audio_path.clone(),
        );
        let commands = Commands::new(
            platform.clone(),
            database.clone(),
            xp.clone(),
            config.embed_color,
        );
        Self {
            platform,
            database,
            xp,
            rickroll,
            commands,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Voice time from before the connection is never paid out.
    pub async fn on_connect(&self) -> BotResult<()> {
        let guilds = self.platform.guilds().await?;
        tracing::info!("connected to {} guilds", guilds.len());
        self.xp.reset_voice_checkpoints(&guilds).await
    }

    pub async fn on_message(&self, message: &Message) -> BotResult<()> {
        if message.author.id == self.platform.bot_user() {
            return Ok(());
        }
        if message.channel_kind != ChannelKind::Text {
            tracing::trace!("ignoring message outside a text channel");
            return Ok(());
        }
        self.xp.message_xp(message).await?;
        self.commands.run(message).await
    }

    pub async fn on_voice_state_update(
        &self,
        member: &Member,
        before: &VoiceState,
        after: &VoiceState,
    ) -> BotResult<()> {
        self.xp.voice_xp(member, before, after).await?;
        self.rickroll.run(member, before, after).await?;
        Ok(())
    }

    /// Roles changed by hand are brought back in line with the member's XP.
    pub async fn on_member_update(&self, member: &Member) -> BotResult<()> {
        self.xp.update(member).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ChannelKind, Platform, RoleId, UserId};
    use crate::storage::memory::MemoryStorage;
    use crate::test_support::{admin, member, role, Harness, BOT, GUILD, VOICE};

    async fn bot(harness: &Harness) -> Bot {
        Bot::new(
            harness.shared_platform(),
            Arc::new(MemoryStorage::new()),
            &harness.config,
            harness.clock.clone(),
        )
    }

    #[tokio::test]
    async fn messages_earn_xp_and_run_commands() {
        let harness = Harness::new().await;
        let bot = bot(&harness).await;
        harness.add(member(2, "bob")).await;

        let message = harness.say(UserId(2), "!stats").await;
        bot.on_message(&message).await.expect("message");

        let sent = harness.platform.take_sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].embed.field("XP").expect("xp").value, "1");
        let record = bot.database().member(GUILD, UserId(2)).await.expect("record");
        assert_eq!(record.xp, 1.0);
        assert_eq!(record.last_counted_message_time, 1_000.0);
    }

    #[tokio::test]
    async fn own_and_non_text_messages_are_ignored() {
        let harness = Harness::new().await;
        let bot = bot(&harness).await;
        harness.add(member(2, "bob")).await;

        let own = harness.say(BOT, "!stats").await;
        bot.on_message(&own).await.expect("own");

        let mut thread = harness.say(UserId(2), "!stats").await;
        thread.channel_kind = ChannelKind::Thread;
        bot.on_message(&thread).await.expect("thread");

        assert!(harness.platform.sent_embeds().await.is_empty());
        assert!(harness.platform.deleted_messages().await.is_empty());
        let record = bot.database().member(GUILD, UserId(2)).await.expect("record");
        assert_eq!(record.xp, 0.0);
    }

    #[tokio::test]
    async fn joining_voice_checkpoints_and_rickrolls() {
        let harness = Harness::new().await;
        let bot = bot(&harness).await;
        let alice = harness.add(member(1, "alice")).await;
        harness.add(member(2, "bob")).await;
        bot.database()
            .update_guild(GUILD, |document| document.rickroll_members.push(alice.id))
            .await
            .expect("target");
        for user in [1, 2] {
            harness
                .platform
                .set_voice(GUILD, UserId(user), Some(VOICE))
                .await
                .expect("join");
        }

        bot.on_voice_state_update(&alice, &VoiceState::default(), &VoiceState::in_channel(VOICE))
            .await
            .expect("voice");

        let record = bot.database().member(GUILD, alice.id).await.expect("record");
        assert_eq!(record.last_voice_checkpoint, Some(1_000.0));
        assert_eq!(harness.platform.played_audio().await.len(), 1);
        assert_eq!(
            harness.platform.bot_voice_channel(GUILD).await.expect("voice"),
            Some(VOICE)
        );
    }

    #[tokio::test]
    async fn connect_resets_checkpoints() {
        let harness = Harness::new().await;
        let bot = bot(&harness).await;
        let alice = harness.add(admin(1, "alice")).await;
        bot.database()
            .update_member(GUILD, alice.id, |record| {
                record.last_voice_checkpoint = Some(1.0)
            })
            .await
            .expect("checkpoint");

        bot.on_connect().await.expect("connect");
        let record = bot.database().member(GUILD, alice.id).await.expect("record");
        assert_eq!(record.last_voice_checkpoint, None);
    }

    #[tokio::test]
    async fn member_updates_restore_automatic_roles() {
        let harness = Harness::new().await;
        let bot = bot(&harness).await;
        harness.platform.add_role(role(5, "novice")).await;
        let alice = harness.add(member(1, "alice")).await;
        bot.database()
            .update_guild(GUILD, |document| {
                document.roles.insert(0, RoleId(5));
            })
            .await
            .expect("roles");

        bot.on_member_update(&alice).await.expect("update");
        assert_eq!(
            harness.platform.member_roles(GUILD, alice.id).await.expect("roles"),
            vec![RoleId(5)]
        );
    }
}
