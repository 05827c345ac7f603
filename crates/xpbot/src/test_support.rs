//! Fixtures shared by the unit tests.

use std::sync::Arc;

use crate::command::Commands;
use crate::config::BotConfig;
use crate::database::Database;
use crate::platform::memory::MemoryPlatform;
use crate::platform::{ChannelId, GuildId, Member, Message, Role, RoleId, SharedPlatform, UserId};
use crate::storage::memory::MemoryStorage;
use crate::utils::time::ManualClock;
use crate::xp::XpManager;

pub const GUILD: GuildId = GuildId(1);
pub const TEXT: ChannelId = ChannelId(100);
pub const VOICE: ChannelId = ChannelId(200);
pub const BOT: UserId = UserId(999);
pub const GUILD_ICON: &str = "https://cdn.example/guild.png";

pub fn member(id: u64, name: &str) -> Member {
    Member {
        id: UserId(id),
        guild_id: GUILD,
        name: name.to_string(),
        bot: false,
        administrator: false,
        roles: Vec::new(),
        avatar_url: Some(format!("https://cdn.example/{name}.png")),
    }
}

pub fn admin(id: u64, name: &str) -> Member {
    Member {
        administrator: true,
        ..member(id, name)
    }
}

pub fn role(id: u64, name: &str) -> Role {
    Role {
        id: RoleId(id),
        guild_id: GUILD,
        name: name.to_string(),
    }
}

pub struct Harness {
    pub platform: Arc<MemoryPlatform>,
    pub database: Arc<Database>,
    pub clock: Arc<ManualClock>,
    pub config: BotConfig,
}

impl Harness {
    /// One guild containing the bot itself.
    pub async fn new() -> Self {
        let platform = Arc::new(MemoryPlatform::new(BOT));
        platform
            .add_guild(GUILD, Some(GUILD_ICON.to_string()))
            .await;
        platform
            .add_member(Member {
                bot: true,
                ..member(BOT.0, "xpbot")
            })
            .await;
        let config = BotConfig::default();
        Self {
            platform,
            database: Arc::new(Database::new(
                Arc::new(MemoryStorage::new()),
                config.default_prefix.clone(),
            )),
            clock: Arc::new(ManualClock::new(1_000.0)),
            config,
        }
    }

    pub fn shared_platform(&self) -> SharedPlatform {
        self.platform.clone()
    }

    pub fn xp(&self) -> XpManager {
        XpManager::new(
            self.shared_platform(),
            self.database.clone(),
            self.clock.clone(),
            self.config.xp.clone(),
        )
    }

    pub fn commands(&self) -> Commands {
        Commands::new(
            self.shared_platform(),
            self.database.clone(),
            Arc::new(self.xp()),
            self.config.embed_color,
        )
    }

    /// A text message from `author` in the guild's text channel.
    pub async fn say(&self, author: UserId, content: &str) -> Message {
        self.platform
            .compose_message(GUILD, TEXT, author, content)
            .await
            .expect("message")
    }

    pub async fn add(&self, member: Member) -> Member {
        self.platform.add_member(member.clone()).await;
        member
    }

    pub async fn stored_xp(&self, member: &Member) -> f64 {
        self.database
            .member(member.guild_id, member.id)
            .await
            .expect("member record")
            .xp
    }
}
