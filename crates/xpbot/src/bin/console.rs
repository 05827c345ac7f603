//! Runs the bot against an in-memory guild, reading messages from stdin.
//!
//! Every line is sent as a message by the console user. `/join <channel>` and
//! `/leave` change the console user's voice state, `/quit` exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing_subscriber::EnvFilter;

use xpbot::platform::memory::MemoryPlatform;
use xpbot::platform::{ChannelId, GuildId, Member, Role, RoleId, UserId, VoiceState};
use xpbot::storage::file::FileStorage;
use xpbot::utils::time::SystemClock;
use xpbot::{load_or_create_config, Bot, Platform};

const TEXT_CHANNEL: ChannelId = ChannelId(1);
const BOT_USER: UserId = UserId(0);

#[derive(Parser, Debug)]
#[command(name = "xpbot-console", version, about = "Talk to the XP bot from a terminal")]
struct Args {
    /// Directory holding config.json and the guild documents.
    #[arg(long, env = "XPBOT_DATA_DIR", default_value = "./xpbot-data")]
    data_dir: PathBuf,

    #[arg(long, env = "XPBOT_GUILD", default_value_t = 1)]
    guild: u64,

    /// The console user, as ID:NAME.
    #[arg(long, default_value = "1:console", value_parser = parse_seed)]
    user: (u64, String),

    /// Run as a member without the administrator permission.
    #[arg(long)]
    no_admin: bool,

    /// Extra guild members, as ID:NAME. Repeatable.
    #[arg(long = "member", value_parser = parse_seed)]
    members: Vec<(u64, String)>,

    /// Guild roles, as ID:NAME. Repeatable.
    #[arg(long = "role", value_parser = parse_seed)]
    roles: Vec<(u64, String)>,
}

fn parse_seed(text: &str) -> Result<(u64, String), String> {
    let (id, name) = text
        .split_once(':')
        .ok_or_else(|| format!("expected ID:NAME, got {text}"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|error| format!("invalid id {id}: {error}"))?;
    Ok((id, name.trim().to_string()))
}

fn seed_member(guild: GuildId, id: u64, name: &str, administrator: bool) -> Member {
    Member {
        id: UserId(id),
        guild_id: guild,
        name: name.to_string(),
        bot: false,
        administrator,
        roles: Vec::new(),
        avatar_url: None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = load_or_create_config(&args.data_dir)
        .with_context(|| format!("loading config from {}", args.data_dir.display()))?;
    let guild = GuildId(args.guild);
    let platform = Arc::new(MemoryPlatform::new(BOT_USER));
    platform.add_guild(guild, None).await;
    platform
        .add_member(Member {
            bot: true,
            ..seed_member(guild, BOT_USER.0, "xpbot", false)
        })
        .await;
    let (user_id, user_name) = &args.user;
    platform
        .add_member(seed_member(guild, *user_id, user_name, !args.no_admin))
        .await;
    for (id, name) in &args.members {
        platform.add_member(seed_member(guild, *id, name, false)).await;
    }
    for (id, name) in &args.roles {
        platform
            .add_role(Role {
                id: RoleId(*id),
                guild_id: guild,
                name: name.clone(),
            })
            .await;
    }

    let storage = Arc::new(FileStorage::new(args.data_dir.clone()));
    let bot = Bot::new(platform.clone(), storage, &config, Arc::new(SystemClock));
    bot.on_connect().await.context("connecting")?;
    tracing::info!(
        "talking as {user_name} in guild {guild}, prefix {:?}",
        bot.database().guild(guild).await?.prefix
    );

    let user = UserId(*user_id);
    let mut voice = VoiceState::default();
    let mut played = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let result = match voice_command(line) {
            Some(channel) => {
                let member = platform
                    .member(guild, user)
                    .await?
                    .ok_or_else(|| anyhow!("console user left the guild"))?;
                platform.set_voice(guild, user, channel).await?;
                let after = VoiceState {
                    channel_id: channel,
                    ..VoiceState::default()
                };
                let before = std::mem::replace(&mut voice, after);
                bot.on_voice_state_update(&member, &before, &after).await
            }
            None => {
                let message = platform
                    .compose_message(guild, TEXT_CHANNEL, user, line)
                    .await?;
                bot.on_message(&message).await
            }
        };
        if let Err(error) = result {
            tracing::warn!("event failed: {error}");
        }

        for sent in platform.take_sent().await {
            println!("{}\n", sent.embed);
        }
        let audio = platform.played_audio().await;
        for playing in audio.iter().skip(played) {
            println!(
                "♪ playing {} in channel {}\n",
                playing.path.display(),
                playing.channel_id
            );
        }
        played = audio.len();
    }
    Ok(())
}

/// `Some(channel)` for `/join <id>`, `Some(None)` for `/leave`.
fn voice_command(line: &str) -> Option<Option<ChannelId>> {
    if line == "/leave" {
        return Some(None);
    }
    let channel = line.strip_prefix("/join ")?.trim().parse().ok()?;
    Some(Some(ChannelId(channel)))
}
