use std::path::PathBuf;
use std::sync::Arc;

use crate::database::Database;
use crate::error::BotResult;
use crate::platform::{Member, SharedPlatform, VoiceState};

/// Plays a song to listed members the moment they join voice.
pub struct Rickroll {
    platform: SharedPlatform,
    database: Arc<Database>,
    audio_path: PathBuf,
}

impl Rickroll {
    pub fn new(platform: SharedPlatform, database: Arc<Database>, audio_path: PathBuf) -> Self {
        Self {
            platform,
            database,
            audio_path,
        }
    }

    /// Listed by id, or holding a listed role.
    pub async fn is_target(&self, member: &Member) -> BotResult<bool> {
        let document = self.database.guild(member.guild_id).await?;
        Ok(document.rickroll_members.contains(&member.id)
            || member
                .roles
                .iter()
                .any(|role| document.rickroll_roles.contains(role)))
    }

    /// Returns whether playback started.
    pub async fn run(
        &self,
        member: &Member,
        before: &VoiceState,
        after: &VoiceState,
    ) -> BotResult<bool> {
        let (None, Some(channel)) = (before.channel_id, after.channel_id) else {
            return Ok(false);
        };
        if !self.is_target(member).await? {
            return Ok(false);
        }
        if self
            .platform
            .bot_voice_channel(member.guild_id)
            .await?
            .is_some()
        {
            tracing::debug!("already in voice, not rickrolling {}", member.name);
            return Ok(false);
        }

        tracing::info!("rickrolling {} in channel {channel}", member.name);
        self.platform
            .play_audio(member.guild_id, channel, &self.audio_path)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ChannelId, RoleId};
    use crate::test_support::{member, Harness, GUILD, VOICE};

    fn rickroll(harness: &Harness) -> Rickroll {
        Rickroll::new(
            harness.shared_platform(),
            harness.database.clone(),
            PathBuf::from("song.mp3"),
        )
    }

    #[tokio::test]
    async fn targets_by_id_or_role() {
        let harness = Harness::new().await;
        let rickroll = rickroll(&harness);
        let alice = member(1, "alice");
        let bob = Member {
            roles: vec![RoleId(5)],
            ..member(2, "bob")
        };
        let carol = member(3, "carol");
        harness
            .database
            .update_guild(GUILD, |document| {
                document.rickroll_members.push(alice.id);
                document.rickroll_roles.push(RoleId(5));
            })
            .await
            .expect("targets");

        assert!(rickroll.is_target(&alice).await.expect("alice"));
        assert!(rickroll.is_target(&bob).await.expect("bob"));
        assert!(!rickroll.is_target(&carol).await.expect("carol"));
    }

    #[tokio::test]
    async fn plays_when_a_target_joins_voice() {
        let harness = Harness::new().await;
        let rickroll = rickroll(&harness);
        let alice = harness.add(member(1, "alice")).await;
        harness
            .database
            .update_guild(GUILD, |document| document.rickroll_members.push(alice.id))
            .await
            .expect("targets");

        // Moving between channels does not count as joining.
        let moved = rickroll
            .run(
                &alice,
                &VoiceState::in_channel(ChannelId(7)),
                &VoiceState::in_channel(VOICE),
            )
            .await
            .expect("move");
        assert!(!moved);

        let joined = rickroll
            .run(&alice, &VoiceState::default(), &VoiceState::in_channel(VOICE))
            .await
            .expect("join");
        assert!(joined);
        let played = harness.platform.played_audio().await;
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].channel_id, VOICE);
        assert_eq!(played[0].path, PathBuf::from("song.mp3"));

        // The bot is now connected, so a second join is left alone.
        let again = rickroll
            .run(&alice, &VoiceState::default(), &VoiceState::in_channel(VOICE))
            .await
            .expect("join again");
        assert!(!again);
    }
}
