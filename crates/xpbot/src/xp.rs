//! Experience points and the automatic roles they unlock.

use std::sync::Arc;

use crate::config::XpPreferences;
use crate::database::Database;
use crate::error::BotResult;
use crate::platform::{GuildId, Member, Message, Role, SharedPlatform, VoiceState};
use crate::utils::time::Clock;

/// Seconds of voice time per XP point.
const VOICE_SECS_PER_XP: f64 = 60.0;

pub struct XpManager {
    platform: SharedPlatform,
    database: Arc<Database>,
    clock: Arc<dyn Clock>,
    preferences: XpPreferences,
}

/// Stored XP as shown to users: rounded half to even.
pub fn display_xp(xp: f64) -> i64 {
    xp.round_ties_even() as i64
}

impl XpManager {
    pub fn new(
        platform: SharedPlatform,
        database: Arc<Database>,
        clock: Arc<dyn Clock>,
        preferences: XpPreferences,
    ) -> Self {
        Self {
            platform,
            database,
            clock,
            preferences,
        }
    }

    pub async fn calculate_xp(&self, member: &Member) -> BotResult<i64> {
        let record = self.database.member(member.guild_id, member.id).await?;
        Ok(display_xp(record.xp))
    }

    /// Adds `amount` to the stored XP and returns the new total.
    pub async fn add_xp(&self, member: &Member, amount: f64) -> BotResult<f64> {
        self.database
            .update_member(member.guild_id, member.id, |record| {
                record.xp += amount;
                record.xp
            })
            .await
    }

    /// Replaces the stored XP and returns the previous value.
    pub async fn set_xp(&self, member: &Member, xp: f64) -> BotResult<f64> {
        self.database
            .update_member(member.guild_id, member.id, |record| {
                std::mem::replace(&mut record.xp, xp)
            })
            .await
    }

    /// Adds a whole amount to the integer part of the stored XP, dropping
    /// the fraction. Returns the previous and new values, or `None` when the
    /// result would be negative and nothing was changed.
    pub async fn adjust_xp(&self, member: &Member, amount: f64) -> BotResult<Option<(f64, f64)>> {
        self.database
            .update_member(member.guild_id, member.id, |record| {
                let updated = record.xp.trunc() + amount;
                if updated < 0.0 {
                    return None;
                }
                Some((std::mem::replace(&mut record.xp, updated), updated))
            })
            .await
    }

    /// Automatic roles by threshold, skipping roles the guild no longer has.
    pub async fn thresholds(&self, guild: GuildId) -> BotResult<Vec<(u64, Role)>> {
        let document = self.database.guild(guild).await?;
        let mut thresholds = Vec::with_capacity(document.roles.len());
        for (min_xp, role_id) in document.roles {
            match self.platform.role(guild, role_id).await? {
                Some(role) => thresholds.push((min_xp, role)),
                None => tracing::debug!("automatic role {role_id} in guild {guild} is gone"),
            }
        }
        Ok(thresholds)
    }

    /// Gives the member the role of the highest threshold it reached and
    /// takes away the other automatic roles.
    pub async fn update(&self, member: &Member) -> BotResult<()> {
        let thresholds = self.thresholds(member.guild_id).await?;
        let xp = self.calculate_xp(member).await?;
        let reached = thresholds
            .iter()
            .filter(|(min_xp, _)| i64::try_from(*min_xp).is_ok_and(|min_xp| min_xp <= xp))
            .max_by_key(|(min_xp, _)| *min_xp);
        let Some((_, current)) = reached else {
            return Ok(());
        };

        let to_remove: Vec<_> = member
            .roles
            .iter()
            .copied()
            .filter(|held| *held != current.id)
            .filter(|held| thresholds.iter().any(|(_, role)| role.id == *held))
            .collect();
        let reason = self.preferences.role_reason.as_str();
        if !to_remove.is_empty() {
            self.platform.remove_roles(member, &to_remove, reason).await?;
        }
        self.platform.add_roles(member, &[current.id], reason).await?;
        tracing::debug!("{} has {xp} xp, automatic role {}", member.name, current.name);
        Ok(())
    }

    pub async fn update_all(&self, guild: GuildId) -> BotResult<()> {
        for member in self.platform.members(guild).await? {
            self.update(&member).await?;
        }
        Ok(())
    }

    /// One point per message, at most once per cooldown.
    pub async fn message_xp(&self, message: &Message) -> BotResult<()> {
        let author = &message.author;
        let now = self.clock.now();
        let cooldown = self.preferences.message_cooldown_secs;
        let counted = self
            .database
            .update_member(author.guild_id, author.id, |record| {
                if now - record.last_counted_message_time >= cooldown {
                    record.last_counted_message_time = now;
                    record.xp += 1.0;
                    true
                } else {
                    false
                }
            })
            .await?;
        if counted {
            self.update(author).await?;
        }
        Ok(())
    }

    /// Pays out the time since the last checkpoint, then starts a new one if
    /// the member is now actively talking with enough other people.
    pub async fn voice_xp(
        &self,
        member: &Member,
        before: &VoiceState,
        after: &VoiceState,
    ) -> BotResult<()> {
        let now = self.clock.now();
        let multiplier = if before.self_video {
            self.preferences.video_multiplier
        } else {
            1.0
        };
        let paid = self
            .database
            .update_member(member.guild_id, member.id, |record| {
                let checkpoint = record.last_voice_checkpoint.take()?;
                let earned = (now - checkpoint) * multiplier / VOICE_SECS_PER_XP;
                record.xp += earned;
                Some(earned)
            })
            .await?;
        if let Some(earned) = paid {
            tracing::debug!("{} earned {earned:.2} voice xp", member.name);
            self.update(member).await?;
        }

        let Some(channel) = after.channel_id else {
            return Ok(());
        };
        if after.is_idle() {
            return Ok(());
        }
        let humans = self
            .platform
            .voice_channel_members(member.guild_id, channel)
            .await?
            .iter()
            .filter(|present| !present.bot)
            .count();
        if humans >= self.preferences.min_voice_humans {
            self.database
                .update_member(member.guild_id, member.id, |record| {
                    record.last_voice_checkpoint = Some(now)
                })
                .await?;
        }
        Ok(())
    }

    /// Forgets every open checkpoint; time spent while offline never counts.
    pub async fn reset_voice_checkpoints(&self, guilds: &[GuildId]) -> BotResult<()> {
        for guild in guilds {
            for member in self.platform.members(*guild).await? {
                self.database
                    .update_member(*guild, member.id, |record| {
                        record.last_voice_checkpoint = None
                    })
                    .await?;
            }
        }
        Ok(())
    }
}
