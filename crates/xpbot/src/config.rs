use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BotError, BotResult};

pub const BOT_CONFIG_FILENAME: &str = "config.json";
pub const BOT_CONFIG_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub version: String,
    /// Prefix given to guilds seen for the first time.
    pub default_prefix: String,
    pub embed_color: u32,
    pub xp: XpPreferences,
    pub rickroll: RickrollPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpPreferences {
    /// Minimum gap between two messages that both earn XP.
    pub message_cooldown_secs: f64,
    /// Voice time multiplier while the camera was on.
    pub video_multiplier: f64,
    /// Non-bot members a voice channel needs before time counts.
    pub min_voice_humans: usize,
    pub role_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RickrollPreferences {
    pub audio_path: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            version: BOT_CONFIG_VERSION.to_string(),
            default_prefix: "!".to_string(),
            embed_color: 0x0FFFFF,
            xp: XpPreferences::default(),
            rickroll: RickrollPreferences::default(),
        }
    }
}

impl Default for XpPreferences {
    fn default() -> Self {
        Self {
            message_cooldown_secs: 60.0,
            video_multiplier: 3.0,
            min_voice_humans: 2,
            role_reason: "xp auto system".to_string(),
        }
    }
}

impl Default for RickrollPreferences {
    fn default() -> Self {
        Self {
            audio_path: PathBuf::from("nevergonnagiveyouup.mp3"),
        }
    }
}

/// Reads `config.json` from `dir`, writing the defaults first when it is missing.
pub fn load_or_create_config(dir: &Path) -> BotResult<BotConfig> {
    std::fs::create_dir_all(dir).map_err(|error| {
        BotError::Internal(format!(
            "failed to create data directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = config_path(dir);
    if !path.exists() {
        let config = BotConfig::default();
        write_config(&path, &config)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        BotError::Internal(format!(
            "failed to read config {}: {error}",
            path.display()
        ))
    })?;
    let config: BotConfig = serde_json::from_str(&data).map_err(|error| {
        BotError::Internal(format!(
            "failed to parse config {}: {error}",
            path.display()
        ))
    })?;
    if config.version != BOT_CONFIG_VERSION {
        return Err(BotError::Internal(format!(
            "unsupported config version {}",
            config.version
        )));
    }
    Ok(config)
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(BOT_CONFIG_FILENAME)
}

fn write_config(path: &Path, config: &BotConfig) -> BotResult<()> {
    let data = serde_json::to_string_pretty(config)
        .map_err(|error| BotError::Internal(format!("failed to serialize config: {error}")))?;
    std::fs::write(path, data).map_err(|error| {
        BotError::Internal(format!(
            "failed to write config {}: {error}",
            path.display()
        ))
    })
}
