pub mod bot;
pub mod command;
pub mod config;
pub mod database;
pub mod embed;
pub mod error;
pub mod platform;
pub mod rickroll;
pub mod storage;
pub mod utils;
pub mod xp;

#[cfg(test)]
mod test_support;

pub use crate::bot::Bot;
pub use crate::config::{load_or_create_config, BotConfig};
pub use crate::database::{Database, GuildDocument, MemberRecord, Scope};
pub use crate::embed::Embed;
pub use crate::error::{BotError, BotResult};
pub use crate::platform::{Platform, SharedPlatform};
pub use crate::storage::{SharedStorage, Storage};
