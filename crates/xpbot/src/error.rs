use std::fmt;

/// Unified error type for the bot crate.
#[derive(Debug, Clone)]
pub enum BotError {
    /// The command's arguments were bound but make no sense.
    InvalidInput(String),
    /// A guild, member or role the bot expected is gone.
    NotFound(String),
    /// The chat platform rejected or failed a request.
    Platform(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            BotError::NotFound(msg) => write!(f, "not found: {msg}"),
            BotError::Platform(msg) => write!(f, "platform error: {msg}"),
            BotError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<interpreter::InterpreterError> for BotError {
    fn from(error: interpreter::InterpreterError) -> Self {
        BotError::InvalidInput(error.to_string())
    }
}

/// Result type alias using [`BotError`].
pub type BotResult<T> = Result<T, BotError>;
