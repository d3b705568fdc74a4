use thiserror::Error;

use crate::{resp::RespValue, stream_store::StreamError};

/// Command-level failures. Each one becomes a single error reply and the
/// connection keeps serving requests.
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("invalid PING command")]
    InvalidPingCommand,
    #[error("invalid ECHO command")]
    InvalidEchoCommand,
    #[error("invalid GET command")]
    InvalidGetCommand,
    #[error("invalid SET command")]
    InvalidSetCommand,
    #[error("invalid SET command argument")]
    InvalidSetCommandArgument,
    #[error("invalid SET command expiration")]
    InvalidSetCommandExpiration,
    #[error("invalid CONFIG command")]
    InvalidConfigCommand,
    #[error("invalid CONFIG GET command")]
    InvalidConfigGetCommand,
    #[error("unknown CONFIG GET parameter '{0}'")]
    UnknownConfigParameter(String),
    #[error("invalid KEYS command")]
    InvalidKeysCommand,
    #[error("invalid TYPE command")]
    InvalidTypeCommand,
    #[error("invalid XADD command")]
    InvalidXAddCommand,
    #[error("invalid XRANGE command")]
    InvalidXRangeCommand,
    #[error("invalid XREAD command")]
    InvalidXReadCommand,
    #[error("invalid XREAD command option")]
    InvalidXReadOption,
    #[error("invalid XREAD block duration")]
    InvalidXReadBlockDuration,
    #[error("{0}")]
    Stream(#[from] StreamError),
}

impl CommandError {
    /// Renders the error as a RESP error frame.
    pub fn as_string(&self) -> String {
        self.as_resp().encode()
    }

    pub fn as_resp(&self) -> RespValue {
        match self {
            CommandError::UnknownCommand(name) => {
                RespValue::Error(format!("ERR unknown command '{}'", name))
            }
            CommandError::UnknownConfigParameter(name) => RespValue::Error(format!(
                "ERR unknown parameter '{}' for CONFIG GET",
                name
            )),
            CommandError::InvalidPingCommand
            | CommandError::InvalidEchoCommand
            | CommandError::InvalidGetCommand
            | CommandError::InvalidSetCommand
            | CommandError::InvalidConfigGetCommand
            | CommandError::InvalidKeysCommand
            | CommandError::InvalidTypeCommand
            | CommandError::InvalidXAddCommand
            | CommandError::InvalidXRangeCommand
            | CommandError::InvalidXReadCommand => RespValue::Error(format!(
                "ERR wrong number of arguments: {}",
                self
            )),
            CommandError::Stream(err) => RespValue::Error(format!("ERR {}", err)),
            other => RespValue::Error(format!("ERR {}", capitalize(&other.to_string()))),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
