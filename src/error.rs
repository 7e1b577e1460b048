//! Error types for the topic archiver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Session is locked by another process")]
    SessionLocked,

    #[error("Failed to acquire session lock: {0}")]
    LockError(String),

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("Channel not found in dialogs: {0}")]
    ChannelNotFound(i64),

    #[error("Topic {0} not found.")]
    TopicNotFound(i32),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<grammers_client::InvocationError> for Error {
    fn from(err: grammers_client::InvocationError) -> Self {
        Error::TelegramError(err.to_string())
    }
}
