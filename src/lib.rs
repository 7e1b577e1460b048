//! Telegram forum topic archiver
//!
//! This library provides tools to:
//! - Sign in and keep a Telegram user session
//! - Resolve a forum channel and one of its topics
//! - Write the topic history, oldest first, into a flat text log

pub mod archive;
pub mod channel;
pub mod config;
pub mod error;
pub mod session;
pub mod telegram;

// Re-export common types
pub use archive::{archive_topic, Participant, Topic, TopicLookup, TopicMessage, TopicSource};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionLock, TelegramClient};

pub mod commands;
