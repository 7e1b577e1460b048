//! Topic archiving: walks a forum topic oldest-first and keeps a flat text log on disk.
//!
//! The Telegram side is abstracted behind [`TopicSource`] so the export loop can run
//! against any backend that can list participants, look up a topic and page its history.

pub mod log;
pub mod naming;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use self::log::ArchiveLog;
pub use self::naming::{file_stem, log_path, slugify};

/// Messages requested per history page.
pub const HISTORY_PAGE_SIZE: usize = 100;

/// A forum topic (thread) inside a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: i32,
    pub title: String,
}

/// Result of a topic-by-id lookup as reported by the server.
#[derive(Debug, Clone, Default)]
pub struct TopicLookup {
    pub count: i32,
    pub topics: Vec<Topic>,
}

impl TopicLookup {
    /// The topic, if the server reported exactly one.
    pub fn into_single(self) -> Option<Topic> {
        if self.count != 1 {
            return None;
        }
        self.topics.into_iter().next()
    }
}

/// A channel member snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participant {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Participant {
    /// First name, last name and `(@handle)` joined by spaces; absent or empty parts are left out.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(first) = self.first_name.as_deref().filter(|s| !s.is_empty()) {
            parts.push(first.to_string());
        }
        if let Some(last) = self.last_name.as_deref().filter(|s| !s.is_empty()) {
            parts.push(last.to_string());
        }
        if let Some(username) = self.username.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("(@{})", username));
        }
        parts.join(" ")
    }
}

/// One message of a topic history.
#[derive(Debug, Clone)]
pub struct TopicMessage {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub sender_id: i64,
    /// `None` for service messages; `Some("")` for media sent without a caption.
    pub text: Option<String>,
    pub has_media: bool,
}

/// Everything the archiver needs from Telegram.
#[allow(async_fn_in_trait)]
pub trait TopicSource {
    /// Full participant list of the channel.
    async fn participants(&self) -> Result<Vec<Participant>>;

    /// Look up a single topic by id.
    async fn topic_by_id(&self, topic_id: i32) -> Result<TopicLookup>;

    /// Up to `limit` messages of the topic with ids greater than `after_id`, ascending by id.
    async fn history_page(
        &self,
        topic_id: i32,
        after_id: i32,
        limit: usize,
    ) -> Result<Vec<TopicMessage>>;
}

/// Export one topic into `output_dir`, returning the written file path.
///
/// Fails with [`Error::TopicNotFound`] before touching the filesystem when the
/// lookup does not yield exactly one topic.
pub async fn archive_topic<S: TopicSource>(
    source: &S,
    topic_id: i32,
    output_dir: &Path,
    message_limit: usize,
) -> Result<PathBuf> {
    let participants = source.participants().await?;
    info!("Fetched {} participants", participants.len());

    let topic = source
        .topic_by_id(topic_id)
        .await?
        .into_single()
        .ok_or(Error::TopicNotFound(topic_id))?;

    let path = log_path(output_dir, topic_id, &topic.title);
    info!("Archiving topic {} '{}' into {}", topic.id, topic.title, path.display());

    let mut log = ArchiveLog::new(&topic.title);
    let mut after_id = 0;
    let mut seen = 0usize;
    let mut archived = 0usize;

    'pages: while seen < message_limit {
        let want = (message_limit - seen).min(HISTORY_PAGE_SIZE);
        let page = source.history_page(topic_id, after_id, want).await?;
        let page_len = page.len();
        debug!(after_id, page_len, "Fetched history page");

        let previous = after_id;
        for message in page {
            after_id = after_id.max(message.id);
            if log.push_message(&message, &participants) {
                archived += 1;
            }
            log.rewrite(&path)?;

            seen += 1;
            if seen >= message_limit {
                break 'pages;
            }
        }

        if page_len < want || after_id == previous {
            break;
        }
    }

    if seen == 0 {
        log.rewrite(&path)?;
    }

    info!("Archived {} of {} messages", archived, seen);
    Ok(path)
}
