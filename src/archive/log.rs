//! Line buffer for a topic archive and its rendering to disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{Participant, TopicMessage};
use crate::error::Result;

pub const MEDIA_MARKER: &str = "[media]";

/// Timestamp line, e.g. `2024-03-19 10:30:05+00:00`.
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Linear scan; the participant list is a snapshot taken once per run.
pub fn find_participant(participants: &[Participant], user_id: i64) -> Option<&Participant> {
    participants.iter().find(|p| p.id == user_id)
}

/// Author line for a sender, falling back to `Deleted User @{id}`.
pub fn author_line(participants: &[Participant], sender_id: i64) -> String {
    match find_participant(participants, sender_id) {
        Some(participant) => participant.display_name(),
        None => format!("Deleted User @{}", sender_id),
    }
}

/// Append-only archive text, one entry per output line.
#[derive(Debug, Clone, Default)]
pub struct ArchiveLog {
    lines: Vec<String>,
}

impl ArchiveLog {
    /// Start a log with the topic title followed by a blank line.
    pub fn new(title: &str) -> Self {
        Self {
            lines: vec![title.to_string(), String::new()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Append the lines for one message. Returns `false` when the message has no body
    /// at all (service messages), in which case nothing is appended.
    pub fn push_message(&mut self, message: &TopicMessage, participants: &[Participant]) -> bool {
        let Some(text) = message.text.as_deref() else {
            return false;
        };

        self.lines.push(format_timestamp(&message.date));
        self.lines.push(author_line(participants, message.sender_id));
        if message.has_media {
            self.lines.push(MEDIA_MARKER.to_string());
        }
        if !text.is_empty() {
            self.lines.push(text.to_string());
        }
        self.lines.push(String::new());
        true
    }

    /// Whole file content: every line terminated by `\n`.
    pub fn render(&self) -> String {
        let capacity = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut content = String::with_capacity(capacity);
        for line in &self.lines {
            content.push_str(line);
            content.push('\n');
        }
        content
    }

    /// Delete any existing file at `path` and write the full buffer.
    pub fn rewrite(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        for line in &self.lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }
}
