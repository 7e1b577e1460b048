//! Tests for the archive flow against an in-memory topic source

use std::path::Path;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use topic_archiver::archive::HISTORY_PAGE_SIZE;
use topic_archiver::{
    archive_topic, Error, Participant, Result, Topic, TopicLookup, TopicMessage, TopicSource,
};

struct FakeSource {
    participants: Vec<Participant>,
    lookup: TopicLookup,
    messages: Vec<TopicMessage>,
    page_requests: Mutex<Vec<(i32, usize)>>,
}

impl FakeSource {
    fn new(title: &str, messages: Vec<TopicMessage>) -> Self {
        let mut messages = messages;
        messages.sort_by_key(|m| m.id);
        Self {
            participants: vec![ana()],
            lookup: TopicLookup {
                count: 1,
                topics: vec![Topic {
                    id: 42,
                    title: title.to_string(),
                }],
            },
            messages,
            page_requests: Mutex::new(Vec::new()),
        }
    }

    fn with_lookup(mut self, lookup: TopicLookup) -> Self {
        self.lookup = lookup;
        self
    }

    fn requests(&self) -> Vec<(i32, usize)> {
        self.page_requests.lock().unwrap().clone()
    }
}

impl TopicSource for FakeSource {
    async fn participants(&self) -> Result<Vec<Participant>> {
        Ok(self.participants.clone())
    }

    async fn topic_by_id(&self, _topic_id: i32) -> Result<TopicLookup> {
        Ok(self.lookup.clone())
    }

    async fn history_page(
        &self,
        _topic_id: i32,
        after_id: i32,
        limit: usize,
    ) -> Result<Vec<TopicMessage>> {
        self.page_requests.lock().unwrap().push((after_id, limit));
        Ok(self
            .messages
            .iter()
            .filter(|m| m.id > after_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

fn ana() -> Participant {
    Participant {
        id: 7,
        first_name: Some("Ana".into()),
        last_name: None,
        username: Some("ana99".into()),
    }
}

fn message(id: i32, sender_id: i64, text: Option<&str>, has_media: bool) -> TopicMessage {
    TopicMessage {
        id,
        date: Utc
            .with_ymd_and_hms(2024, 3, 19, 10, 30, 5)
            .single()
            .expect("timestamp"),
        sender_id,
        text: text.map(str::to_string),
        has_media,
    }
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read dir").count()
}

#[tokio::test]
async fn general_chat_example_writes_four_lines_per_message() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new("General Chat", vec![message(100, 7, Some("hello"), false)]);

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;

    assert_eq!(path, temp.path().join("42_general_chat.log"));
    assert_eq!(
        std::fs::read_to_string(&path)?,
        "General Chat\n\n2024-03-19 10:30:05+00:00\nAna (@ana99)\nhello\n\n"
    );
    Ok(())
}

#[tokio::test]
async fn topic_not_found_writes_nothing() {
    let temp = TempDir::new().expect("tempdir");
    let source = FakeSource::new("General Chat", vec![message(100, 7, Some("hello"), false)])
        .with_lookup(TopicLookup::default());

    let result = archive_topic(&source, 42, temp.path(), 5000).await;

    assert!(matches!(result, Err(Error::TopicNotFound(42))));
    assert_eq!(entries(temp.path()), 0);
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn ambiguous_lookup_is_treated_as_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let topic = Topic {
        id: 42,
        title: "General Chat".into(),
    };
    let source = FakeSource::new("General Chat", Vec::new()).with_lookup(TopicLookup {
        count: 2,
        topics: vec![topic.clone(), topic],
    });

    let result = archive_topic(&source, 42, temp.path(), 5000).await;

    assert!(matches!(result, Err(Error::TopicNotFound(42))));
    assert_eq!(entries(temp.path()), 0);
}

#[tokio::test]
async fn unknown_sender_and_media_are_rendered() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new(
        "Media",
        vec![
            message(1, 999, Some(""), true),
            message(2, 7, Some(""), false),
        ],
    );

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(
        lines,
        [
            "Media",
            "",
            "2024-03-19 10:30:05+00:00",
            "Deleted User @999",
            "[media]",
            "",
            "2024-03-19 10:30:05+00:00",
            "Ana (@ana99)",
            "",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn service_messages_are_dropped() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new(
        "t",
        vec![message(1, 7, None, false), message(2, 7, Some("kept"), false)],
    );

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;
    let content = std::fs::read_to_string(path)?;

    assert_eq!(content.matches("Ana (@ana99)").count(), 1);
    assert!(content.contains("kept\n"));
    Ok(())
}

#[tokio::test]
async fn messages_are_written_oldest_first() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new(
        "Order",
        vec![
            message(30, 7, Some("third"), false),
            message(10, 7, Some("first"), false),
            message(20, 7, Some("second"), false),
        ],
    );

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;
    let content = std::fs::read_to_string(path)?;

    let first = content.find("first").expect("first");
    let second = content.find("second").expect("second");
    let third = content.find("third").expect("third");
    assert!(first < second && second < third);
    Ok(())
}

#[tokio::test]
async fn message_cap_limits_history_walk() -> Result<()> {
    let temp = TempDir::new()?;
    let messages = (1..=250)
        .map(|id| message(id, 7, Some(&format!("m{}", id)), false))
        .collect();
    let source = FakeSource::new("Cap", messages);

    let path = archive_topic(&source, 42, temp.path(), 120).await?;
    let content = std::fs::read_to_string(path)?;

    assert!(content.contains("\nm120\n"));
    assert!(!content.contains("\nm121\n"));
    assert_eq!(
        source.requests(),
        vec![(0, HISTORY_PAGE_SIZE), (100, 120 - HISTORY_PAGE_SIZE)]
    );
    Ok(())
}

#[tokio::test]
async fn history_walk_stops_on_short_page() -> Result<()> {
    let temp = TempDir::new()?;
    let messages = (1..=150)
        .map(|id| message(id, 7, Some("x"), false))
        .collect();
    let source = FakeSource::new("Pages", messages);

    archive_topic(&source, 42, temp.path(), 5000).await?;

    assert_eq!(
        source.requests(),
        vec![(0, HISTORY_PAGE_SIZE), (100, HISTORY_PAGE_SIZE)]
    );
    Ok(())
}

#[tokio::test]
async fn empty_topic_still_gets_a_header_file() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new("Quiet Topic", Vec::new());

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;

    assert_eq!(std::fs::read_to_string(path)?, "Quiet Topic\n\n");
    Ok(())
}

#[tokio::test]
async fn rerun_produces_identical_bytes() -> Result<()> {
    let temp = TempDir::new()?;
    let source = FakeSource::new(
        "Again, Again",
        vec![
            message(1, 7, Some("one"), false),
            message(2, 8, Some("two"), true),
            message(3, 7, None, false),
        ],
    );

    let path = archive_topic(&source, 42, temp.path(), 5000).await?;
    let first = std::fs::read(&path)?;
    let path_again = archive_topic(&source, 42, temp.path(), 5000).await?;
    let second = std::fs::read(&path_again)?;

    assert_eq!(path, path_again);
    assert_eq!(path, temp.path().join("42_again_again.log"));
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn stale_file_is_replaced() -> Result<()> {
    let temp = TempDir::new()?;
    let stale = temp.path().join("42_general_chat.log");
    std::fs::write(&stale, "old archive with many more lines\n\n\n\n\n")?;
    let source = FakeSource::new("General Chat", Vec::new());

    archive_topic(&source, 42, temp.path(), 5000).await?;

    assert_eq!(std::fs::read_to_string(stale)?, "General Chat\n\n");
    Ok(())
}

#[tokio::test]
async fn missing_output_dir_propagates_io_error() {
    let temp = TempDir::new().expect("tempdir");
    let source = FakeSource::new("General Chat", vec![message(1, 7, Some("hi"), false)]);

    let result = archive_topic(&source, 42, &temp.path().join("missing"), 5000).await;

    assert!(matches!(result, Err(Error::IoError(_))));
}
