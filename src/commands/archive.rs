//! Archive a forum topic into `<output_dir>/<topic_id>_<slug>.log`.

use std::path::PathBuf;

use tracing::info;

use crate::archive::archive_topic;
use crate::channel::resolve_channel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{self, SessionLock};
use crate::telegram::GrammersSource;

/// Inputs of one archive run.
#[derive(Debug, Clone)]
pub struct ArchiveArgs {
    pub api_id: i32,
    pub api_hash: String,
    pub channel_id: i64,
    pub topic_id: i32,
    pub output_dir: PathBuf,
}

impl ArchiveArgs {
    fn validate(&self) -> Result<()> {
        if self.api_hash.trim().is_empty() {
            return Err(Error::InvalidArgument("api_hash must not be empty".into()));
        }
        if !self.output_dir.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "output directory '{}' does not exist",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

/// Sign in, resolve the channel and write the topic archive. Returns the log path.
pub async fn run(args: ArchiveArgs, config: &Config) -> Result<PathBuf> {
    args.validate()?;

    let _lock = SessionLock::acquire(config.lock_file())?;
    let client = session::start(
        &config.session_file(),
        args.api_id,
        &args.api_hash,
        &config.phone,
    )
    .await?;

    let channel = resolve_channel(&client, args.channel_id).await?;
    info!("Channel: {} ({})", channel.title, channel.id);

    let source = GrammersSource::new(&client, channel)
        .with_page_size(config.participants_page_size)
        .aggressive(config.aggressive_participants);

    archive_topic(&source, args.topic_id, &args.output_dir, config.message_limit).await
}
