//! Topic archiver CLI - main entry point
//!
//! Prints the path of the written archive on stdout; logs go to stderr.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use topic_archiver::commands::{self, ArchiveArgs};
use topic_archiver::{Config, Error};

#[derive(Parser)]
#[command(name = "archive_topic")]
#[command(about = "Archive the messages of a Telegram forum topic into a text log", long_about = None)]
#[command(version)]
struct Cli {
    /// Telegram API id
    api_id: i32,

    /// Telegram API hash
    api_hash: String,

    /// Channel id (plain or -100 prefixed)
    #[arg(allow_hyphen_values = true)]
    channel_id: i64,

    /// Forum topic id
    topic_id: i32,

    /// Directory the .log file is written to
    output_dir: PathBuf,

    /// Session name (the session is stored in <NAME>.session)
    #[arg(long, env = "TELEGRAM_SESSION")]
    session: Option<String>,

    /// Maximum number of messages to archive
    #[arg(short, long)]
    limit: Option<usize>,

    /// Phone number used if the session still needs to sign in
    #[arg(long, env = "TELEGRAM_PHONE")]
    phone: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("topic_archiver=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new().with_overrides(cli.session, cli.limit, cli.phone);

    let args = ArchiveArgs {
        api_id: cli.api_id,
        api_hash: cli.api_hash,
        channel_id: cli.channel_id,
        topic_id: cli.topic_id,
        output_dir: cli.output_dir,
    };

    match commands::archive_run(args, &config).await {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(err @ Error::TopicNotFound(_)) => {
            println!("{}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
