//! Session initialization binary.
//!
//! Usage: init_session <api_id> <api_hash> [--session NAME] [--phone PHONE]

use clap::Parser;
use topic_archiver::commands::init_session;
use topic_archiver::Config;

#[derive(Parser)]
#[command(name = "init_session")]
#[command(about = "Sign in and store a Telegram session for later archive runs")]
struct Args {
    /// Telegram API id
    api_id: i32,

    /// Telegram API hash
    api_hash: String,

    /// Session name (the session is stored in <NAME>.session)
    #[arg(long, env = "TELEGRAM_SESSION")]
    session: Option<String>,

    /// Phone number to sign in with (prompted when absent)
    #[arg(long, env = "TELEGRAM_PHONE")]
    phone: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::new().with_overrides(args.session, None, args.phone);
    init_session::run(args.api_id, &args.api_hash, &config).await?;
    Ok(())
}
