//! Session initialization command
//!
//! Signs in once so later archive runs can work unattended.

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::session::{self, SessionLock};

pub async fn run(api_id: i32, api_hash: &str, config: &Config) -> Result<()> {
    let _lock = SessionLock::acquire(config.lock_file())?;

    let client = session::start(&config.session_file(), api_id, api_hash, &config.phone).await?;
    let me = client.get_me().await?;

    info!("Session file: {}", config.session_file());
    eprintln!(
        r#"
Session ready.

Profile:
  Name: {}
  Username: @{}

Session file: {}
"#,
        me.full_name(),
        me.username().unwrap_or("-"),
        config.session_file(),
    );

    Ok(())
}
