//! Session management for the Telegram client
//!
//! Provides:
//! - File-based session locking to prevent parallel runs on one session
//! - Client creation and interactive sign-in

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use grammers_client::{Client, SignInError};
use grammers_mtsender::SenderPool;
use grammers_session::storages::SqliteSession;
use tracing::info;

use crate::error::{Error, Result};

/// Session lock guard that ensures exclusive access to the Telegram session.
pub struct SessionLock {
    path: PathBuf,
    lock_file: Option<File>,
}

impl SessionLock {
    /// Acquire an exclusive lock on the session.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                lock_file: Some(lock_file),
            }),
            Err(_) => {
                eprintln!(
                    r#"
ERROR: the Telegram session is already in use by another process.

Telegram sessions must not be shared by parallel runs.
Wait for the other run to finish and try again.
"#
                );
                Err(Error::SessionLocked)
            }
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Open (or create) the session database.
pub fn open_session(session_file: &str) -> Result<Arc<SqliteSession>> {
    let session = SqliteSession::open(session_file)
        .map_err(|e| Error::SessionError(format!("Failed to open {}: {}", session_file, e)))?;
    Ok(Arc::new(session))
}

/// Holder for SenderPool components and Client
pub struct TelegramClient {
    pub client: Client,
    _runner_handle: tokio::task::JoinHandle<()>,
}

impl TelegramClient {
    /// Create a new TelegramClient from session
    pub async fn connect(session: Arc<SqliteSession>, api_id: i32) -> Result<Self> {
        let pool = SenderPool::new(session, api_id);

        // Client must be built before the pool is split
        let client = Client::new(&pool);

        let SenderPool { runner, .. } = pool;

        let runner_handle = tokio::spawn(async move {
            runner.run().await;
        });

        Ok(Self {
            client,
            _runner_handle: runner_handle,
        })
    }
}

impl std::ops::Deref for TelegramClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Read one trimmed line from stdin after printing a prompt to stderr.
///
/// Stdout is reserved for the archive path, so prompts never go there.
fn prompt(message: &str) -> Result<String> {
    eprint!("{}", message);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Make sure the client is signed in, running the interactive login if needed.
pub async fn authorize(client: &Client, api_hash: &str, phone: &str) -> Result<()> {
    if client.is_authorized().await? {
        return Ok(());
    }

    let phone = if phone.is_empty() {
        prompt("Please enter your phone (international format): ")?
    } else {
        phone.to_string()
    };
    if phone.is_empty() {
        return Err(Error::InvalidArgument("phone number is required".into()));
    }

    info!("Requesting login code for {}", phone);
    let token = client
        .request_login_code(&phone, api_hash)
        .await
        .map_err(|e| Error::AuthorizationFailed(format!("Failed to request code: {}", e)))?;

    let code = prompt("Please enter the code you received: ")?;

    let user = match client.sign_in(&token, &code).await {
        Ok(user) => user,
        Err(SignInError::PasswordRequired(password_token)) => {
            let password = prompt("Please enter your 2FA password: ")?;
            client
                .check_password(password_token, password.as_bytes())
                .await
                .map_err(|e| Error::AuthorizationFailed(e.to_string()))?
        }
        Err(e) => return Err(Error::AuthorizationFailed(e.to_string())),
    };

    info!(
        "Signed in as {} (@{})",
        user.full_name(),
        user.username().unwrap_or("-")
    );
    Ok(())
}

/// Lock, open, connect and sign in: everything before the first API call.
pub async fn start(
    session_file: &str,
    api_id: i32,
    api_hash: &str,
    phone: &str,
) -> Result<TelegramClient> {
    let session = open_session(session_file)?;
    let client = TelegramClient::connect(session, api_id).await?;
    authorize(&client, api_hash, phone).await?;
    Ok(client)
}
