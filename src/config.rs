//! Configuration for the archiver
//!
//! Loads optional settings from `config.yml` and `.env`. The five positional
//! CLI arguments are never read from here; this only covers the knobs around them.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default constants (fallback if config.yml not found)
pub const SESSION_NAME: &str = "session_name";
pub const MESSAGE_LIMIT: usize = 5000;
pub const FILE_STEM_MAX: usize = 42;
pub const PARTICIPANTS_PAGE_SIZE: i32 = 200;

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    telegram: Option<TelegramConfig>,
    archive: Option<ArchiveConfig>,
}

#[derive(Debug, Deserialize)]
struct TelegramConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    phone: Option<String>,
    session_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArchiveConfig {
    message_limit: Option<usize>,
    participants_page_size: Option<i32>,
    aggressive_participants: Option<bool>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    /// Phone used for interactive sign-in; prompted for when empty.
    pub phone: String,
    pub session_name: String,
    pub message_limit: usize,
    pub participants_page_size: i32,
    pub aggressive_participants: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> String {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return env_val;
                }
                return std::env::var(env_key).unwrap_or_default();
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return env_val;
        }
        value.unwrap_or_default()
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        let telegram = yaml.telegram.unwrap_or(TelegramConfig {
            phone: None,
            session_name: None,
        });

        let archive = yaml.archive.unwrap_or(ArchiveConfig {
            message_limit: None,
            participants_page_size: None,
            aggressive_participants: None,
        });

        Ok(Self {
            phone: Self::resolve_env_string(telegram.phone, "TELEGRAM_PHONE"),
            session_name: telegram
                .session_name
                .unwrap_or_else(|| SESSION_NAME.to_string()),
            message_limit: archive.message_limit.unwrap_or(MESSAGE_LIMIT),
            participants_page_size: archive
                .participants_page_size
                .filter(|size| *size > 0)
                .unwrap_or(PARTICIPANTS_PAGE_SIZE),
            aggressive_participants: archive.aggressive_participants.unwrap_or(true),
        })
    }

    /// Create config with defaults (fallback when no config.yml exists)
    fn defaults() -> Self {
        Self::load_dotenv();
        Self {
            phone: std::env::var("TELEGRAM_PHONE").unwrap_or_default(),
            session_name: SESSION_NAME.to_string(),
            message_limit: MESSAGE_LIMIT,
            participants_page_size: PARTICIPANTS_PAGE_SIZE,
            aggressive_participants: true,
        }
    }

    /// Session database file for the configured session name.
    pub fn session_file(&self) -> String {
        format!("{}.session", self.session_name)
    }

    /// Lock file guarding the session against parallel runs.
    pub fn lock_file(&self) -> String {
        format!("{}.lock", self.session_name)
    }

    /// Apply CLI overrides on top of the loaded configuration.
    pub fn with_overrides(
        mut self,
        session_name: Option<String>,
        limit: Option<usize>,
        phone: Option<String>,
    ) -> Self {
        if let Some(name) = session_name {
            self.session_name = name;
        }
        if let Some(limit) = limit {
            self.message_limit = limit;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        self
    }
}
