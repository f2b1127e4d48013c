//! TOML-based application configuration.
//!
//! Holds everything the orchestrator needs from outside:
//! - Telegram endpoint, chat identity and timeouts
//! - The nightly window and the time zone it is evaluated in
//! - Blob file names and their directory
//! - The task seeded into an empty registry
//!
//! Configuration is stored at `~/.config/donebot/config.toml` unless
//! `DONEBOT_CONFIG` points elsewhere.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveTime};
use chrono_tz::Tz;

use super::data_dir;
use crate::error::ConfigError;
use crate::task::registry::{validated_key, validated_label};
use crate::window::{CivilZone, WindowPolicy};

/// Telegram endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// The only chat the bot listens and replies to.
    #[serde(default)]
    pub chat_id: String,
    /// Lowest-priority token source; prefer the env var or the keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    /// Server-side long-poll wait for `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Client-side cap per HTTP request.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// Nightly window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_cutoff")]
    pub cutoff: String,
    /// IANA zone name; daylight saving follows the zone's rules.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Pins a fixed offset instead of `timezone` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

/// Blob locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the blobs; defaults to the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_tasks_file")]
    pub tasks_file: String,
}

/// Task placed in the registry when no registry blob exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTaskConfig {
    #[serde(default = "default_seed_key")]
    pub key: String,
    #[serde(default = "default_seed_label")]
    pub label: String,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub seed_task: SeedTaskConfig,
}

// Default functions
fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_poll_timeout() -> u64 {
    10
}
fn default_http_timeout() -> u64 {
    20
}
fn default_start() -> String {
    "19:00".into()
}
fn default_cutoff() -> String {
    "02:00".into()
}
fn default_timezone() -> String {
    "America/Chicago".into()
}
fn default_state_file() -> String {
    "state.json".into()
}
fn default_tasks_file() -> String {
    "tasks.json".into()
}
fn default_seed_key() -> String {
    "task".into()
}
fn default_seed_label() -> String {
    "Daily task".into()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_id: String::new(),
            bot_token: None,
            poll_timeout_secs: default_poll_timeout(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            cutoff: default_cutoff(),
            timezone: default_timezone(),
            utc_offset_minutes: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            state_file: default_state_file(),
            tasks_file: default_tasks_file(),
        }
    }
}

impl Default for SeedTaskConfig {
    fn default() -> Self {
        Self {
            key: default_seed_key(),
            label: default_seed_label(),
        }
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                serde_json::Value::Number(_) => value
                    .parse::<i64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot set a whole section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `$DONEBOT_CONFIG`, else `<data dir>/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("DONEBOT_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/donebot"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from `path`, or write and return the defaults if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// if it fails validation, or if the defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::info!(path = %path.display(), "wrote default configuration");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check the values that are only strings or numbers on disk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window_policy()?;
        self.zone()?;
        validated_key(&self.seed_task.key).map_err(|e| ConfigError::InvalidValue {
            key: "seed_task.key".into(),
            message: e.to_string(),
        })?;
        validated_label(&self.seed_task.label).map_err(|e| ConfigError::InvalidValue {
            key: "seed_task.label".into(),
            message: e.to_string(),
        })?;
        if self.telegram.http_timeout_secs <= self.telegram.poll_timeout_secs {
            return Err(ConfigError::InvalidValue {
                key: "telegram.http_timeout_secs".into(),
                message: "must exceed telegram.poll_timeout_secs".into(),
            });
        }
        Ok(())
    }

    pub fn window_policy(&self) -> Result<WindowPolicy, ConfigError> {
        let parse = |key: &str, raw: &str| {
            parse_time_of_day(raw).ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}' is not HH:MM or HH:MM:SS"),
            })
        };
        Ok(WindowPolicy::new(
            parse("window.start", &self.window.start)?,
            parse("window.cutoff", &self.window.cutoff)?,
        ))
    }

    /// The fixed offset override if present, else the named zone.
    pub fn zone(&self) -> Result<CivilZone, ConfigError> {
        if let Some(minutes) = self.window.utc_offset_minutes {
            return FixedOffset::east_opt(minutes.saturating_mul(60))
                .map(CivilZone::Fixed)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "window.utc_offset_minutes".into(),
                    message: "must be within +/-24 hours".into(),
                });
        }
        self.window
            .timezone
            .parse::<Tz>()
            .map(CivilZone::Named)
            .map_err(|_| ConfigError::InvalidValue {
                key: "window.timezone".into(),
                message: format!("'{}' is not an IANA time zone", self.window.timezone),
            })
    }

    /// Chat identity, `TELEGRAM_CHAT_ID` first.
    pub fn chat_id(&self) -> Result<String, ConfigError> {
        self.chat_id_from(std::env::var("TELEGRAM_CHAT_ID").ok())
    }

    fn chat_id_from(&self, env: Option<String>) -> Result<String, ConfigError> {
        env.filter(|id| !id.trim().is_empty())
            .or_else(|| Some(self.telegram.chat_id.clone()).filter(|id| !id.trim().is_empty()))
            .map(|id| id.trim().to_string())
            .ok_or_else(|| ConfigError::MissingKey("telegram.chat_id".into()))
    }

    /// Directory the blobs live in.
    pub fn blob_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => data_dir().map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/donebot"),
                message: e.to_string(),
            }),
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, type-checked against the current
    /// value. The change is rejected if the result fails validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
