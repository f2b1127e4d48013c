//! Bot token lookup.
//!
//! Sources, first non-empty wins: `TELEGRAM_BOT_TOKEN`, the OS keyring,
//! `telegram.bot_token` in the config file.

use crate::error::ConfigError;
use crate::storage::Config;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
const TOKEN_ENTRY: &str = "telegram_bot_token";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "donebot";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    Keyring,
    ConfigFile,
}

pub fn store_token(token: &str) -> Result<(), keyring::Error> {
    keyring_store::set(TOKEN_ENTRY, token.trim())
}

pub fn clear_token() -> Result<(), keyring::Error> {
    keyring_store::delete(TOKEN_ENTRY)
}

/// Keyring lookup that degrades to `None`; headless hosts often have no
/// secret service.
fn keyring_token() -> Option<String> {
    match keyring_store::get(TOKEN_ENTRY) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "keyring unavailable; skipping stored bot token");
            None
        }
    }
}

/// Resolve the bot token for `config`.
pub fn resolve_bot_token(config: &Config) -> Result<(String, TokenSource), ConfigError> {
    pick_token(
        std::env::var(TOKEN_ENV).ok(),
        keyring_token,
        config.telegram.bot_token.clone(),
    )
}

fn pick_token(
    env: Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    file: Option<String>,
) -> Result<(String, TokenSource), ConfigError> {
    let usable = |t: Option<String>| t.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    if let Some(token) = usable(env) {
        return Ok((token, TokenSource::Env));
    }
    if let Some(token) = usable(keyring()) {
        return Ok((token, TokenSource::Keyring));
    }
    usable(file)
        .map(|token| (token, TokenSource::ConfigFile))
        .ok_or_else(|| ConfigError::MissingKey(format!("{TOKEN_ENV} (or keyring entry)")))
}
