use std::path::Path;

use clap::Subcommand;
use donebot_core::storage::credentials::{clear_token, resolve_bot_token, store_token, TokenSource};
use donebot_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the bot token in the OS keyring
    SetToken {
        token: String,
    },
    /// Remove the stored bot token
    ClearToken,
    /// Show where the bot token would be read from
    Status,
}

pub fn run(config_path: &Path, action: AuthAction) -> CliResult {
    match action {
        AuthAction::SetToken { token } => {
            if token.trim().is_empty() {
                return Err("token cannot be empty".into());
            }
            store_token(&token)?;
            println!("bot token stored in keyring");
        }
        AuthAction::ClearToken => {
            clear_token()?;
            println!("bot token removed from keyring");
        }
        AuthAction::Status => {
            let config = Config::load_from(config_path)?;
            match resolve_bot_token(&config) {
                Ok((_, source)) => {
                    let from = match source {
                        TokenSource::Env => "TELEGRAM_BOT_TOKEN",
                        TokenSource::Keyring => "keyring",
                        TokenSource::ConfigFile => "config file",
                    };
                    println!("bot token: set ({from})");
                }
                Err(_) => println!("bot token: not set"),
            }
        }
    }
    Ok(())
}
