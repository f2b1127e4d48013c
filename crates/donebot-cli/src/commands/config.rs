use std::path::Path;

use clap::Subcommand;
use donebot_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "window.start", "telegram.chat_id")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(config_path: &Path, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let mut config = Config::load_from(config_path)?;
            if config.telegram.bot_token.is_some() {
                config.telegram.bot_token = Some("********".into());
            }
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save_to(config_path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => println!("{}", config_path.display()),
    }
    Ok(())
}
