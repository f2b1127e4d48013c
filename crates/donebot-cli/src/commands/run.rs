use std::path::Path;

use donebot_core::storage::credentials::resolve_bot_token;
use donebot_core::{
    Config, FileBlobStore, ManualClock, Orchestrator, RunSettings, SystemClock, TelegramTransport,
};

use super::{parse_at, CliResult};

pub fn run(config_path: &Path, at: Option<&str>) -> CliResult {
    let config = Config::load_from(config_path)?;
    let settings = RunSettings::from_config(&config)?;
    let (token, source) = resolve_bot_token(&config)?;
    tracing::debug!(?source, "bot token resolved");

    let transport = TelegramTransport::new(&config.telegram, &token, &settings.chat_id)?;
    let store = FileBlobStore::new(config.blob_dir()?);

    let report = match at {
        Some(raw) => {
            let clock = ManualClock::new(parse_at(raw, &settings.zone)?);
            Orchestrator::new(settings, transport, store, clock).run_once()?
        }
        None => {
            let clock = SystemClock::new(settings.zone);
            Orchestrator::new(settings, transport, store, clock).run_once()?
        }
    };

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
