use std::path::Path;

use donebot_core::{Clock, Config, FileBlobStore, RunSettings, SystemClock, TaskAdmin};

use super::{parse_at, CliResult};

pub fn run(config_path: &Path, at: Option<&str>) -> CliResult {
    let config = Config::load_from(config_path)?;
    let settings = RunSettings::local(&config)?;
    let now = match at {
        Some(raw) => parse_at(raw, &settings.zone)?,
        None => SystemClock::new(settings.zone).now(),
    };

    let store = FileBlobStore::new(config.blob_dir()?);
    let admin = TaskAdmin::new(&store, settings);
    println!("{}", admin.status(now)?);
    Ok(())
}
