pub mod auth;
pub mod config;
pub mod run;
pub mod status;
pub mod tasks;

use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use donebot_core::{CivilZone, Config};

pub type CliResult = Result<(), Box<dyn Error>>;

pub fn config_path(flag: Option<PathBuf>) -> Result<PathBuf, Box<dyn Error>> {
    match flag {
        Some(path) => Ok(path),
        None => Ok(Config::default_path()?),
    }
}

/// Parse an `--at` timestamp and view it in the configured civil zone.
pub fn parse_at(raw: &str, zone: &CivilZone) -> Result<DateTime<FixedOffset>, Box<dyn Error>> {
    let at = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| format!("invalid --at timestamp '{raw}': {e}"))?;
    Ok(zone.localize(&at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_is_shifted_into_configured_zone() {
        let zone = CivilZone::default();
        let winter = parse_at("2024-01-11T02:30:00Z", &zone).unwrap();
        assert_eq!(winter.to_rfc3339(), "2024-01-10T20:30:00-06:00");
        let summer = parse_at("2024-07-11T00:30:00Z", &zone).unwrap();
        assert_eq!(summer.to_rfc3339(), "2024-07-10T19:30:00-05:00");
    }

    #[test]
    fn bad_at_is_rejected() {
        let zone = CivilZone::Fixed(FixedOffset::east_opt(0).unwrap());
        let err = parse_at("tonight", &zone).unwrap_err();
        assert!(err.to_string().contains("invalid --at"));
    }
}
