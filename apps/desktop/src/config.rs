use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::ControllerConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "job-board.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    show_automation_controls: Option<bool>,
    show_stats: Option<bool>,
    jobs_refresh_secs: Option<u64>,
    status_poll_secs: Option<u64>,
    notification_ttl_secs: Option<u64>,
}

/// Builds the controller config from defaults, the config file, the
/// environment and finally the `--api-url` flag, later layers winning.
pub fn load_settings(
    config_path: Option<&Path>,
    api_url_flag: Option<&str>,
) -> anyhow::Result<ControllerConfig> {
    let mut settings = ControllerConfig::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;

    if let Some(url) = api_url_flag {
        settings.api_base_url = url.to_string();
    }

    settings.validate()?;
    Ok(settings)
}

fn apply_file(settings: &mut ControllerConfig, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file.show_automation_controls {
        settings.show_automation_controls = v;
    }
    if let Some(v) = file.show_stats {
        settings.show_stats = v;
    }
    if let Some(v) = file.jobs_refresh_secs {
        settings.jobs_refresh_interval = Duration::from_secs(v);
    }
    if let Some(v) = file.status_poll_secs {
        settings.status_poll_interval = Duration::from_secs(v);
    }
    if let Some(v) = file.notification_ttl_secs {
        settings.notification_ttl = Duration::from_secs(v);
    }
    Ok(())
}

fn apply_env(
    settings: &mut ControllerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("JOB_BOARD_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__SHOW_AUTOMATION_CONTROLS") {
        settings.show_automation_controls = parse_flag("APP__SHOW_AUTOMATION_CONTROLS", &v)?;
    }
    if let Some(v) = lookup("APP__SHOW_STATS") {
        settings.show_stats = parse_flag("APP__SHOW_STATS", &v)?;
    }

    if let Some(v) = lookup("APP__JOBS_REFRESH_SECS") {
        settings.jobs_refresh_interval = parse_secs("APP__JOBS_REFRESH_SECS", &v)?;
    }
    if let Some(v) = lookup("APP__STATUS_POLL_SECS") {
        settings.status_poll_interval = parse_secs("APP__STATUS_POLL_SECS", &v)?;
    }
    if let Some(v) = lookup("APP__NOTIFICATION_TTL_SECS") {
        settings.notification_ttl = parse_secs("APP__NOTIFICATION_TTL_SECS", &v)?;
    }
    Ok(())
}

fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean, got '{other}'"),
    }
}

fn parse_secs(key: &str, raw: &str) -> anyhow::Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    Ok(Duration::from_secs(secs))
}
