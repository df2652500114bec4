use crate::library::AUDIO_EXTENSIONS;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const APP_DIR: &str = "tunepane";
const SETTINGS_FILE: &str = "settings.json";
const LOG_DIR: &str = "logs";
pub const CONFIG_DIR_ENV: &str = "TUNEPANE_CONFIG_DIR";
pub const DEFAULT_LOG_FILTER: &str = "info,tunepane=debug";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub music_root: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub redraw_interval_ms: u64,
    pub input_poll_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_root: None,
            extensions: AUDIO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            redraw_interval_ms: 30,
            input_poll_ms: 15,
            log_filter: String::from(DEFAULT_LOG_FILTER),
        }
    }
}

impl Settings {
    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Some(override_dir) = env::var_os(CONFIG_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(override_dir));
    }

    let base = dirs::config_dir().context("no configuration directory for this platform")?;
    Ok(base.join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_DIR))
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path()?)
}

/// Reads settings from `path`, falling back to defaults when it does not exist.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

/// Picks the starting folder: the command line, then the settings file, then
/// the platform music folder, then home. Only existing directories qualify.
pub fn resolve_root(cli_root: Option<&Path>, settings: &Settings) -> PathBuf {
    let candidates = [
        cli_root.map(Path::to_path_buf),
        settings.music_root.clone(),
        dirs::audio_dir(),
        dirs::home_dir(),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("."))
}
