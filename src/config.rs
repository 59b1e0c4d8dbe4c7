use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{AccountCredentials, SearchLocation};

const SETTINGS_ENV: &str = "GCNOTIFY_SETTINGS";
const DEFAULT_SETTINGS: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub geocaching_user_id: String,
    pub geocaching_gspk_user_id: String,
    pub pushover_user: String,
    pub pushover_token: String,
    pub search_locations: Vec<SearchLocation>,
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default = "default_pushover_url")]
    pub pushover_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// No timeout unless set.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    /// Run once and exit unless set.
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
}

fn default_listing_url() -> String {
    "https://www.geocaching.com/seek/nearest.aspx".to_string()
}

fn default_pushover_url() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("gcnotify.db")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36".to_string()
}

impl Config {
    /// Loads the settings file named by `GCNOTIFY_SETTINGS` (default
    /// `settings.json` next to the executable), with `GCNOTIFY__<KEY>`
    /// environment overrides. A relative `database_path` is also taken
    /// relative to the executable's directory.
    pub fn load() -> Result<Self> {
        let base = executable_dir()?;
        let path = std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join(DEFAULT_SETTINGS));

        let mut config = Self::from_file(&path)?;
        config.database_path = resolve_beside(&base, &config.database_path);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Config = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix("GCNOTIFY").separator("__"))
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.search_locations.is_empty(),
            "At least one search location is required"
        );
        ensure!(
            !self.geocaching_user_id.trim().is_empty(),
            "geocaching_user_id must not be empty"
        );
        Ok(())
    }

    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials {
            user_id: self.geocaching_user_id.clone(),
            gspk_user_id: self.geocaching_gspk_user_id.clone(),
        }
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
}

/// Absolute paths and SQLite's `:memory:` are kept as they are.
fn resolve_beside(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path == Path::new(":memory:") {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
