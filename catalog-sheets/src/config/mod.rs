//! Configuration for catalog uploads
//!
//! Settings are layered: built-in defaults, then `config.toml` (from the user config
//! directory or an explicit path), then environment variables (a `.env` file is
//! honoured), and finally command-line flags applied by the caller.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::feed::DEFAULT_RECORD_PATH;
use crate::sheets::DEFAULT_ROWS_LIMIT;

pub const ENV_ACCESS_TOKEN: &str = "CATALOG_SHEETS_ACCESS_TOKEN";
pub const ENV_API_URL: &str = "CATALOG_SHEETS_API_URL";
pub const ENV_ROWS_LIMIT: &str = "CATALOG_SHEETS_ROWS_LIMIT";

const APP_DIR: &str = "catalog-sheets";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheets: SheetsConfig,
    pub feed: FeedConfig,
}

/// Spreadsheet API and sheet layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub api_base_url: String,
    /// Bearer token sent as-is; obtaining it is outside this tool
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    /// Rows per sheet, header row included
    pub rows_limit: usize,
    pub sheet_prefix: String,
}

/// Input feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Slash-separated element path to the repeated record element
    pub record_path: String,
    /// Feed used when `--input` is not given
    pub input: PathBuf,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://sheets.googleapis.com".to_string(),
            access_token: None,
            timeout_secs: 30,
            rows_limit: DEFAULT_ROWS_LIMIT,
            sheet_prefix: "Sheet".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            record_path: DEFAULT_RECORD_PATH.to_string(),
            input: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("data")
                .join("coffee_feed.xml"),
        }
    }
}

impl SheetsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Default location of the config file (`~/.config/catalog-sheets/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from `path`, or from the default location when it exists,
    /// then apply environment overrides. Call [`Config::validate`] once every override
    /// has been applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => {
                    log::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override settings from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.sheets.access_token = Some(token);
        }
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.sheets.api_base_url = url;
        }
        if let Some(limit) = lookup(ENV_ROWS_LIMIT) {
            self.sheets.rows_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got '{}'", ENV_ROWS_LIMIT, limit))?;
        }
        Ok(())
    }

    /// Reject settings the uploader cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sheets.rows_limit < 2 {
            anyhow::bail!(
                "rows_limit must leave room for a header and at least one data row (got {})",
                self.sheets.rows_limit
            );
        }
        if self.sheets.sheet_prefix.trim().is_empty() {
            anyhow::bail!("sheet_prefix cannot be empty");
        }
        if self.feed.record_path.split('/').all(|s| s.is_empty()) {
            anyhow::bail!("record_path cannot be empty");
        }
        if self.sheets.api_base_url.trim().is_empty() {
            anyhow::bail!("api_base_url cannot be empty");
        }
        Ok(())
    }
}
