//! Client configuration.
//!
//! Values are layered: built-in defaults, then `config.json` in the user's
//! config directory, then environment variables. Command-line flags are
//! applied last by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "notes-client";
const CONFIG_FILE: &str = "config.json";

/// Default address of the notes API.
pub const DEFAULT_API_URL: &str = "https://notes-backend-z1rh.onrender.com";

pub const API_URL_ENV: &str = "NOTES_API_URL";
pub const SESSION_FILE_ENV: &str = "NOTES_SESSION_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address every request is sent to.
    pub api_url: String,
    /// Where the session token is persisted. `None` means the platform data directory.
    pub session_file: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `api_url` with everything else defaulted.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Load the config file (if any) and apply environment overrides.
    /// Falls back to defaults if the file can't be read or parsed.
    pub fn load() -> Self {
        let config = match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env()
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply `NOTES_API_URL` and `NOTES_SESSION_FILE` if set.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(SESSION_FILE_ENV).ok().map(PathBuf::from),
        )
    }

    /// Replace fields with any values given; empty strings are ignored.
    pub fn with_overrides(mut self, api_url: Option<String>, session_file: Option<PathBuf>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(path) = session_file.filter(|p| !p.as_os_str().is_empty()) {
            self.session_file = Some(path);
        }
        self
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
