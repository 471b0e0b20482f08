// ABOUTME: Application configuration with defaults and file loading
// Supports TOML configuration files and environment variables

use crate::status::DEFAULT_DISPLAY_DURATION;
use crate::utils::error::{LoanDeskError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout", with = "duration_str")]
    pub request_timeout: Duration,
    /// How long a status stays on screen.
    #[serde(default = "default_status_display", with = "duration_str")]
    pub status_display: Duration,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_confirm_deletes")]
    pub confirm_deletes: bool,
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
    #[serde(skip)]
    pub debug: bool,
}

fn default_api_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_status_display() -> Duration {
    DEFAULT_DISPLAY_DURATION
}

fn default_page_size() -> u32 {
    10
}

fn default_confirm_deletes() -> bool {
    true
}

// Durations are written the human way, e.g. "5s" or "1m 30s".
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout: default_request_timeout(),
            status_display: default_status_display(),
            page_size: default_page_size(),
            confirm_deletes: default_confirm_deletes(),
            config_path: None,
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "loan-desk", "loan-desk")
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the config file at `path`, or at the default location when `None`,
    /// then applies environment overrides.
    ///
    /// An explicitly given file must exist and parse. A broken file at the default
    /// location is skipped with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default).unwrap_or_else(|e| {
                    warn!("Ignoring config at {}: {}", default.display(), e);
                    Self::default()
                }),
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Applies `LOAN_DESK_*` overrides; unparsable values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LOAN_DESK_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }

        if let Some(timeout) = lookup("LOAN_DESK_TIMEOUT") {
            match humantime::parse_duration(&timeout) {
                Ok(parsed) => self.request_timeout = parsed,
                Err(e) => warn!("Ignoring LOAN_DESK_TIMEOUT={}: {}", timeout, e),
            }
        }

        if let Some(window) = lookup("LOAN_DESK_STATUS_DISPLAY") {
            match humantime::parse_duration(&window) {
                Ok(parsed) => self.status_display = parsed,
                Err(e) => warn!("Ignoring LOAN_DESK_STATUS_DISPLAY={}: {}", window, e),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(LoanDeskError::Config("page_size must be at least 1".to_string()));
        }
        if self.status_display.is_zero() {
            return Err(LoanDeskError::Config(
                "status_display must be longer than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Writes the config to its own path, or the default location. Returns where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_path().ok_or_else(|| {
                LoanDeskError::Config("No configuration directory available".to_string())
            })?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
