//! Configuration management for the dashboard.
//!
//! Stores configuration in JSON format at `~/.servicedash/config.json`.
//! Every field has a default, so a partial or missing file is fine.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::application::{PagingMode, PollOptions};
use crate::domain::{
    PageRequest, SortDirection, SortField, SortSpec, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES,
};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the services endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Poll period in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Upper bound for one request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Rows per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Let the server sort and page instead of doing it locally.
    #[serde(default)]
    pub server_paging: bool,

    #[serde(default)]
    pub sort_field: SortField,

    #[serde(default)]
    pub sort_direction: SortDirection,
}

fn default_endpoint() -> String {
    "http://localhost:3000/".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            page_size: default_page_size(),
            server_paging: false,
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl Config {
    /// Poll period. Never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    /// Per-request timeout. Never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn paging_mode(&self) -> PagingMode {
        if self.server_paging {
            PagingMode::Server
        } else {
            PagingMode::Client
        }
    }

    pub fn sort(&self) -> SortSpec {
        SortSpec::new(self.sort_field, self.sort_direction)
    }

    /// Options for a poll loop starting on the first page.
    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            mode: self.paging_mode(),
            request_timeout: self.request_timeout(),
            sort: self.sort(),
            page: PageRequest::new(1, self.page_size),
        }
    }

    /// Parse `value` and store it under `key`.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let invalid = |expected: &str| {
            Error::Config(format!("invalid value '{}' for {}: expected {}", value, key, expected))
        };
        match key {
            ConfigKey::Endpoint => {
                Url::parse(value)
                    .ok()
                    .filter(|url| matches!(url.scheme(), "http" | "https"))
                    .ok_or_else(|| invalid("an http(s) URL"))?;
                self.endpoint = value.to_string();
            }
            ConfigKey::RefreshInterval => {
                self.refresh_interval = value.parse().map_err(|_| invalid("seconds"))?;
            }
            ConfigKey::RequestTimeout => {
                self.request_timeout = value.parse().map_err(|_| invalid("seconds"))?;
            }
            ConfigKey::PageSize => {
                let size = value.parse().map_err(|_| invalid("a number"))?;
                self.page_size = check_page_size(size)?;
            }
            ConfigKey::ServerPaging => {
                self.server_paging = value.parse().map_err(|_| invalid("true or false"))?;
            }
            ConfigKey::SortField => {
                self.sort_field = value.parse().map_err(|_| invalid("a sort field"))?;
            }
            ConfigKey::SortDirection => {
                self.sort_direction = value.parse().map_err(|_| invalid("asc or desc"))?;
            }
        }
        Ok(())
    }
}

/// A settable configuration entry, named as on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Endpoint,
    RefreshInterval,
    RequestTimeout,
    PageSize,
    ServerPaging,
    SortField,
    SortDirection,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::Endpoint,
        ConfigKey::RefreshInterval,
        ConfigKey::RequestTimeout,
        ConfigKey::PageSize,
        ConfigKey::ServerPaging,
        ConfigKey::SortField,
        ConfigKey::SortDirection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Endpoint => "endpoint",
            ConfigKey::RefreshInterval => "refresh-interval",
            ConfigKey::RequestTimeout => "request-timeout",
            ConfigKey::PageSize => "page-size",
            ConfigKey::ServerPaging => "server-paging",
            ConfigKey::SortField => "sort-field",
            ConfigKey::SortDirection => "sort-direction",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown config key: {s}"))
    }
}

/// Check a page size against the sizes offered to users.
pub fn check_page_size(page_size: usize) -> Result<usize> {
    if PAGE_SIZE_CHOICES.contains(&page_size) {
        Ok(page_size)
    } else {
        Err(Error::Config(format!(
            "page size must be one of {:?}, got {}",
            PAGE_SIZE_CHOICES, page_size
        )))
    }
}

/// Configuration store for managing dashboard settings.
///
/// Handles reading and writing configuration to `~/.servicedash/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.servicedash/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".servicedash").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Get the configuration file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(self.file_error("read", e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("{} is not valid config JSON: {}", self.config_path.display(), e))
        })
    }

    /// Save configuration to disk, replacing the file in one rename.
    pub async fn save(&self, config: &Config) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        let staging = self.config_path.with_extension("json.tmp");

        fs::create_dir_all(self.config_dir())
            .await
            .map_err(|e| self.file_error("create the directory of", e))?;
        write_synced(&staging, content.as_bytes())
            .await
            .map_err(|e| self.file_error("stage", e))?;
        fs::rename(&staging, &self.config_path)
            .await
            .map_err(|e| self.file_error("replace", e))?;

        debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }

    /// Parse `value` for `key`, then load, change and save the file.
    ///
    /// Returns the configuration as written.
    pub async fn set(&self, key: ConfigKey, value: &str) -> Result<Config> {
        let mut config = self.load().await?;
        config.set(key, value)?;
        self.save(&config).await?;
        info!(key = key.as_str(), value, "Updated config");
        Ok(config)
    }

    fn file_error(&self, action: &str, e: std::io::Error) -> Error {
        Error::Config(format!("Failed to {} {}: {}", action, self.config_path.display(), e))
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
