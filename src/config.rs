//! Configuration for the room settings client.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Room server endpoints.
    pub server: ServerConfig,
    /// In-process channel sizing.
    pub channel: ChannelConfig,
    /// Announcement banner lookup.
    pub announcements: AnnouncementConfig,
}

/// Room server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the room server (serves `/resolveRoom/{id}`).
    pub base_url: String,
    /// Timeout for a single identifier lookup, in seconds. `0` disables it.
    pub lookup_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            lookup_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Lookup timeout as a [`Duration`], or `None` when disabled.
    #[must_use]
    pub fn lookup_timeout(&self) -> Option<Duration> {
        (self.lookup_timeout_secs > 0).then(|| Duration::from_secs(self.lookup_timeout_secs))
    }
}

/// Channel capacities for the host bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Outbound command queue capacity.
    pub outbound_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 64,
        }
    }
}

/// Which announcement label to follow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    /// Production builds follow the `release` label.
    #[default]
    Release,
    /// Development builds follow the `test` label.
    Development,
}

impl ReleaseChannel {
    /// Issue tracker label this channel filters on.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Development => "test",
        }
    }
}

/// Announcement lookup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Whether the shell should check for announcements at all.
    pub enabled: bool,
    /// Issue tracker API base URL.
    pub api_base_url: String,
    /// `owner/name` of the announcements repository.
    pub repo: String,
    pub channel: ReleaseChannel,
    /// Announcements older than this many days are not surfaced.
    pub recency_days: i64,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base_url: "https://api.github.com".to_owned(),
            repo: "howardchung/watchparty-announcements".to_owned(),
            channel: ReleaseChannel::default(),
            recency_days: 7,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SettingsError::Config(e.to_string()))
    }

    /// Load from `path` when it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> crate::error::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SettingsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (`config_dir()/config.toml`).
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(!config.server.base_url.is_empty());
        assert!(config.channel.outbound_capacity > 0);
        assert_eq!(config.announcements.recency_days, 7);
        assert_eq!(config.announcements.channel.label(), "release");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.server.base_url = "https://rooms.example".to_owned();
        config.announcements.channel = ReleaseChannel::Development;

        config.save_to_file(&path).unwrap();
        let loaded = ClientConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.announcements.channel.label(), "test");
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            ClientConfig::from_file(&path),
            Err(crate::error::SettingsError::Config(_))
        ));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str("[server]\nlookup_timeout_secs = 0\n").unwrap();
        assert_eq!(config.server.lookup_timeout(), None);
        assert_eq!(config.server.base_url, ServerConfig::default().base_url);
    }
}
