//! Centralized directory paths for the room settings client.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/roomsync/` | `~/.local/share/roomsync/` |
//! | Config | `~/Library/Application Support/roomsync/` | `~/.config/roomsync/` |
//!
//! # Environment Overrides
//!
//! - `ROOMSYNC_DATA_DIR` overrides [`data_dir`]
//! - `ROOMSYNC_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Local data root. Holds the preference and announcement slots.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ROOMSYNC_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("roomsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/roomsync-data"))
}

/// Config directory holding `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ROOMSYNC_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("roomsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/roomsync-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Local preference slot (`data_dir()/preferences.json`).
#[must_use]
pub fn preferences_file() -> PathBuf {
    data_dir().join("preferences.json")
}

/// Announcement dismissal slot (`data_dir()/announcement.json`).
#[must_use]
pub fn announcement_file() -> PathBuf {
    data_dir().join("announcement.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_files_live_under_data_dir() {
        let data = data_dir();
        assert!(preferences_file().starts_with(&data));
        assert!(announcement_file().starts_with(&data));
        assert!(preferences_file().to_string_lossy().ends_with("preferences.json"));
    }

    #[test]
    fn config_file_ends_with_config_toml() {
        let path = config_file();
        assert!(path.to_string_lossy().ends_with("config.toml"));
        assert!(path.starts_with(config_dir()));
    }
}
