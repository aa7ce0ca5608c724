//! Client-local preferences.
//!
//! Preferences are never room-scoped and never sent to the server. The store
//! does no merging of its own: callers read, change a field, and write the
//! whole value back (or use [`PreferenceStore::update`]).

use crate::error::Result;
use crate::slot::JsonSlot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted client preferences.
///
/// Keys this version does not know about are kept in `extra` so a
/// read-merge-write cycle never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalPreferences {
    /// Suppress the chat notification sound while the tab is in the background.
    pub disable_chat_sound: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Preference store backed by a single JSON slot.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    slot: JsonSlot<LocalPreferences>,
}

impl PreferenceStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: JsonSlot::new(path),
        }
    }

    /// Store at the platform default location (`data_dir()/preferences.json`).
    #[must_use]
    pub fn open_default() -> Self {
        Self::new(crate::paths::preferences_file())
    }

    /// Current preferences; defaults when nothing valid has been stored.
    #[must_use]
    pub fn read(&self) -> LocalPreferences {
        self.slot.read()
    }

    /// Replace the stored preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be serialized or written.
    pub fn write(&self, next: &LocalPreferences) -> Result<()> {
        self.slot.write(next)
    }

    /// Read, apply `change`, and write the merged result back.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged preferences cannot be written.
    pub fn update<F>(&self, change: F) -> Result<LocalPreferences>
    where
        F: FnOnce(&mut LocalPreferences),
    {
        let mut prefs = self.read();
        change(&mut prefs);
        self.write(&prefs)?;
        Ok(prefs)
    }

    /// Toggle the chat notification sound preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be written.
    pub fn set_chat_sound_disabled(&self, disabled: bool) -> Result<LocalPreferences> {
        let prefs = self.update(|prefs| prefs.disable_chat_sound = disabled)?;
        tracing::debug!(disabled, "chat sound preference updated");
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn store() -> (tempfile::TempDir, PreferenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("preferences.json"));
        (dir, store)
    }

    #[test]
    fn unwritten_store_reads_defaults() {
        let (_dir, store) = store();
        let prefs = store.read();
        assert!(!prefs.disable_chat_sound);
        assert!(prefs.extra.is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = store();
        let mut prefs = LocalPreferences {
            disable_chat_sound: true,
            ..Default::default()
        };
        prefs
            .extra
            .insert("volume".to_owned(), serde_json::json!(0.5));
        store.write(&prefs).unwrap();
        assert_eq!(store.read(), prefs);
    }

    #[test]
    fn corrupt_blob_falls_back_to_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.slot.path(), r#"{"disableChatSound": "yes"}"#).unwrap();
        assert_eq!(store.read(), LocalPreferences::default());
    }

    #[test]
    fn update_preserves_unknown_keys() {
        let (_dir, store) = store();
        std::fs::write(
            store.slot.path(),
            r#"{"disableChatSound": false, "theme": "dark"}"#,
        )
        .unwrap();

        let prefs = store.set_chat_sound_disabled(true).unwrap();
        assert!(prefs.disable_chat_sound);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.slot.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["disableChatSound"], true);
    }

    #[test]
    fn serialized_key_is_camel_case() {
        let json = serde_json::to_string(&LocalPreferences::default()).unwrap();
        assert_eq!(json, r#"{"disableChatSound":false}"#);
    }
}
