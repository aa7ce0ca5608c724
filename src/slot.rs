//! Single-file JSON slots for client-local state.
//!
//! A slot holds one serialized value. Reads never fail: a missing or
//! unparseable file yields `T::default()`. Writes replace the whole file and
//! report failures to the caller.

use crate::error::{Result, SettingsError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A named on-disk slot storing one `T` as JSON.
#[derive(Debug, Clone)]
pub struct JsonSlot<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored value, or the default if the slot is empty or corrupt.
    pub fn read(&self) -> T {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(
                        path = %self.path.display(),
                        error = %e,
                        "slot unreadable; using defaults"
                    );
                }
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "slot corrupt; using defaults"
                );
                T::default()
            }
        }
    }

    /// Replace the stored value wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Persistence`] if the value cannot be
    /// serialized or the file cannot be written.
    pub fn write(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::Persistence(format!(
                    "cannot create slot directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| SettingsError::Persistence(format!("cannot serialize slot: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| {
            SettingsError::Persistence(format!(
                "cannot write slot to {}: {e}",
                self.path.display()
            ))
        })
    }
}
