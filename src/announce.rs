//! Product announcements.
//!
//! Announcements are issues in a public tracker repository, labelled per
//! release channel. At most one (the newest) is considered; it is surfaced
//! when it is newer than the last one the user dismissed and was updated
//! within the recency window.

use crate::config::AnnouncementConfig;
use crate::error::{Result, SettingsError};
use crate::slot::JsonSlot;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One announcement as returned by the issue search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Announcement>,
}

/// Persisted dismissal threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismissalState {
    /// Number of the last dismissed announcement.
    pub dismissed: Option<u64>,
}

/// Whether `item` should be shown. A missing threshold counts as zero.
#[must_use]
pub fn should_surface(
    item: &Announcement,
    dismissed: Option<u64>,
    now: DateTime<Utc>,
    recency_days: i64,
) -> bool {
    let window = Duration::days(recency_days.clamp(0, 3650));
    item.number > dismissed.unwrap_or(0) && item.updated_at > now - window
}

/// Fetches announcements and tracks dismissals.
pub struct AnnouncementClient {
    config: AnnouncementConfig,
    client: reqwest::Client,
    dismissals: JsonSlot<DismissalState>,
}

impl std::fmt::Debug for AnnouncementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnouncementClient")
            .field("config", &self.config)
            .field("dismissals", &self.dismissals.path())
            .finish()
    }
}

impl AnnouncementClient {
    /// # Errors
    ///
    /// Returns [`SettingsError::Config`] if the HTTP client cannot be built.
    pub fn new(config: AnnouncementConfig, dismissals: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("roomsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SettingsError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            dismissals: JsonSlot::new(dismissals),
        })
    }

    /// Client storing dismissals at `data_dir()/announcement.json`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn with_default_store(config: AnnouncementConfig) -> Result<Self> {
        Self::new(config, crate::paths::announcement_file())
    }

    fn search_url(&self) -> String {
        let query = format!(
            "repo:{} label:{}",
            self.config.repo,
            self.config.channel.label()
        );
        format!(
            "{}/search/issues?q={}&order=desc&page=1&per_page=1",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&query)
        )
    }

    /// Fetch the newest announcement for the configured channel.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Lookup`] on transport failure, non-2xx status
    /// or an unparseable response.
    pub async fn latest(&self) -> Result<Option<Announcement>> {
        let response = self
            .client
            .get(self.search_url())
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| SettingsError::Lookup(format!("announcement search failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettingsError::Lookup(format!(
                "announcement search returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            SettingsError::Lookup(format!("malformed announcement response: {e}"))
        })?;
        Ok(body.items.into_iter().next())
    }

    /// The announcement to show right now, if any.
    ///
    /// # Errors
    ///
    /// See [`Self::latest`].
    pub async fn pending(&self, now: DateTime<Utc>) -> Result<Option<Announcement>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let dismissed = self.dismissals.read().dismissed;
        let surfaced = self
            .latest()
            .await?
            .filter(|item| should_surface(item, dismissed, now, self.config.recency_days));
        if let Some(item) = &surfaced {
            tracing::info!(number = item.number, "announcement available");
        }
        Ok(surfaced)
    }

    /// Remember that `number` was dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Persistence`] if the threshold cannot be saved.
    pub fn dismiss(&self, number: u64) -> Result<()> {
        self.dismissals.write(&DismissalState {
            dismissed: Some(number),
        })
    }

    #[must_use]
    pub fn dismissed(&self) -> Option<u64> {
        self.dismissals.read().dismissed
    }
}
