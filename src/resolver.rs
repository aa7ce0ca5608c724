//! Room identifier lookup.
//!
//! The room server answers `GET /resolveRoom/{id}` with the room currently
//! bound to `id`, or an empty body / `null` when the id is free.

use crate::config::ServerConfig;
use crate::error::{Result, SettingsError};
use async_trait::async_trait;
use serde::Deserialize;

/// Existence record returned by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolvedRoom {
    /// Vanity identifier bound to the room, if any.
    pub vanity: Option<String>,
    /// Generated room id.
    pub room_id: Option<String>,
}

/// Looks up whether a room identifier is already taken.
#[async_trait]
pub trait RoomResolver: Send + Sync {
    /// Returns `Ok(None)` when no room is bound to `candidate`.
    async fn resolve(&self, candidate: &str) -> Result<Option<ResolvedRoom>>;
}

/// [`RoomResolver`] backed by the room server's HTTP endpoint.
pub struct HttpRoomResolver {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRoomResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRoomResolver")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpRoomResolver {
    /// Create a resolver for `base_url` with no request timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a resolver from the server section of the client config.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.lookup_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SettingsError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn lookup_url(&self, candidate: &str) -> String {
        format!(
            "{}/resolveRoom/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(candidate)
        )
    }
}

#[async_trait]
impl RoomResolver for HttpRoomResolver {
    async fn resolve(&self, candidate: &str) -> Result<Option<ResolvedRoom>> {
        let url = self.lookup_url(candidate);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SettingsError::Lookup(format!("resolveRoom request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettingsError::Lookup(format!(
                "resolveRoom returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SettingsError::Lookup(format!("resolveRoom body unreadable: {e}")))?;
        parse_lookup_body(&body)
    }
}

/// Parse a lookup response body. Empty and `null` bodies mean "free".
///
/// # Errors
///
/// Returns [`SettingsError::Lookup`] if the body is not a JSON object or null.
pub fn parse_lookup_body(body: &str) -> Result<Option<ResolvedRoom>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<ResolvedRoom>>(trimmed)
        .map_err(|e| SettingsError::Lookup(format!("malformed resolveRoom body: {e}")))
}
