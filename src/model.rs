//! Room settings data model.
//!
//! [`RoomSettings`] is the authoritative, server-owned view of a room. It is
//! only ever replaced by a server echo; client edits go to the draft held by
//! [`crate::draft::DraftManager`].

use crate::error::{Result, SettingsError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Title color used when the owner never picked one.
pub const DEFAULT_TITLE_COLOR: &str = "#FFFFFF";

/// Maximum room title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Maximum room description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 120;

/// Opaque unique id of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// The signed-in user, as supplied by the identity provider.
///
/// Two identities are equal when their ids are equal; the display name is
/// informational only.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Returns `true` when `other` is set and names this user.
    #[must_use]
    pub fn is(&self, other: Option<&UserId>) -> bool {
        other.is_some_and(|id| *id == self.uid)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

/// A `#RRGGBB` color, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorHex(String);

impl ColorHex {
    /// Parse a hex color, accepting either case.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] unless the input is `#` followed
    /// by exactly six hex digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').ok_or_else(|| {
            SettingsError::InvalidInput(format!("color {trimmed:?} must start with '#'"))
        })?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SettingsError::InvalidInput(format!(
                "color {trimmed:?} must be #RRGGBB"
            )));
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    #[must_use]
    pub fn default_title() -> Self {
        Self(DEFAULT_TITLE_COLOR.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ColorHex {
    type Error = SettingsError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<ColorHex> for String {
    fn from(color: ColorHex) -> Self {
        color.0
    }
}

/// Authoritative room configuration as echoed by the server.
///
/// Field names follow the server's camelCase wire format. Missing, `null` or
/// empty values map to the empty defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomSettings {
    /// Generated room id (the part after `/watch/`).
    #[serde(deserialize_with = "nullable_string")]
    pub room_id: String,
    /// Participant currently holding the playback lock.
    #[serde(rename = "lock", deserialize_with = "optional_user_id")]
    pub lock_holder: Option<UserId>,
    /// Participant who made the room permanent.
    #[serde(rename = "owner", deserialize_with = "optional_user_id")]
    pub owner: Option<UserId>,
    #[serde(deserialize_with = "nullable_string")]
    pub password: String,
    pub is_chat_disabled: bool,
    #[serde(deserialize_with = "nullable_string")]
    pub vanity: String,
    #[serde(rename = "roomTitle", deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(rename = "roomDescription", deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(rename = "roomTitleColor", deserialize_with = "optional_color")]
    pub title_color: Option<ColorHex>,
}

impl RoomSettings {
    /// The identifier the room is currently reachable under: its vanity when
    /// one is assigned, otherwise the generated id.
    #[must_use]
    pub fn public_id(&self) -> &str {
        if self.vanity.is_empty() {
            &self.room_id
        } else {
            &self.vanity
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_holder.is_some()
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.owner.is_some()
    }
}

/// Everything an authorization decision needs, passed explicitly from the
/// session into the policy and dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomContext {
    pub settings: RoomSettings,
    pub user: Option<Identity>,
    pub is_subscriber: bool,
}

/// Truncate `value` to at most `max` characters on a char boundary.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => value[..cut].to_owned(),
        None => value.to_owned(),
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_user_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<UserId>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|raw| !raw.is_empty())
        .map(UserId::new))
}

// The server stores whatever the last client sent; an unparseable color is
// treated as unset rather than rejecting the whole echo.
fn optional_color<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<ColorHex>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        if raw.is_empty() {
            return None;
        }
        match ColorHex::parse(&raw) {
            Ok(color) => Some(color),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed room title color");
                None
            }
        }
    }))
}
