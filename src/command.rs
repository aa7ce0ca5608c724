//! Outbound room command contract.
//!
//! Every command carries the sender's user id and a fresh identity token.
//! Event names on the wire are prefixed with `CMD:`.

use crate::draft::ChangeSet;
use crate::error::{Result, SettingsError};
use crate::identity::IdToken;
use crate::model::UserId;
use serde::{Deserialize, Serialize};

/// Prefix the room server expects on command event names.
pub const COMMAND_PREFIX: &str = "CMD:";

/// Closed set of commands the engine sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// Bulk admin change-set.
    SetRoomState,
    /// Make the room permanent, or undo it.
    SetRoomOwner,
    /// Take or release the playback lock.
    SetRoomLock,
    /// Delete every chat message in the room.
    ClearChat,
}

impl CommandName {
    /// Command name without the event prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetRoomState => "setRoomState",
            Self::SetRoomOwner => "setRoomOwner",
            Self::SetRoomLock => "lock",
            Self::ClearChat => "deleteChatMessages",
        }
    }

    /// Full event name as emitted on the channel, e.g. `CMD:setRoomState`.
    #[must_use]
    pub fn event_name(self) -> String {
        format!("{COMMAND_PREFIX}{}", self.as_str())
    }

    /// Parse a command name, with or without the `CMD:` prefix.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_prefix(COMMAND_PREFIX).unwrap_or(raw) {
            "setRoomState" => Some(Self::SetRoomState),
            "setRoomOwner" => Some(Self::SetRoomOwner),
            "lock" => Some(Self::SetRoomLock),
            "deleteChatMessages" => Some(Self::ClearChat),
            _ => None,
        }
    }
}

impl Serialize for CommandName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.event_name())
    }
}

impl<'de> Deserialize<'de> for CommandName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown command `{raw}`")))
    }
}

/// Sender identity fields shared by every payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub uid: UserId,
    pub token: String,
}

impl Credentials {
    #[must_use]
    pub fn new(uid: UserId, token: &IdToken) -> Self {
        Self {
            uid,
            token: token.expose().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatePayload {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub change: ChangeSet,
}

/// `undo` is omitted when making the room permanent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOwnerPayload {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomLockPayload {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub locked: bool,
}

/// A command ready for the channel: event name plus JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub name: CommandName,
    pub payload: serde_json::Value,
}

impl OutboundCommand {
    fn build(name: CommandName, payload: &impl Serialize) -> Result<Self> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            SettingsError::InvalidInput(format!("cannot encode {} payload: {e}", name.as_str()))
        })?;
        Ok(Self { name, payload })
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] if the payload cannot be encoded.
    pub fn room_state(credentials: Credentials, change: ChangeSet) -> Result<Self> {
        Self::build(
            CommandName::SetRoomState,
            &RoomStatePayload {
                credentials,
                change,
            },
        )
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] if the payload cannot be encoded.
    pub fn room_owner(credentials: Credentials, undo: Option<bool>) -> Result<Self> {
        Self::build(
            CommandName::SetRoomOwner,
            &RoomOwnerPayload { credentials, undo },
        )
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] if the payload cannot be encoded.
    pub fn room_lock(credentials: Credentials, locked: bool) -> Result<Self> {
        Self::build(
            CommandName::SetRoomLock,
            &RoomLockPayload {
                credentials,
                locked,
            },
        )
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] if the payload cannot be encoded.
    pub fn clear_chat(credentials: Credentials) -> Result<Self> {
        Self::build(CommandName::ClearChat, &credentials)
    }
}
