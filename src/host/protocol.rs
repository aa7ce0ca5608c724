//! Newline-delimited JSON messages exchanged with the driving shell.
//!
//! Inputs carry UI actions and server events; outputs carry outbound room
//! commands plus state the shell renders.

use crate::announce::Announcement;
use crate::command::OutboundCommand;
use crate::draft::{AdminDraft, DraftEdit};
use crate::model::RoomSettings;
use crate::policy::ControlState;
use crate::validator::ValidationState;
use serde::{Deserialize, Serialize};

/// One line read from the shell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostInput {
    /// Authoritative settings echoed by the room server.
    RoomState { settings: RoomSettings },
    #[serde(rename_all = "camelCase")]
    SignIn {
        uid: String,
        token: String,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(default)]
        subscriber: bool,
    },
    SignOut,
    Edit { edit: DraftEdit },
    Save,
    ToggleLock { locked: bool },
    TogglePermanence { permanent: bool },
    ClearChat,
    SetChatSound { disabled: bool },
    DismissAnnouncement { number: u64 },
    /// Ask for a fresh `state` output.
    Query,
    Shutdown,
}

/// Draft-related view state pushed after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub controls: ControlState,
    pub draft: DraftView,
    pub dirty: bool,
    pub can_save: bool,
    pub validation: ValidationState,
}

/// Draft without the password; the shell already knows what was typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub vanity: String,
    pub has_password: bool,
    pub is_chat_disabled: bool,
    pub room_title: String,
    pub room_description: String,
    pub room_title_color: Option<String>,
}

impl From<&AdminDraft> for DraftView {
    fn from(d: &AdminDraft) -> Self {
        Self {
            vanity: d.vanity.clone(),
            has_password: !d.password.is_empty(),
            is_chat_disabled: d.is_chat_disabled,
            room_title: d.title.clone(),
            room_description: d.description.clone(),
            room_title_color: d.title_color.as_ref().map(|c| c.as_str().to_owned()),
        }
    }
}

/// One line written to the shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostOutput {
    /// Forward to the room server as `event` with `payload`.
    Command {
        event: String,
        payload: serde_json::Value,
    },
    State(StateView),
    Validation(ValidationState),
    #[serde(rename_all = "camelCase")]
    Preferences { disable_chat_sound: bool },
    Announcement(Announcement),
    Error { message: String },
}

impl From<OutboundCommand> for HostOutput {
    fn from(cmd: OutboundCommand) -> Self {
        Self::Command {
            event: cmd.name.event_name(),
            payload: cmd.payload,
        }
    }
}

impl HostOutput {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
