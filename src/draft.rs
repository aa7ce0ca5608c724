//! Draft reconciliation for admin-only room settings.
//!
//! The draft shadows the owner-editable subset of [`RoomSettings`]. It is
//! replaced wholesale on every server echo and committed as a complete
//! change-set; the server applies a change-set as a whole-object replace, so
//! no per-field diff is ever computed.

use crate::model::{
    ColorHex, DESCRIPTION_MAX_CHARS, RoomSettings, TITLE_MAX_CHARS, truncate_chars,
};
use serde::{Deserialize, Serialize};

/// Owner-editable projection of [`RoomSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDraft {
    pub vanity: String,
    pub password: String,
    pub is_chat_disabled: bool,
    pub title: String,
    pub description: String,
    pub title_color: Option<ColorHex>,
}

impl AdminDraft {
    #[must_use]
    pub fn from_settings(settings: &RoomSettings) -> Self {
        Self {
            vanity: settings.vanity.clone(),
            password: settings.password.clone(),
            is_chat_disabled: settings.is_chat_disabled,
            title: settings.title.clone(),
            description: settings.description.clone(),
            title_color: settings.title_color.clone(),
        }
    }
}

/// One user edit to a single draft field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum DraftEdit {
    Vanity(String),
    Password(String),
    ChatDisabled(bool),
    Title(String),
    Description(String),
    TitleColor(ColorHex),
}

impl DraftEdit {
    /// Field name for logs; never includes the value.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Vanity(_) => "vanity",
            Self::Password(_) => "password",
            Self::ChatDisabled(_) => "isChatDisabled",
            Self::Title(_) => "roomTitle",
            Self::Description(_) => "roomDescription",
            Self::TitleColor(_) => "roomTitleColor",
        }
    }
}

/// Complete set of admin fields transmitted on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub vanity: String,
    pub password: String,
    pub is_chat_disabled: bool,
    pub room_title: String,
    pub room_description: String,
    pub room_title_color: ColorHex,
}

/// Holds the draft and its dirty flag.
#[derive(Debug, Clone, Default)]
pub struct DraftManager {
    draft: AdminDraft,
    dirty: bool,
}

impl DraftManager {
    #[must_use]
    pub fn new(settings: &RoomSettings) -> Self {
        Self {
            draft: AdminDraft::from_settings(settings),
            dirty: false,
        }
    }

    /// Replace the draft with the projection of `settings`.
    ///
    /// Unsaved edits are discarded; callers that care should check
    /// [`Self::is_dirty`] first.
    pub fn seed(&mut self, settings: &RoomSettings) -> &AdminDraft {
        self.draft = AdminDraft::from_settings(settings);
        self.dirty = false;
        &self.draft
    }

    /// Apply one field edit. Always marks the draft dirty, even when the new
    /// value equals the old one.
    pub fn edit(&mut self, edit: DraftEdit) -> &AdminDraft {
        match edit {
            DraftEdit::Vanity(value) => self.draft.vanity = value,
            DraftEdit::Password(value) => self.draft.password = value,
            DraftEdit::ChatDisabled(value) => self.draft.is_chat_disabled = value,
            DraftEdit::Title(value) => self.draft.title = truncate_chars(&value, TITLE_MAX_CHARS),
            DraftEdit::Description(value) => {
                self.draft.description = truncate_chars(&value, DESCRIPTION_MAX_CHARS);
            }
            DraftEdit::TitleColor(value) => self.draft.title_color = Some(value),
        }
        self.dirty = true;
        &self.draft
    }

    #[must_use]
    pub fn draft(&self) -> &AdminDraft {
        &self.draft
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Package the whole draft for transmission. Does not clear the dirty
    /// flag; see [`Self::mark_saved`].
    #[must_use]
    pub fn commit(&self) -> ChangeSet {
        ChangeSet {
            vanity: self.draft.vanity.clone(),
            password: self.draft.password.clone(),
            is_chat_disabled: self.draft.is_chat_disabled,
            room_title: self.draft.title.clone(),
            room_description: self.draft.description.clone(),
            room_title_color: self
                .draft
                .title_color
                .clone()
                .unwrap_or_else(ColorHex::default_title),
        }
    }

    /// Clear the dirty flag once a change-set has been handed to the channel.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
