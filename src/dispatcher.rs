//! Authenticated command dispatch.
//!
//! Each action is authorized against the live [`RoomContext`], a fresh token
//! is fetched, authorization is checked again, and only then is exactly one
//! command emitted. Nothing is applied locally; the server echo is the only
//! source of new settings.

use crate::channel::RoomChannel;
use crate::command::{Credentials, OutboundCommand};
use crate::draft::ChangeSet;
use crate::error::{Result, SettingsError};
use crate::identity::CredentialProvider;
use crate::model::{ColorHex, Identity, RoomContext};
use crate::policy::ControlState;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    RoomState(&'a ChangeSet),
    Lock,
    Permanence,
    ClearChat,
}

impl Action<'_> {
    fn label(self) -> &'static str {
        match self {
            Self::RoomState(_) => "save room settings",
            Self::Lock => "toggle lock",
            Self::Permanence => "toggle permanence",
            Self::ClearChat => "clear chat",
        }
    }
}

/// Decide whether `action` may be issued in `ctx`, returning the acting user.
fn authorize(ctx: &RoomContext, action: Action<'_>) -> Result<Identity> {
    let Some(user) = ctx.user.clone() else {
        return Err(SettingsError::Unauthorized(format!(
            "{}: not signed in",
            action.label()
        )));
    };
    let controls = ControlState::evaluate(ctx);

    let denied = match action {
        Action::RoomState(change) => {
            if !controls.admin_visible {
                Some("not the room owner")
            } else if !controls.vanity_enabled && change.vanity != ctx.settings.vanity {
                Some("custom room URLs require a subscription")
            } else if !controls.title_color_enabled && !keeps_title_color(ctx, change) {
                Some("title color requires a subscription")
            } else {
                None
            }
        }
        Action::Lock => (!controls.lock_enabled).then_some("lock is held by someone else"),
        Action::Permanence => {
            (!controls.permanence_enabled).then_some("room is owned by someone else")
        }
        Action::ClearChat => (!controls.clear_chat_enabled).then_some("not the room owner"),
    };

    match denied {
        Some(reason) => Err(SettingsError::Unauthorized(format!(
            "{}: {reason}",
            action.label()
        ))),
        None => Ok(user),
    }
}

fn keeps_title_color(ctx: &RoomContext, change: &ChangeSet) -> bool {
    let current = ctx
        .settings
        .title_color
        .clone()
        .unwrap_or_else(ColorHex::default_title);
    change.room_title_color == current
}

/// Sends authenticated commands on behalf of the signed-in user.
pub struct CommandDispatcher {
    channel: Arc<dyn RoomChannel>,
    credentials: Arc<dyn CredentialProvider>,
    context: watch::Receiver<RoomContext>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher").finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    #[must_use]
    pub fn new(
        channel: Arc<dyn RoomChannel>,
        credentials: Arc<dyn CredentialProvider>,
        context: watch::Receiver<RoomContext>,
    ) -> Self {
        Self {
            channel,
            credentials,
            context,
        }
    }

    /// Send the complete admin change-set as one `setRoomState` command.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Unauthorized`] if the user may not save,
    /// [`SettingsError::Credential`] if no token could be obtained, or
    /// [`SettingsError::Channel`] if the transport is closed. Nothing is
    /// emitted on error.
    pub async fn submit_room_state(&self, change: ChangeSet) -> Result<()> {
        self.dispatch(Action::RoomState(&change), |creds| {
            OutboundCommand::room_state(creds, change.clone())
        })
        .await
    }

    /// Take (`true`) or release (`false`) the playback lock.
    ///
    /// # Errors
    ///
    /// See [`Self::submit_room_state`].
    pub async fn toggle_lock(&self, locked: bool) -> Result<()> {
        self.dispatch(Action::Lock, |creds| OutboundCommand::room_lock(creds, locked))
            .await
    }

    /// Make the room permanent (`true`) or undo it (`false`).
    ///
    /// # Errors
    ///
    /// See [`Self::submit_room_state`].
    pub async fn toggle_permanence(&self, permanent: bool) -> Result<()> {
        let undo = (!permanent).then_some(true);
        self.dispatch(Action::Permanence, |creds| {
            OutboundCommand::room_owner(creds, undo)
        })
        .await
    }

    /// Delete every chat message in the room.
    ///
    /// # Errors
    ///
    /// See [`Self::submit_room_state`].
    pub async fn clear_chat(&self) -> Result<()> {
        self.dispatch(Action::ClearChat, OutboundCommand::clear_chat)
            .await
    }

    async fn dispatch<F>(&self, action: Action<'_>, build: F) -> Result<()>
    where
        F: FnOnce(Credentials) -> Result<OutboundCommand>,
    {
        let identity = authorize(&self.context.borrow(), action)?;

        let token = self
            .credentials
            .id_token(&identity)
            .await
            .map_err(|e| match e {
                SettingsError::Credential(_) => e,
                other => SettingsError::Credential(other.to_string()),
            })
            .inspect_err(|e| {
                tracing::warn!(action = action.label(), error = %e, "credential unavailable; not sending");
            })?;

        // The context may have moved on while the token was being fetched.
        let current = authorize(&self.context.borrow(), action)?;
        if current.uid != identity.uid {
            return Err(SettingsError::Unauthorized(format!(
                "{}: signed-in user changed",
                action.label()
            )));
        }

        let command = build(Credentials::new(identity.uid, &token))?;
        tracing::info!(command = command.name.as_str(), "dispatching room command");
        self.channel.emit(command).await
    }
}
