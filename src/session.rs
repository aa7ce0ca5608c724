//! The settings session: one room, one signed-in user, one draft.
//!
//! The session owns the [`RoomContext`] and publishes it on a watch channel
//! so the dispatcher always re-checks authorization against the latest
//! snapshot. All mutation goes through the named operations below.

use crate::channel::RoomChannel;
use crate::dispatcher::CommandDispatcher;
use crate::draft::{AdminDraft, DraftEdit, DraftManager};
use crate::error::{Result, SettingsError};
use crate::identity::CredentialProvider;
use crate::model::{Identity, RoomContext, RoomSettings};
use crate::policy::ControlState;
use crate::resolver::RoomResolver;
use crate::validator::{ValidationState, VanityValidator};
use std::sync::Arc;
use tokio::sync::watch;

/// Settings engine for a single room.
pub struct SettingsSession {
    context: watch::Sender<RoomContext>,
    draft: DraftManager,
    validator: Arc<VanityValidator>,
    dispatcher: CommandDispatcher,
}

impl std::fmt::Debug for SettingsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsSession")
            .field("room", &self.context.borrow().settings.room_id)
            .field("dirty", &self.draft.is_dirty())
            .field("validation", &self.validator.state())
            .finish()
    }
}

impl SettingsSession {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn RoomResolver>,
        credentials: Arc<dyn CredentialProvider>,
        channel: Arc<dyn RoomChannel>,
    ) -> Self {
        let (context, context_rx) = watch::channel(RoomContext::default());
        Self {
            context,
            draft: DraftManager::default(),
            validator: Arc::new(VanityValidator::new(resolver)),
            dispatcher: CommandDispatcher::new(channel, credentials, context_rx),
        }
    }

    /// Snapshot of the current context.
    #[must_use]
    pub fn context(&self) -> RoomContext {
        self.context.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_context(&self) -> watch::Receiver<RoomContext> {
        self.context.subscribe()
    }

    /// Replace the authoritative settings with a server echo and re-seed the
    /// draft. Returns `true` if unsaved edits were discarded.
    pub fn apply_server_state(&mut self, settings: RoomSettings) -> bool {
        let discarded = self.draft.is_dirty();
        if discarded {
            tracing::warn!(
                room = %settings.room_id,
                "server state replaced the draft; unsaved edits discarded"
            );
        }
        self.draft.seed(&settings);
        self.validator.reset(&settings.vanity);
        self.context.send_modify(|ctx| ctx.settings = settings);
        discarded
    }

    /// Set or clear the signed-in user.
    pub fn set_user(&mut self, user: Option<Identity>) {
        tracing::debug!(signed_in = user.is_some(), "session user changed");
        self.context.send_modify(|ctx| ctx.user = user);
    }

    pub fn set_subscriber(&mut self, is_subscriber: bool) {
        self.context.send_modify(|ctx| ctx.is_subscriber = is_subscriber);
    }

    #[must_use]
    pub fn controls(&self) -> ControlState {
        ControlState::evaluate(&self.context.borrow())
    }

    #[must_use]
    pub fn draft(&self) -> &AdminDraft {
        self.draft.draft()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.draft.is_dirty()
    }

    #[must_use]
    pub fn validation(&self) -> ValidationState {
        self.validator.state()
    }

    #[must_use]
    pub fn subscribe_validation(&self) -> watch::Receiver<ValidationState> {
        self.validator.subscribe()
    }

    /// Apply one edit to the draft. Identifier edits start a background
    /// availability check against the room's current public id.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Unauthorized`] if the field is not editable,
    /// or [`SettingsError::Runtime`] if a non-empty identifier is edited
    /// outside a tokio runtime. The draft is unchanged on error.
    pub fn edit(&mut self, edit: DraftEdit) -> Result<&AdminDraft> {
        let controls = self.controls();
        let allowed = match edit {
            DraftEdit::Vanity(_) => controls.vanity_enabled,
            DraftEdit::TitleColor(_) => controls.title_color_enabled,
            _ => controls.admin_visible,
        };
        if !allowed {
            return Err(SettingsError::Unauthorized(format!(
                "{} is not editable",
                edit.field_name()
            )));
        }

        if let DraftEdit::Vanity(candidate) = &edit {
            let current = self.context.borrow().settings.public_id().to_owned();
            // The handle is not kept; the outcome lands on the validation watch.
            let _ = self.validator.spawn_validate(candidate, &current)?;
        }
        Ok(self.draft.edit(edit))
    }

    /// Whether the save control is enabled right now.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.controls().admin_visible
            && self.draft.is_dirty()
            && self.validator.state().status.allows_save()
    }

    /// Commit the draft and send it as one `setRoomState` command.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidInput`] if there is nothing to save or
    /// the identifier is not known to be available, otherwise whatever the
    /// dispatcher reports. The draft stays dirty on error.
    pub async fn save(&mut self) -> Result<()> {
        if !self.draft.is_dirty() {
            return Err(SettingsError::InvalidInput("no unsaved changes".to_owned()));
        }
        let validation = self.validator.state();
        if !validation.status.allows_save() {
            return Err(SettingsError::InvalidInput(format!(
                "room URL `{}` is {:?}",
                validation.candidate, validation.status
            )));
        }

        let change = self.draft.commit();
        self.dispatcher.submit_room_state(change).await?;
        self.draft.mark_saved();
        Ok(())
    }

    /// # Errors
    ///
    /// See [`CommandDispatcher::toggle_lock`].
    pub async fn toggle_lock(&self, locked: bool) -> Result<()> {
        self.dispatcher.toggle_lock(locked).await
    }

    /// Independent of any pending draft edits.
    ///
    /// # Errors
    ///
    /// See [`CommandDispatcher::toggle_permanence`].
    pub async fn toggle_permanence(&self, permanent: bool) -> Result<()> {
        self.dispatcher.toggle_permanence(permanent).await
    }

    /// # Errors
    ///
    /// See [`CommandDispatcher::clear_chat`].
    pub async fn clear_chat(&self) -> Result<()> {
        self.dispatcher.clear_chat().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::channel::room_channel;
    use crate::identity::{IdToken, SharedTokenProvider};
    use crate::model::UserId;
    use crate::resolver::ResolvedRoom;
    use crate::validator::ValidationStatus;
    use async_trait::async_trait;

    struct FreeResolver;

    #[async_trait]
    impl RoomResolver for FreeResolver {
        async fn resolve(&self, _candidate: &str) -> Result<Option<ResolvedRoom>> {
            Ok(None)
        }
    }

    fn session() -> SettingsSession {
        let (tx, _rx) = room_channel(8);
        SettingsSession::new(
            Arc::new(FreeResolver),
            Arc::new(SharedTokenProvider::new(IdToken::new("tok"))),
            Arc::new(tx),
        )
    }

    fn owned_room() -> RoomSettings {
        RoomSettings {
            room_id: "abc".to_owned(),
            owner: Some(UserId::from("u1")),
            title: "Friday".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn reseed_reports_discarded_edits() {
        let mut session = session();
        session.set_user(Some(Identity::new("u1")));
        assert!(!session.apply_server_state(owned_room()));

        session.edit(DraftEdit::Title("scratch".to_owned())).unwrap();
        assert!(session.apply_server_state(owned_room()));
        assert_eq!(session.draft().title, "Friday");
        assert!(!session.is_dirty());
    }

    #[test]
    fn non_owner_edits_are_refused() {
        let mut session = session();
        session.set_user(Some(Identity::new("u2")));
        session.apply_server_state(owned_room());
        let err = session
            .edit(DraftEdit::Title("mine now".to_owned()))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Unauthorized(_)));
        assert!(!session.is_dirty());
    }

    #[test]
    fn title_color_needs_subscription() {
        let mut session = session();
        session.set_user(Some(Identity::new("u1")));
        session.apply_server_state(owned_room());
        let color = crate::model::ColorHex::parse("#FF0000").unwrap();
        assert!(session.edit(DraftEdit::TitleColor(color.clone())).is_err());

        session.set_subscriber(true);
        assert!(session.edit(DraftEdit::TitleColor(color)).is_ok());
    }

    #[test]
    fn identifier_edit_outside_runtime_is_refused() {
        let mut session = session();
        session.set_user(Some(Identity::new("u1")));
        session.set_subscriber(true);
        session.apply_server_state(owned_room());

        let err = session
            .edit(DraftEdit::Vanity("films".to_owned()))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Runtime(_)));
        assert!(!session.is_dirty());
        assert_eq!(session.validation().status, ValidationStatus::Unchecked);

        session.edit(DraftEdit::Vanity(String::new())).unwrap();
        assert!(session.can_save());
    }

    #[tokio::test]
    async fn save_without_edits_is_rejected() {
        let mut session = session();
        session.set_user(Some(Identity::new("u1")));
        session.apply_server_state(owned_room());
        assert!(!session.can_save());
        let err = session.save().await.unwrap_err();
        assert!(matches!(err, SettingsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn pending_identifier_blocks_save() {
        let mut session = session();
        session.set_user(Some(Identity::new("u1")));
        session.set_subscriber(true);
        session.apply_server_state(owned_room());

        session.edit(DraftEdit::Vanity("films".to_owned())).unwrap();
        // Pending until the spawned lookup has run.
        assert!(!session.can_save());

        let mut rx = session.subscribe_validation();
        rx.wait_for(|s| s.status.allows_save()).await.unwrap();
        assert!(session.can_save());
    }
}
