//! End-to-end settings session scenarios.
//!
//! Each test drives a `SettingsSession` through its public operations and
//! inspects what reaches the outbound channel.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use roomsync::channel::room_channel;
use roomsync::command::{CommandName, OutboundCommand};
use roomsync::dispatcher::CommandDispatcher;
use roomsync::identity::{CredentialProvider, IdToken, SharedTokenProvider};
use roomsync::preferences::{LocalPreferences, PreferenceStore};
use roomsync::resolver::{ResolvedRoom, RoomResolver};
use roomsync::{
    ColorHex, DraftEdit, Identity, RoomContext, RoomSettings, SettingsError, SettingsSession,
    UserId, ValidationStatus,
};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, watch};

struct FreeResolver;

#[async_trait]
impl RoomResolver for FreeResolver {
    async fn resolve(&self, _candidate: &str) -> roomsync::Result<Option<ResolvedRoom>> {
        Ok(None)
    }
}

fn seeded_room() -> RoomSettings {
    RoomSettings {
        room_id: "abc123".to_owned(),
        lock_holder: None,
        owner: Some(UserId::from("owner")),
        password: "hunter2".to_owned(),
        is_chat_disabled: true,
        vanity: "movies".to_owned(),
        title: "Friday".to_owned(),
        description: "weekly screening".to_owned(),
        title_color: Some(ColorHex::parse("#00FF00").unwrap()),
    }
}

fn session_with(
    credentials: Arc<dyn CredentialProvider>,
) -> (SettingsSession, mpsc::Receiver<OutboundCommand>) {
    let (tx, rx) = room_channel(16);
    let session = SettingsSession::new(Arc::new(FreeResolver), credentials, Arc::new(tx));
    (session, rx)
}

fn owner_session() -> (SettingsSession, mpsc::Receiver<OutboundCommand>) {
    let (mut session, rx) =
        session_with(Arc::new(SharedTokenProvider::new(IdToken::new("id-token"))));
    session.set_user(Some(Identity::new("owner")));
    session.set_subscriber(true);
    session.apply_server_state(seeded_room());
    (session, rx)
}

fn drain(rx: &mut mpsc::Receiver<OutboundCommand>) -> Vec<OutboundCommand> {
    let mut out = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        out.push(cmd);
    }
    out
}

#[test]
fn signed_out_user_gets_no_interactive_controls() {
    let (mut session, _rx) = session_with(Arc::new(SharedTokenProvider::default()));
    session.apply_server_state(seeded_room());

    let controls = session.controls();
    assert!(controls.sign_in_required);
    assert!(!controls.lock_enabled);
    assert!(!controls.permanence_enabled);
    assert!(!controls.admin_visible);
    assert!(!controls.vanity_enabled);
    assert!(!controls.clear_chat_enabled);
}

#[tokio::test]
async fn signed_out_lock_toggle_emits_nothing() {
    let (mut session, mut rx) = session_with(Arc::new(SharedTokenProvider::default()));
    session.apply_server_state(RoomSettings::default());

    let err = session.toggle_lock(true).await.unwrap_err();
    assert!(matches!(err, SettingsError::Unauthorized(_)));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn owner_save_sends_whole_change_set_once() {
    let (mut session, mut rx) = owner_session();

    session
        .edit(DraftEdit::Title("Movie Night".to_owned()))
        .unwrap();
    session.edit(DraftEdit::Vanity(String::new())).unwrap();
    assert_eq!(session.validation().status, ValidationStatus::Valid);
    assert!(session.can_save());

    session.save().await.unwrap();
    assert!(!session.is_dirty());

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    let cmd = &sent[0];
    assert_eq!(cmd.name, CommandName::SetRoomState);
    assert_eq!(cmd.name.event_name(), "CMD:setRoomState");
    assert_eq!(
        cmd.payload,
        serde_json::json!({
            "uid": "owner",
            "token": "id-token",
            "vanity": "",
            "password": "hunter2",
            "isChatDisabled": true,
            "roomTitle": "Movie Night",
            "roomDescription": "weekly screening",
            "roomTitleColor": "#00FF00",
        })
    );
}

#[tokio::test]
async fn making_room_permanent_omits_undo() {
    let (mut session, mut rx) = session_with(Arc::new(SharedTokenProvider::new(
        IdToken::new("id-token"),
    )));
    session.set_user(Some(Identity::new("owner")));
    let mut room = seeded_room();
    room.owner = None;
    session.apply_server_state(room);

    session.toggle_permanence(true).await.unwrap();

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, CommandName::SetRoomOwner);
    assert_eq!(
        sent[0].payload,
        serde_json::json!({"uid": "owner", "token": "id-token"})
    );
}

#[tokio::test]
async fn permanence_toggle_leaves_dirty_draft_alone() {
    let (mut session, mut rx) = owner_session();
    session
        .edit(DraftEdit::Description("unsaved".to_owned()))
        .unwrap();

    session.toggle_permanence(false).await.unwrap();

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, CommandName::SetRoomOwner);
    assert_eq!(sent[0].payload["undo"], true);
    assert!(session.is_dirty());
    assert_eq!(session.draft().description, "unsaved");
}

#[test]
fn preferences_default_then_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::new(dir.path().join("preferences.json"));

    let prefs = store.read();
    assert!(!prefs.disable_chat_sound);

    let next = LocalPreferences {
        disable_chat_sound: true,
        ..prefs
    };
    store.write(&next).unwrap();
    assert_eq!(store.read(), next);
}

#[tokio::test]
async fn credential_failure_aborts_save() {
    let (mut session, mut rx) = session_with(Arc::new(SharedTokenProvider::default()));
    session.set_user(Some(Identity::new("owner")));
    session.apply_server_state(seeded_room());
    session
        .edit(DraftEdit::Title("Movie Night".to_owned()))
        .unwrap();

    let err = session.save().await.unwrap_err();
    assert!(matches!(err, SettingsError::Credential(_)));
    assert!(drain(&mut rx).is_empty());
    assert!(session.is_dirty(), "failed save must keep the draft dirty");
}

/// Provider that hands the lock to someone else while the token is fetched.
struct RevokingProvider {
    context: Arc<watch::Sender<RoomContext>>,
}

#[async_trait]
impl CredentialProvider for RevokingProvider {
    async fn id_token(&self, _identity: &Identity) -> roomsync::Result<IdToken> {
        self.context
            .send_modify(|ctx| ctx.settings.lock_holder = Some(UserId::from("someone-else")));
        Ok(IdToken::new("id-token"))
    }
}

#[tokio::test]
async fn authorization_is_rechecked_after_token_fetch() {
    let (ctx_tx, ctx_rx) = watch::channel(RoomContext {
        settings: RoomSettings::default(),
        user: Some(Identity::new("owner")),
        is_subscriber: false,
    });
    let ctx_tx = Arc::new(ctx_tx);
    let (tx, mut rx) = room_channel(4);
    let dispatcher = CommandDispatcher::new(
        Arc::new(tx),
        Arc::new(RevokingProvider {
            context: Arc::clone(&ctx_tx),
        }),
        ctx_rx,
    );

    let err = dispatcher.toggle_lock(true).await.unwrap_err();
    assert!(matches!(err, SettingsError::Unauthorized(_)));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn server_echo_reseeds_and_discards_edits() {
    let (mut session, _rx) = owner_session();
    session.edit(DraftEdit::Title("scratch".to_owned())).unwrap();

    let mut echo = seeded_room();
    echo.title = "Renamed elsewhere".to_owned();
    assert!(session.apply_server_state(echo));
    assert_eq!(session.draft().title, "Renamed elsewhere");
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn non_owner_cannot_clear_chat() {
    let (mut session, mut rx) =
        session_with(Arc::new(SharedTokenProvider::new(IdToken::new("t"))));
    session.set_user(Some(Identity::new("guest")));
    session.apply_server_state(seeded_room());

    assert!(session.clear_chat().await.is_err());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn owner_clears_chat() {
    let (session, mut rx) = owner_session();
    session.clear_chat().await.unwrap();
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name.event_name(), "CMD:deleteChatMessages");
}

/// Resolver that reports every candidate as taken by another room, but only
/// once released. `done` fires as the answer is handed back.
#[derive(Default)]
struct HeldResolver {
    release: Notify,
    done: Notify,
}

#[async_trait]
impl RoomResolver for HeldResolver {
    async fn resolve(&self, candidate: &str) -> roomsync::Result<Option<ResolvedRoom>> {
        self.release.notified().await;
        self.done.notify_one();
        Ok(Some(ResolvedRoom {
            vanity: Some(candidate.to_owned()),
            room_id: Some("/abc123".to_owned()),
        }))
    }
}

#[tokio::test]
async fn server_echo_of_pending_identifier_drops_the_lookup() {
    let resolver = Arc::new(HeldResolver::default());
    let (tx, _rx) = room_channel(4);
    let mut session = SettingsSession::new(
        resolver.clone(),
        Arc::new(SharedTokenProvider::new(IdToken::new("id-token"))),
        Arc::new(tx),
    );
    session.set_user(Some(Identity::new("owner")));
    session.set_subscriber(true);
    session.apply_server_state(seeded_room());

    session.edit(DraftEdit::Vanity("films".to_owned())).unwrap();
    assert_eq!(session.validation().status, ValidationStatus::Pending);

    // The save lands elsewhere and the room now owns "films".
    let mut echo = seeded_room();
    echo.vanity = "films".to_owned();
    session.apply_server_state(echo);
    assert_eq!(session.validation().status, ValidationStatus::Unchecked);

    resolver.release.notify_one();
    resolver.done.notified().await;
    tokio::task::yield_now().await;

    assert_eq!(session.validation().candidate, "films");
    assert_eq!(session.validation().status, ValidationStatus::Unchecked);
    session
        .edit(DraftEdit::Password("s3cret".to_owned()))
        .unwrap();
    assert!(session.can_save());
}
