//! Stdin/stdout JSON bridge driving a [`SettingsSession`].
//!
//! Reads newline-delimited [`HostInput`] messages, applies them to the
//! session, and writes [`HostOutput`] messages as newline-delimited JSON.
//! Outbound room commands are forwarded from the session's channel as
//! `command` lines for the shell to relay to the room server.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use crate::announce::AnnouncementClient;
use crate::channel::room_channel;
use crate::command::OutboundCommand;
use crate::config::ClientConfig;
use crate::error::{Result, SettingsError};
use crate::host::protocol::{DraftView, HostInput, HostOutput, StateView};
use crate::identity::{IdToken, SharedTokenProvider};
use crate::model::Identity;
use crate::preferences::PreferenceStore;
use crate::resolver::HttpRoomResolver;
use crate::session::SettingsSession;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};

type SharedWriter<W> = Arc<Mutex<W>>;

/// Session plus the shell-facing collaborators it needs.
pub struct HostBridge {
    session: SettingsSession,
    tokens: Arc<SharedTokenProvider>,
    preferences: PreferenceStore,
    announcements: Option<Arc<AnnouncementClient>>,
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl HostBridge {
    #[must_use]
    pub fn new(
        session: SettingsSession,
        tokens: Arc<SharedTokenProvider>,
        preferences: PreferenceStore,
        announcements: Option<AnnouncementClient>,
    ) -> Self {
        Self {
            session,
            tokens,
            preferences,
            announcements: announcements.map(Arc::new),
        }
    }

    /// Wire a bridge from configuration: HTTP resolver, default preference
    /// and announcement slots. Returns the receiving end of the command
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Config`] if an HTTP client cannot be built.
    pub fn from_config(
        config: &ClientConfig,
    ) -> Result<(Self, mpsc::Receiver<OutboundCommand>)> {
        let resolver = Arc::new(HttpRoomResolver::from_config(&config.server)?);
        let tokens = Arc::new(SharedTokenProvider::default());
        let (tx, rx) = room_channel(config.channel.outbound_capacity);
        let session = SettingsSession::new(resolver, tokens.clone(), Arc::new(tx));
        let announcements = if config.announcements.enabled {
            Some(AnnouncementClient::with_default_store(
                config.announcements.clone(),
            )?)
        } else {
            None
        };
        Ok((
            Self::new(session, tokens, PreferenceStore::open_default(), announcements),
            rx,
        ))
    }

    #[must_use]
    pub fn session(&self) -> &SettingsSession {
        &self.session
    }

    fn state_output(&self) -> HostOutput {
        HostOutput::State(StateView {
            controls: self.session.controls(),
            draft: DraftView::from(self.session.draft()),
            dirty: self.session.is_dirty(),
            can_save: self.session.can_save(),
            validation: self.session.validation(),
        })
    }

    fn preferences_output(&self) -> HostOutput {
        HostOutput::Preferences {
            disable_chat_sound: self.preferences.read().disable_chat_sound,
        }
    }

    /// Apply one input and return the lines to write back.
    pub async fn handle(&mut self, input: HostInput) -> Vec<HostOutput> {
        let outcome = match input {
            HostInput::RoomState { settings } => {
                self.session.apply_server_state(settings);
                Ok(())
            }
            HostInput::SignIn {
                uid,
                token,
                display_name,
                subscriber,
            } => {
                self.tokens.set(Some(IdToken::new(token)));
                let mut identity = Identity::new(uid);
                if let Some(name) = display_name {
                    identity = identity.with_display_name(name);
                }
                self.session.set_user(Some(identity));
                self.session.set_subscriber(subscriber);
                Ok(())
            }
            HostInput::SignOut => {
                self.tokens.set(None);
                self.session.set_user(None);
                self.session.set_subscriber(false);
                Ok(())
            }
            HostInput::Edit { edit } => self.session.edit(edit).map(|_| ()),
            HostInput::Save => self.session.save().await,
            HostInput::ToggleLock { locked } => self.session.toggle_lock(locked).await,
            HostInput::TogglePermanence { permanent } => {
                self.session.toggle_permanence(permanent).await
            }
            HostInput::ClearChat => self.session.clear_chat().await,
            HostInput::SetChatSound { disabled } => {
                return match self.preferences.set_chat_sound_disabled(disabled) {
                    Ok(_) => vec![self.preferences_output()],
                    Err(e) => vec![HostOutput::error(e.to_string())],
                };
            }
            HostInput::DismissAnnouncement { number } => {
                return match &self.announcements {
                    Some(client) => match client.dismiss(number) {
                        Ok(()) => Vec::new(),
                        Err(e) => vec![HostOutput::error(e.to_string())],
                    },
                    None => Vec::new(),
                };
            }
            HostInput::Query => return vec![self.state_output(), self.preferences_output()],
            HostInput::Shutdown => return Vec::new(),
        };

        let mut out = Vec::with_capacity(2);
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "host input rejected");
            out.push(HostOutput::error(e.to_string()));
        }
        out.push(self.state_output());
        out
    }
}

/// Run the bridge over stdin/stdout until stdin closes or a `shutdown`
/// input is received.
///
/// # Errors
///
/// Returns an error if the bridge cannot be built or stdio fails.
pub async fn run_stdio_bridge(config: &ClientConfig) -> Result<()> {
    let (bridge, commands) = HostBridge::from_config(config)?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::BufWriter::new(tokio::io::stdout());
    run_bridge(bridge, commands, stdin, stdout).await
}

/// Drive `bridge` from `reader`, writing every output line to `writer`.
///
/// Besides the reader loop, two tasks run alongside: a forwarder for
/// outbound commands and a forwarder for validation updates that land
/// after a background lookup completes. An announcement check is spawned
/// once at start when configured.
///
/// # Errors
///
/// Returns [`SettingsError::Channel`] on I/O failure.
pub async fn run_bridge<R, W>(
    mut bridge: HostBridge,
    mut commands: mpsc::Receiver<OutboundCommand>,
    reader: R,
    writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer: SharedWriter<W> = Arc::new(Mutex::new(writer));

    let command_writer = Arc::clone(&writer);
    let command_handle = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            if let Err(e) = write_output(&command_writer, &HostOutput::from(command)).await {
                tracing::warn!(error = %e, "failed to forward command; stopping forwarder");
                break;
            }
        }
    });

    let validation_writer = Arc::clone(&writer);
    let mut validation_rx = bridge.session.subscribe_validation();
    let validation_handle = tokio::spawn(async move {
        while validation_rx.changed().await.is_ok() {
            let state = validation_rx.borrow_and_update().clone();
            if let Err(e) = write_output(&validation_writer, &HostOutput::Validation(state)).await
            {
                tracing::warn!(error = %e, "failed to forward validation update");
                break;
            }
        }
    });

    let announcement_handle = bridge.announcements.clone().map(|client| {
        let announcement_writer = Arc::clone(&writer);
        tokio::spawn(async move {
            match client.pending(chrono::Utc::now()).await {
                Ok(Some(item)) => {
                    if let Err(e) =
                        write_output(&announcement_writer, &HostOutput::Announcement(item)).await
                    {
                        tracing::warn!(error = %e, "failed to forward announcement");
                    }
                }
                Ok(None) => tracing::debug!("no announcement to show"),
                Err(e) => tracing::warn!(error = %e, "announcement check failed"),
            }
        })
    });

    write_output(&writer, &bridge.state_output()).await?;
    write_output(&writer, &bridge.preferences_output()).await?;

    let reader_result = run_reader(&mut bridge, reader, &writer).await;

    // Dropping the bridge drops the session's channel sender, letting the
    // command forwarder drain and exit.
    drop(bridge);
    let _ = command_handle.await;
    validation_handle.abort();
    let _ = validation_handle.await;
    if let Some(handle) = announcement_handle {
        handle.abort();
        let _ = handle.await;
    }

    let mut w = writer.lock().await;
    w.flush()
        .await
        .map_err(|e| SettingsError::Channel(format!("failed to flush output: {e}")))?;
    reader_result
}

async fn run_reader<R, W>(
    bridge: &mut HostBridge,
    mut reader: R,
    writer: &SharedWriter<W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| SettingsError::Channel(format!("failed to read input: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down host bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let input: HostInput = match serde_json::from_str(trimmed) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse host input");
                write_output(writer, &HostOutput::error(format!("invalid input: {e}"))).await?;
                continue;
            }
        };

        if matches!(input, HostInput::Shutdown) {
            tracing::info!("shutdown received; stopping host bridge");
            break;
        }

        for output in bridge.handle(input).await {
            write_output(writer, &output).await?;
        }
    }
    Ok(())
}

/// Serialize `output` and write it as one line, then flush.
async fn write_output<W>(writer: &SharedWriter<W>, output: &HostOutput) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(output)
        .map_err(|e| SettingsError::Channel(format!("failed to serialize output: {e}")))?;
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes())
        .await
        .map_err(|e| SettingsError::Channel(format!("failed to write output: {e}")))?;
    w.write_all(b"\n")
        .await
        .map_err(|e| SettingsError::Channel(format!("failed to write newline: {e}")))?;
    w.flush()
        .await
        .map_err(|e| SettingsError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}
