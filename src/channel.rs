//! Outbound room channel.
//!
//! The transport to the room server is opaque; the engine only needs to hand
//! over one [`OutboundCommand`] at a time.

use crate::command::OutboundCommand;
use crate::error::{Result, SettingsError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Sink for outbound room commands.
#[async_trait]
pub trait RoomChannel: Send + Sync {
    /// Hand `command` to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Channel`] if the transport is closed.
    async fn emit(&self, command: OutboundCommand) -> Result<()>;
}

/// Sending half of an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<OutboundCommand>,
}

#[async_trait]
impl RoomChannel for ChannelSender {
    async fn emit(&self, command: OutboundCommand) -> Result<()> {
        let name = command.name;
        self.tx.send(command).await.map_err(|e| {
            SettingsError::Channel(format!("failed to emit {}: {e}", name.event_name()))
        })?;
        tracing::debug!(command = name.as_str(), "room command emitted");
        Ok(())
    }
}

/// Create a bounded in-process channel. The receiver side is drained by the
/// transport (the stdio bridge, or a test).
#[must_use]
pub fn room_channel(capacity: usize) -> (ChannelSender, mpsc::Receiver<OutboundCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSender { tx }, rx)
}
