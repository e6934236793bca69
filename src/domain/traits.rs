//! # Domain Traits
//!
//! Abstract interfaces for the external collaborators of the host (chat rooms, the gateway).
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::config::{IntentSet, SecretToken};
use crate::domain::types::BotEvent;

/// Abstract interface for a Chat Provider (e.g., a Matrix room)
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message to the room, returning the event id
    async fn send_message(&self, content: &str) -> Result<String, String>;

    /// Get the current room ID
    fn room_id(&self) -> String;
}

/// What a gateway needs to open a session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretToken,
    pub intents: IntentSet,
}

/// The messaging-gateway connection owned by the host.
///
/// `run` pushes events into `events` until the connection ends. Returning `Ok`
/// means a clean disconnect; an error is surfaced as a host failure.
#[async_trait]
pub trait Gateway: Send + 'static {
    async fn run(
        self: Box<Self>,
        session: Session,
        events: mpsc::Sender<BotEvent>,
    ) -> anyhow::Result<()>;
}
