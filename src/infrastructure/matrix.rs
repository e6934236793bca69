//! # Matrix Adapter
//!
//! `MatrixGateway` opens the Matrix session and turns sync events into `BotEvent`s
//! for the host. `MatrixService` implements `ChatProvider` for a single room so
//! commands can reply.

use anyhow::{Context, Result};
use async_trait::async_trait;
use matrix_sdk::{
    Client,
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        member::{MembershipState, StrippedRoomMemberEvent},
        message::{MessageType, RoomMessageEventContent, SyncRoomMessageEvent},
    },
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

use crate::domain::config::{Intent, MatrixConfig};
use crate::domain::traits::{ChatProvider, Gateway, Session};
use crate::domain::types::{BotEvent, IncomingMessage};
use crate::strings::logs;

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn send_message(&self, content: &str) -> Result<String, String> {
        tracing::debug!("{}", logs::sending_message(&self.room_id(), content));
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }
}

/// Gateway backed by a Matrix homeserver.
pub struct MatrixGateway {
    homeserver: String,
    username: String,
}

impl MatrixGateway {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            homeserver: config.homeserver.clone(),
            username: config.username.clone(),
        }
    }
}

#[async_trait]
impl Gateway for MatrixGateway {
    async fn run(self: Box<Self>, session: Session, events: mpsc::Sender<BotEvent>) -> Result<()> {
        let client = Client::builder()
            .homeserver_url(&self.homeserver)
            .build()
            .await
            .with_context(|| format!("Failed to reach homeserver {}", self.homeserver))?;

        client
            .matrix_auth()
            .login_username(&self.username, session.token.expose())
            .send()
            .await
            .with_context(|| format!("Failed to log in as {}", self.username))?;
        tracing::info!("{}", logs::LOGIN_SUCCESS);

        let user_id = client
            .user_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| self.username.clone());
        forward(&events, BotEvent::Ready { user_id }).await;

        let start_time = SystemTime::now();

        if session.intents.contains(Intent::Messages) {
            let messages = events.clone();
            client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
                let events = messages.clone();
                async move {
                    let Some(original_msg) = ev.as_original() else {
                        return;
                    };
                    // Ignore backlog delivered by the first sync
                    let ts = ev.origin_server_ts();
                    let event_time = UNIX_EPOCH + Duration::from_millis(ts.get().into());
                    if event_time < start_time {
                        return;
                    }
                    let MessageType::Text(text_content) = &original_msg.content.msgtype else {
                        return;
                    };
                    if original_msg.sender == room.own_user_id() {
                        return;
                    }

                    let message = IncomingMessage {
                        sender: original_msg.sender.to_string(),
                        body: text_content.body.clone(),
                        chat: Arc::new(MatrixService::new(room)),
                    };
                    forward(&events, BotEvent::Message(message)).await;
                }
            });
        }

        if session.intents.contains(Intent::Members) {
            let members = events.clone();
            client.add_event_handler(move |ev: StrippedRoomMemberEvent, room: Room| {
                let events = members.clone();
                async move {
                    if ev.content.membership != MembershipState::Invite
                        || ev.state_key.as_str() != room.own_user_id().as_str()
                    {
                        return;
                    }
                    tracing::info!("{}", logs::invite_received(room.room_id().as_str()));
                    match room.join().await {
                        Ok(_) => {
                            tracing::info!("{}", logs::JOIN_INVITE_SUCCESS);
                            let room_id = room.room_id().to_string();
                            forward(&events, BotEvent::RoomJoined { room_id }).await;
                        }
                        Err(e) => tracing::error!("{}", logs::join_invite_fail(&e.to_string())),
                    }
                }
            });
        }

        tracing::info!("{}", logs::SYNC_LOOP_START);
        if let Err(e) = client.sync(SyncSettings::default()).await {
            tracing::error!("{}", logs::sync_loop_fail(&e.to_string()));
            return Err(e.into());
        }
        Ok(())
    }
}

async fn forward(events: &mpsc::Sender<BotEvent>, event: BotEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("{}", logs::EVENT_CHANNEL_CLOSED);
    }
}
