//! # Database Extension
//!
//! Loads the `RoomStore` and provides it to later extensions. Rooms the bot joins
//! are registered as running; `running` and `reinit` inspect and reset a room.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::application::host::{BotHost, Command, CommandContext, HostHandle, Listener};
use crate::application::state::RoomStore;
use crate::domain::types::{BotEvent, EventKind};
use crate::strings::{logs, messages};

pub fn setup(host: &mut BotHost, path: &Path) -> Result<()> {
    let store = Arc::new(RoomStore::load(path)?);

    host.provide_service(store.clone());
    host.add_listener_handler(
        EventKind::RoomJoined,
        RoomJoinedListener {
            store: store.clone(),
        },
    );

    let running_store = store.clone();
    host.add_command(
        Command::new("running", move |ctx| handle_running(running_store.clone(), ctx))
            .alias("r")
            .help("Show or set whether JoshGone runs in this room (on/off)"),
    );
    host.add_command(
        Command::new("reinit", move |ctx| handle_reinit(store.clone(), ctx))
            .help("Reset this room's stored state"),
    );
    Ok(())
}

struct RoomJoinedListener {
    store: Arc<RoomStore>,
}

#[async_trait]
impl Listener for RoomJoinedListener {
    async fn on_event(&self, event: BotEvent, _host: HostHandle) -> Result<()> {
        if let BotEvent::RoomJoined { room_id } = event {
            self.store.ensure(&room_id).await;
            self.store.save().await?;
            tracing::info!("{}", logs::room_registered(&room_id));
        }
        Ok(())
    }
}

async fn handle_running(store: Arc<RoomStore>, ctx: CommandContext) -> Result<()> {
    let room_id = ctx.chat.room_id();
    if ctx.args.is_empty() {
        let record = store.ensure(&room_id).await;
        return ctx.send(&messages::running_status(record.running)).await;
    }

    let Some(running) = parse_switch(&ctx.args) else {
        return ctx.send(&messages::invalid_flag(&ctx.args)).await;
    };
    store.set_running(&room_id, running).await;
    store.save().await?;
    ctx.send(&messages::running_updated(running)).await
}

async fn handle_reinit(store: Arc<RoomStore>, ctx: CommandContext) -> Result<()> {
    store.reinit(&ctx.chat.room_id()).await;
    store.save().await?;
    ctx.send(messages::REINITIALIZED).await
}

/// Parses a user-supplied on/off argument.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enable" => Some(true),
        "off" | "false" | "no" | "0" | "disable" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::testing::{Ending, RecordingChat, ScriptedGateway, message};
    use crate::application::scheduler::Scheduler;
    use crate::domain::config::{BotConfiguration, CommandPrefix, SecretToken};
    use crate::domain::traits::ChatProvider;
    use std::time::Duration;

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch(" off "), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }

    #[test]
    fn test_malformed_store_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rooms.json");
        std::fs::write(&path, "[").unwrap();

        let scheduler = Scheduler::new().unwrap();
        let mut host = BotHost::new(
            BotConfiguration::new(SecretToken::new("t"), CommandPrefix::literal("%")),
            Box::new(ScriptedGateway::new(vec![], Ending::Return)),
            scheduler.handle(),
        );
        assert!(setup(&mut host, &path).is_err());
        assert!(host.service::<RoomStore>().is_none());
    }

    #[test]
    fn test_running_command_updates_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rooms.json");
        let scheduler = Scheduler::new().unwrap();
        let chat = Arc::new(RecordingChat::default());

        let mut host = BotHost::new(
            BotConfiguration::new(SecretToken::new("t"), CommandPrefix::literal("%")),
            Box::new(ScriptedGateway::new(
                vec![
                    message(&chat, "@a:x", "%r"),
                    message(&chat, "@a:x", "%running off"),
                ],
                Ending::Return,
            )),
            scheduler.handle(),
        )
        .with_signal_handling(false);
        setup(&mut host, &path).unwrap();
        assert!(host.service::<RoomStore>().is_some());

        let room = chat.room_id();
        let running = scheduler
            .block_on(async move {
                host.run().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                let reloaded = RoomStore::load(&path).unwrap();
                reloaded.running(&room).await
            })
            .unwrap();
        assert_eq!(running, Some(false));

        let sent = chat.sent();
        assert!(sent.contains(&messages::running_status(true)));
        assert!(sent.contains(&messages::running_updated(false)));
    }
}
