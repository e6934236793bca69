//! # Admin Extension
//!
//! Owner-only maintenance commands. Needs the `database` extension loaded first.

use anyhow::Result;
use std::sync::Arc;

use crate::application::host::{BotHost, Command, CommandContext};
use crate::application::state::RoomStore;
use crate::domain::types::join_names;
use crate::strings::{logs, messages};

pub fn setup(host: &mut BotHost) -> Result<()> {
    let Some(store) = host.service::<RoomStore>() else {
        anyhow::bail!("admin requires the database extension to be loaded first");
    };

    host.add_command(
        Command::new("list", handle_list)
            .help("List loaded extensions")
            .hidden()
            .owner_only(),
    );
    host.add_command(
        Command::new("shutdown", handle_shutdown)
            .help("Stop the bot")
            .hidden()
            .owner_only(),
    );
    host.add_command(
        Command::new("save", move |ctx| handle_save(store.clone(), ctx))
            .help("Write the room store to disk")
            .hidden()
            .owner_only(),
    );
    Ok(())
}

async fn handle_list(ctx: CommandContext) -> Result<()> {
    let list = join_names(ctx.host.extensions());
    ctx.send(&messages::extensions_loaded(&list)).await
}

async fn handle_shutdown(ctx: CommandContext) -> Result<()> {
    tracing::info!("{}", logs::SHUTDOWN);
    ctx.send(messages::SHUTTING_DOWN).await?;
    ctx.host.request_stop();
    Ok(())
}

async fn handle_save(store: Arc<RoomStore>, ctx: CommandContext) -> Result<()> {
    if let Err(e) = store.save().await {
        tracing::error!("{}", logs::store_save_failed(&format!("{e:#}")));
        return Err(e);
    }
    tracing::info!("{}", logs::store_saved(&store.path().display().to_string()));
    ctx.send(messages::STORE_SAVED).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::testing::{Ending, RecordingChat, ScriptedGateway, message};
    use crate::application::scheduler::Scheduler;
    use crate::domain::config::{BotConfiguration, CommandPrefix, SecretToken};
    use crate::domain::types::HostExit;
    use crate::interface::extensions::database;
    use std::time::Duration;

    fn host(scheduler: &Scheduler, gateway: ScriptedGateway) -> BotHost {
        let mut config = BotConfiguration::new(SecretToken::new("t"), CommandPrefix::literal("%"));
        config.owner = Some("@owner:x".to_string());
        BotHost::new(config, Box::new(gateway), scheduler.handle()).with_signal_handling(false)
    }

    #[test]
    fn test_requires_database() {
        let scheduler = Scheduler::new().unwrap();
        let mut host = host(&scheduler, ScriptedGateway::new(vec![], Ending::Return));
        let err = setup(&mut host).unwrap_err();
        assert!(err.to_string().contains("database"));
    }

    #[test]
    fn test_list_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = Scheduler::new().unwrap();
        let chat = Arc::new(RecordingChat::default());
        let gateway = ScriptedGateway::new(
            vec![
                message(&chat, "@owner:x", "%list"),
                message(&chat, "@someone:x", "%shutdown"),
                message(&chat, "@owner:x", "%shutdown"),
            ],
            Ending::Hang,
        );
        let mut host = host(&scheduler, gateway);
        database::setup(&mut host, &dir.path().join("rooms.json")).unwrap();
        host.record_loaded("database".into());
        setup(&mut host).unwrap();
        host.record_loaded("admin".into());

        let exit = scheduler
            .block_on(async move {
                let exit = host.run().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                exit
            })
            .unwrap();
        assert_eq!(exit, HostExit::Requested);

        let sent = chat.sent();
        assert!(sent.contains(&messages::extensions_loaded("database, admin")));
        assert!(sent.contains(&messages::NOT_OWNER.to_string()));
        assert!(sent.contains(&messages::SHUTTING_DOWN.to_string()));
    }
}
