//! # Info Extension
//!
//! General listeners and the `help` command.

use anyhow::Result;

use crate::application::host::{BotHost, Command, CommandContext, HostHandle};
use crate::application::router::CommandInfo;
use crate::domain::types::{BotEvent, EventKind};
use crate::strings::{logs, messages};

pub fn setup(host: &mut BotHost) -> Result<()> {
    host.add_listener(EventKind::Ready, on_ready);
    host.add_command(
        Command::new("help", handle_help)
            .alias("h")
            .help("List available commands"),
    );
    Ok(())
}

async fn on_ready(event: BotEvent, _host: HostHandle) -> Result<()> {
    if let BotEvent::Ready { user_id } = event {
        tracing::info!("{}", logs::logged_on(&user_id));
    }
    Ok(())
}

async fn handle_help(ctx: CommandContext) -> Result<()> {
    let text = render_help(ctx.host.commands());
    ctx.send(&text).await
}

/// Lists visible commands, one per line.
pub fn render_help(commands: &[CommandInfo]) -> String {
    let mut lines = vec![messages::HELP_HEADER.to_string()];
    lines.extend(
        commands
            .iter()
            .filter(|c| !c.hidden)
            .map(|c| messages::help_line(&c.name, &c.aliases.join(", "), &c.help)),
    );
    lines.join("\n")
}
