//! # Debug Console
//!
//! Diagnostic extension loaded when `BOT_DEBUG_REPL` is set. Reads commands from
//! stdin while the bot runs and answers on stdout.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::host::{BotHost, HostHandle};
use crate::domain::types::join_names;
use crate::strings::{logs, messages};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Extensions,
    Commands,
    Stop,
    Help,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ConsoleCommand::Empty,
            "extensions" | "ext" => ConsoleCommand::Extensions,
            "commands" | "cmds" => ConsoleCommand::Commands,
            "stop" | "exit" | "quit" => ConsoleCommand::Stop,
            "help" | "?" => ConsoleCommand::Help,
            other => ConsoleCommand::Unknown(other.to_string()),
        }
    }
}

pub fn setup(host: &mut BotHost) -> Result<()> {
    let handle = host.handle();
    host.spawn_task("repl", console(handle));
    Ok(())
}

async fn console(host: HostHandle) -> Result<()> {
    tracing::info!("{}", logs::REPL_STARTED);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = ConsoleCommand::parse(&line);
        if let Some(output) = respond(&command, &host) {
            println!("{output}");
        }
        if command == ConsoleCommand::Stop {
            host.request_stop();
            break;
        }
    }
    tracing::info!("{}", logs::REPL_CLOSED);
    Ok(())
}

/// Text printed for `command`, if any.
pub fn respond(command: &ConsoleCommand, host: &HostHandle) -> Option<String> {
    match command {
        ConsoleCommand::Extensions => Some(messages::extensions_loaded(&join_names(
            host.extensions(),
        ))),
        ConsoleCommand::Commands => Some(
            host.commands()
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        ConsoleCommand::Stop => Some(logs::STOP_REQUESTED.to_string()),
        ConsoleCommand::Help => Some(messages::REPL_HELP.to_string()),
        ConsoleCommand::Empty => None,
        ConsoleCommand::Unknown(input) => Some(messages::repl_unknown(input)),
    }
}
