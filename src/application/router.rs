//! # Command Router
//!
//! Routes incoming gateway events: listeners first, then command dispatch.
//! It parses the command string (e.g., `%gee 1 6`) and spawns the handler with the
//! necessary context. Handler errors are answered in the room, never propagated.

use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::application::host::{Command, CommandContext, HostHandle, Listener};
use crate::domain::config::CommandPrefix;
use crate::domain::types::{BotEvent, EventKind, IncomingMessage};
use crate::strings::{logs, messages};

/// What `help` and the REPL show about a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub hidden: bool,
}

#[derive(Default)]
pub struct CommandTable {
    commands: BTreeMap<String, Arc<Command>>,
    aliases: HashMap<String, String>,
}

impl CommandTable {
    /// Adds `command`, replacing any command of the same name. Returns whether one was replaced.
    /// An alias already held by another command moves to `command`.
    pub fn insert(&mut self, command: Command) -> bool {
        let name = command.name.clone();
        let replaced = self.commands.remove(&name).is_some();
        if replaced {
            self.aliases.retain(|_, target| *target != name);
        }
        for alias in &command.aliases {
            match self.aliases.insert(alias.clone(), name.clone()) {
                Some(previous) if previous != name => {
                    tracing::warn!("{}", logs::alias_replaced(alias, &previous, &name));
                }
                _ => {}
            }
        }
        self.commands.insert(name, Arc::new(command));
        replaced
    }

    /// Looks a command up by name, then by alias.
    pub fn lookup(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.get(name).cloned().or_else(|| {
            self.aliases
                .get(name)
                .and_then(|target| self.commands.get(target))
                .cloned()
        })
    }

    pub fn summaries(&self) -> Vec<CommandInfo> {
        self.commands
            .values()
            .map(|command| CommandInfo {
                name: command.name.clone(),
                aliases: command
                    .aliases
                    .iter()
                    .filter(|alias| self.aliases.get(*alias) == Some(&command.name))
                    .cloned()
                    .collect(),
                help: command.help.clone(),
                hidden: command.hidden,
            })
            .collect()
    }
}

/// Splits a message into `(command, args)` if it carries the prefix.
pub fn parse_invocation<'a>(
    prefix: &CommandPrefix,
    own_user: Option<&str>,
    body: &'a str,
) -> Option<(&'a str, &'a str)> {
    let rest = prefix.strip(body, own_user)?;
    let (name, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some((name, args))
}

pub struct Router {
    prefix: CommandPrefix,
    owner: Option<String>,
    commands: CommandTable,
    listeners: HashMap<EventKind, Vec<Arc<dyn Listener>>>,
    host: HostHandle,
    own_user: Option<String>,
}

impl Router {
    pub fn new(
        prefix: CommandPrefix,
        owner: Option<String>,
        commands: CommandTable,
        listeners: HashMap<EventKind, Vec<Arc<dyn Listener>>>,
        host: HostHandle,
    ) -> Self {
        Self {
            prefix,
            owner,
            commands,
            listeners,
            host,
            own_user: None,
        }
    }

    pub fn dispatch(&mut self, event: BotEvent) {
        if let BotEvent::Ready { user_id } = &event {
            tracing::debug!("{}", logs::mention_target(user_id));
            self.own_user = Some(user_id.clone());
        }
        self.notify_listeners(&event);
        if let BotEvent::Message(message) = event {
            self.route(message);
        }
    }

    fn notify_listeners(&self, event: &BotEvent) {
        let Some(listeners) = self.listeners.get(&event.kind()) else {
            return;
        };
        if listeners.is_empty() {
            return;
        }
        let listeners = listeners.clone();
        let event = event.clone();
        let host = self.host.clone();
        self.host.scheduler().spawn("listeners", async move {
            let results = join_all(
                listeners
                    .iter()
                    .map(|listener| listener.on_event(event.clone(), host.clone())),
            )
            .await;
            for e in results.into_iter().filter_map(Result::err) {
                tracing::error!("{}", logs::listener_failed(&format!("{:?}", event.kind()), &format!("{e:#}")));
            }
        });
    }

    fn route(&self, message: IncomingMessage) {
        let Some((name, args)) =
            parse_invocation(&self.prefix, self.own_user.as_deref(), &message.body)
        else {
            return;
        };
        tracing::info!("{}", logs::dispatching(name, args, &message.sender));

        let reply = match self.commands.lookup(name) {
            None => Some(messages::unknown_command(name)),
            Some(command) if command.owner_only && !self.is_owner(&message.sender) => {
                Some(messages::NOT_OWNER.to_string())
            }
            Some(command) => {
                self.invoke(command, &message, name, args);
                None
            }
        };

        if let Some(reply) = reply {
            let chat = message.chat.clone();
            self.host.scheduler().spawn("reply", async move {
                if let Err(e) = chat.send_message(&reply).await {
                    tracing::error!("{}", logs::reply_failed(&e));
                }
            });
        }
    }

    fn invoke(&self, command: Arc<Command>, message: &IncomingMessage, name: &str, args: &str) {
        let ctx = CommandContext {
            chat: message.chat.clone(),
            sender: message.sender.clone(),
            args: args.to_string(),
            invoked_with: name.to_string(),
            host: self.host.clone(),
        };
        self.host.scheduler().spawn("command", async move {
            let chat = ctx.chat.clone();
            if let Err(e) = command.handler.call(ctx).await {
                let error = format!("{e:#}");
                tracing::error!("{}", logs::command_failed(&command.name, &error));
                if let Err(e) = chat.send_message(&messages::command_error(&error)).await {
                    tracing::error!("{}", logs::reply_failed(&e));
                }
            }
        });
    }

    fn is_owner(&self, sender: &str) -> bool {
        self.owner.as_deref() == Some(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Command {
        Command::new(name, |_ctx: CommandContext| async move { Ok(()) })
    }

    #[test]
    fn test_parse_invocation() {
        let prefix = CommandPrefix::literal("%");
        assert_eq!(parse_invocation(&prefix, None, "%gee"), Some(("gee", "")));
        assert_eq!(
            parse_invocation(&prefix, None, "%gee  1 6 "),
            Some(("gee", "1 6"))
        );
        assert_eq!(
            parse_invocation(&prefix, None, "%lines a\nb"),
            Some(("lines", "a\nb"))
        );
        assert_eq!(parse_invocation(&prefix, None, "%"), None);
        assert_eq!(parse_invocation(&prefix, None, "% gee"), None);
        assert_eq!(parse_invocation(&prefix, None, "gee"), None);
    }

    #[test]
    fn test_lookup_by_alias() {
        let mut table = CommandTable::default();
        table.insert(noop("gee").alias("g"));
        assert_eq!(table.lookup("gee").unwrap().name, "gee");
        assert_eq!(table.lookup("g").unwrap().name, "gee");
        assert!(table.lookup("x").is_none());
    }

    #[test]
    fn test_alias_moves_to_the_later_command() {
        let mut table = CommandTable::default();
        table.insert(noop("echo").alias("e").alias("ec"));
        assert!(!table.insert(noop("exit").alias("e")));
        assert_eq!(table.lookup("e").unwrap().name, "exit");
        assert_eq!(table.lookup("echo").unwrap().name, "echo");
        assert_eq!(table.lookup("ec").unwrap().name, "echo");

        let summaries = table.summaries();
        let echo = summaries.iter().find(|info| info.name == "echo").unwrap();
        assert_eq!(echo.aliases, vec!["ec"]);
        let exit = summaries.iter().find(|info| info.name == "exit").unwrap();
        assert_eq!(exit.aliases, vec!["e"]);
    }

    #[test]
    fn test_reinsert_replaces_command_and_aliases() {
        let mut table = CommandTable::default();
        assert!(!table.insert(noop("gee").alias("g")));
        assert!(table.insert(noop("gee").alias("gg")));
        assert!(table.lookup("g").is_none());
        assert_eq!(table.lookup("gg").unwrap().name, "gee");
        assert_eq!(table.summaries().len(), 1);
    }

    #[test]
    fn test_summaries_are_sorted() {
        let mut table = CommandTable::default();
        table.insert(noop("words"));
        table.insert(noop("lines").help("Send lines").hidden());
        let names: Vec<_> = table.summaries().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["lines", "words"]);
        assert!(table.summaries()[0].hidden);
    }
}
