//! # Domain Types
//!
//! Common data structures and enums shared by the host, the loader and the extensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::traits::ChatProvider;

/// Opaque identifier of a loadable extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionName(String);

impl ExtensionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ExtensionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for ExtensionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for ExtensionName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Joins names the way the startup summary prints them (`a, b, c`).
pub fn join_names(names: &[ExtensionName]) -> String {
    names
        .iter()
        .map(ExtensionName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Linear lifecycle of the process. There is no way back to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Loading,
    Running,
    Draining,
    Closed,
}

impl RunState {
    /// Whether `self -> next` is an edge of the lifecycle.
    ///
    /// `Created -> Closed` covers configuration failures, `Loading -> Closed`
    /// covers load failures (no run, no drain).
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Created, RunState::Loading)
                | (RunState::Created, RunState::Closed)
                | (RunState::Loading, RunState::Running)
                | (RunState::Loading, RunState::Closed)
                | (RunState::Running, RunState::Draining)
                | (RunState::Draining, RunState::Closed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::Loading => "loading",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A text message delivered by the gateway.
#[derive(Clone)]
pub struct IncomingMessage {
    pub sender: String,
    pub body: String,
    pub chat: Arc<dyn ChatProvider>,
}

impl fmt::Debug for IncomingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingMessage")
            .field("room", &self.chat.room_id())
            .field("sender", &self.sender)
            .field("body", &self.body)
            .finish()
    }
}

/// Events the gateway feeds into the host.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// Session established; carries the bot's own user id.
    Ready { user_id: String },
    Message(IncomingMessage),
    /// The bot joined a room (accepted an invite).
    RoomJoined { room_id: String },
}

impl BotEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BotEvent::Ready { .. } => EventKind::Ready,
            BotEvent::Message(_) => EventKind::Message,
            BotEvent::RoomJoined { .. } => EventKind::RoomJoined,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    Message,
    RoomJoined,
}

/// Why `BotHost::run` returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostExit {
    /// Something asked the host to stop (e.g. the `shutdown` command).
    Requested,
    /// Ctrl-C.
    Interrupted,
    /// The gateway finished without an error.
    Disconnected,
    Failed(String),
}

impl fmt::Display for HostExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostExit::Requested => f.write_str("stop requested"),
            HostExit::Interrupted => f.write_str("interrupted"),
            HostExit::Disconnected => f.write_str("disconnected"),
            HostExit::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_edges_are_linear() {
        use RunState::*;
        let all = [Created, Loading, Running, Draining, Closed];
        let allowed = [
            (Created, Loading),
            (Created, Closed),
            (Loading, Running),
            (Loading, Closed),
            (Running, Draining),
            (Draining, Closed),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for to in [
            RunState::Created,
            RunState::Loading,
            RunState::Running,
            RunState::Draining,
            RunState::Closed,
        ] {
            assert!(!RunState::Closed.can_transition_to(to));
        }
    }

    #[test]
    fn test_join_names() {
        let names = vec![ExtensionName::from("a"), ExtensionName::from("b")];
        assert_eq!(join_names(&names), "a, b");
        assert_eq!(join_names(&[]), "");
    }
}
