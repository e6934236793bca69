//! # Log Strings
//!
//! Text for `tracing` events. Kept apart from user-facing replies in `messages`.

use crate::domain::types::RunState;

// Startup

pub fn config_loaded(user: &str) -> String {
    format!("Loaded configuration for user: {user}")
}

pub const LOGGING_INIT_ERROR: &str = "Failed to install the tracing subscriber";

pub fn startup_list(list: &str) -> String {
    format!("Startup extensions: [{list}]")
}

// Extensions

pub fn extension_loaded(name: &str) -> String {
    format!("Loaded {name}")
}

pub fn all_extensions_loaded(list: &str) -> String {
    format!("All extensions loaded: [{list}]")
}

pub const NO_EXTENSIONS: &str = "Startup list is empty; the bot will run without extensions.";

pub fn extension_unknown(name: &str) -> String {
    format!("No extension named '{name}' is available")
}

pub fn extension_failed(name: &str, err: &str) -> String {
    format!("Extension '{name}' failed to load: {err}")
}

pub fn command_replaced(name: &str) -> String {
    format!("Command '{name}' was registered twice; keeping the later one")
}

pub fn alias_replaced(alias: &str, previous: &str, name: &str) -> String {
    format!("Alias '{alias}' moved from command '{previous}' to '{name}'")
}

// Lifecycle

pub fn transition(from: RunState, to: RunState) -> String {
    format!("Lifecycle: {from} -> {to}")
}

pub fn host_stopped(reason: &str) -> String {
    format!("Host stopped: {reason}")
}

pub fn host_failed(reason: &str) -> String {
    format!("Host failed: {reason}")
}

pub fn draining(millis: u128) -> String {
    format!("Draining for {millis}ms before release...")
}

pub fn drain_failed(err: &str) -> String {
    format!("Drain could not run: {err}")
}

pub fn shutdown_complete(list: &str) -> String {
    format!("Shutdown complete. Extensions that ran: [{list}]")
}

pub const SCHEDULER_RELEASED: &str = "Scheduler released.";
pub const SCHEDULER_ALREADY_RELEASED: &str = "Scheduler already released; nothing to do.";
pub const AUTO_CLOSE_SUPPRESSED: &str = "Ignoring automatic close; the lifecycle manager releases the scheduler.";

pub fn shutdown_race(task: &str) -> String {
    format!("Task '{task}' was scheduled after the scheduler was released; dropping it")
}

// Host

pub const HOST_RUNNING: &str = "Host running; waiting for events...";
pub const STOP_REQUESTED: &str = "Stop requested.";
pub const GATEWAY_NOT_STARTED: &str = "Gateway task could not be started.";
pub const SHUTDOWN: &str = "Shutting down...";

pub fn shutdown_fail(err: &str) -> String {
    format!("Unable to listen for shutdown signal: {err}")
}

pub fn task_failed(name: &str, err: &str) -> String {
    format!("Task '{name}' failed: {err}")
}

pub fn logged_on(user: &str) -> String {
    format!("JoshGone logged on as {user}.")
}

pub fn mention_target(user: &str) -> String {
    format!("Accepting mentions of {user} as a command prefix")
}

pub fn listener_failed(kind: &str, err: &str) -> String {
    format!("{kind} listener failed: {err}")
}

pub fn dispatching(name: &str, args: &str, sender: &str) -> String {
    format!("Command '{name}' from {sender} (args: {args:?})")
}

pub fn command_failed(name: &str, err: &str) -> String {
    format!("Command '{name}' failed: {err}")
}

pub fn reply_failed(err: &str) -> String {
    format!("Failed to send reply: {err}")
}

// Matrix

pub const LOGIN_SUCCESS: &str = "Logged in successfully!";
pub const SYNC_LOOP_START: &str = "Starting sync loop...";

pub fn sync_loop_fail(err: &str) -> String {
    format!("Sync loop failed: {err}")
}

pub fn invite_received(room_id: &str) -> String {
    format!("💌 Received invite for room {room_id:?}")
}

pub fn join_invite_fail(err: &str) -> String {
    format!("Failed to join room after invite: {err}")
}

pub const JOIN_INVITE_SUCCESS: &str = "✅ Successfully joined room!";
pub const EVENT_CHANNEL_CLOSED: &str = "Host stopped listening; dropping gateway event.";

pub fn sending_message(room: &str, content: &str) -> String {
    format!("Bot sending message to {room}: {content}")
}

// Built-in extensions

pub fn room_registered(room_id: &str) -> String {
    format!("Registered room {room_id} as running")
}

pub fn store_loaded(path: &str, rooms: usize) -> String {
    format!("Room store {path} loaded with {rooms} rooms")
}

pub fn store_saved(path: &str) -> String {
    format!("Room store saved to {path}")
}

pub fn store_save_failed(err: &str) -> String {
    format!("Failed to save room store: {err}")
}

pub const REPL_STARTED: &str = "Debug console attached to stdin. Type 'help' for commands.";
pub const REPL_CLOSED: &str = "Debug console input closed.";
