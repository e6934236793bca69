//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.
//! Includes error replies and the text of the built-in commands.

pub const NOT_OWNER: &str = "🚫 Only the bot owner can use this command.";

pub fn unknown_command(name: &str) -> String {
    format!("❓ Unknown command `{name}`.")
}

pub fn command_error(err: &str) -> String {
    format!("Oops, an error occurred: `{err}`")
}

// info

pub const HELP_HEADER: &str = "**Commands**";

pub fn help_line(name: &str, aliases: &str, help: &str) -> String {
    match (aliases.is_empty(), help.is_empty()) {
        (true, true) => format!("- `{name}`"),
        (true, false) => format!("- `{name}`: {help}"),
        (false, true) => format!("- `{name}` ({aliases})"),
        (false, false) => format!("- `{name}` ({aliases}): {help}"),
    }
}

// database

pub const REINITIALIZED: &str = "Reinitialized JoshGone.";

pub fn running_status(running: bool) -> String {
    format!(
        "JoshGone is currently {}.",
        if running { "running" } else { "not running" }
    )
}

pub fn running_updated(running: bool) -> String {
    format!("JoshGone is now {}running.", if running { "" } else { "not " })
}

pub fn invalid_flag(value: &str) -> String {
    format!("Expected on or off, got `{value}`.")
}

// admin

pub fn extensions_loaded(list: &str) -> String {
    format!("Extensions loaded: [{list}]")
}

pub const SHUTTING_DOWN: &str = "Shutting bot down.";
pub const STORE_SAVED: &str = "Room store saved.";

// gee

pub fn number_too_large(value: &str) -> String {
    format!("{value} is too large a number")
}

// split

pub fn not_finite(value: &str) -> String {
    format!("{value} is not finite")
}

pub fn delay_out_of_range(value: &str) -> String {
    format!("{value} seconds is too long a delay")
}

pub const SPLIT_USAGE: &str = "Usage: `lines [delay] <text>` or `words [delay] <text>`";

// repl

pub const REPL_HELP: &str = "extensions | commands | stop | help";

pub fn repl_unknown(input: &str) -> String {
    format!("Unknown console command '{input}'. Try: {REPL_HELP}")
}
