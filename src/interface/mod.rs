//! # Interface Layer
//!
//! The user-facing surface of the bot: the built-in extensions and their commands.

pub mod extensions;
