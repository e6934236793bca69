//! # Strings Module
//!
//! Centralizes log text and user-facing replies.
//! Ensures consistency in messaging and easier updates.

pub mod logs;
pub mod messages;
