//! # Application Layer
//!
//! The lifecycle of the bot process: the extension registry and loader, the host
//! and its command router, the scheduler it all runs on, and the manager that
//! sequences load, run, drain and close.

pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod state;
