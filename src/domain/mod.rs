//! # Domain Layer
//!
//! Core definitions, types, and traits shared by every other layer: configuration,
//! lifecycle states, gateway events and the typed startup errors.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
