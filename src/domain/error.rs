//! # Errors
//!
//! Typed failures of the startup and shutdown sequence. Anything raised while
//! the host is running belongs to the host and its extensions and is reported
//! through `HostExit` instead.

use std::path::PathBuf;

use crate::domain::types::{ExtensionName, RunState};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A required setting is missing or unusable. Raised before loading starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has an invalid value '{value}'")]
    InvalidVar { name: &'static str, value: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// An extension could not be attached. Extensions loaded before it stay loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("extension '{name}' is not known")]
    NotFound {
        name: ExtensionName,
        loaded: Vec<ExtensionName>,
    },

    #[error("extension '{name}' failed to load: {source}")]
    Failed {
        name: ExtensionName,
        loaded: Vec<ExtensionName>,
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// The extension that failed.
    pub fn name(&self) -> &ExtensionName {
        match self {
            LoadError::NotFound { name, .. } | LoadError::Failed { name, .. } => name,
        }
    }

    /// Extensions that were attached before the failure, in load order.
    pub fn loaded(&self) -> &[ExtensionName] {
        match self {
            LoadError::NotFound { loaded, .. } | LoadError::Failed { loaded, .. } => loaded,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to build the scheduler: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },

    #[error("the scheduler has already been released")]
    Released,
}
