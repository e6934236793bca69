//! # Extension Registry
//!
//! The ordered startup list. Order matters: an extension may rely on anything an
//! earlier one registered (the `database` store must exist before `admin` loads).

use crate::domain::types::ExtensionName;

/// Loaded on every start, in this order.
pub const BASE_EXTENSIONS: &[&str] = &["info", "database", "admin", "gee", "thicc", "split"];

/// Appended when `BOT_DEBUG_REPL` is set.
pub const DIAGNOSTIC_EXTENSION: &str = "repl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRegistry {
    names: Vec<ExtensionName>,
}

impl ExtensionRegistry {
    /// `base` verbatim, plus the diagnostic extension at the end iff `include_diagnostic`.
    /// Duplicates are kept.
    pub fn build(base: &[ExtensionName], include_diagnostic: bool) -> Self {
        let mut names = base.to_vec();
        if include_diagnostic {
            names.push(ExtensionName::from(DIAGNOSTIC_EXTENSION));
        }
        Self { names }
    }

    /// The built-in startup list.
    pub fn base() -> Vec<ExtensionName> {
        BASE_EXTENSIONS.iter().copied().map(ExtensionName::from).collect()
    }

    pub fn names(&self) -> &[ExtensionName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
