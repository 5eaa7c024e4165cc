//! Host action registry interface.
//!
//! Responsibilities:
//! - Define the trait the widget uses to read and mutate the host
//!   application's action bindings.
//! - Provide an in-memory implementation for tests and for hosts that
//!   have no registry of their own.
//!
//! Does NOT handle:
//! - Input dispatch (the host does that with whatever it stores here).
//! - Default tracking or conflict detection (see `store` and `editor`).
//!
//! Invariants:
//! - Reads of an unknown action id fail with `UnknownAction`.
//! - Writes accept unknown ids: persisted files may reference actions the
//!   host has not registered yet, and a load must still apply them.

use std::collections::BTreeMap;

use keymap_config::KeyBinding;
use thiserror::Error;

/// Errors raised by an action registry.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// Lookup against an action id the registry does not know.
    #[error("Unknown action: '{action}'")]
    UnknownAction {
        /// The unknown action id
        action: String,
    },
}

/// The host application's action binding store.
///
/// An action may carry zero or more bindings; the widget always normalizes
/// to "first binding or none" when reading and writes exactly one binding
/// per action.
pub trait ActionRegistry {
    /// All bindings currently attached to `action_id`, in registry order.
    fn bindings(&self, action_id: &str) -> Result<Vec<KeyBinding>, RegistryError>;

    /// Replace the bindings attached to `action_id`.
    fn set_bindings(&mut self, action_id: &str, bindings: Vec<KeyBinding>)
    -> Result<(), RegistryError>;

    /// Remove every binding attached to `action_id`.
    fn clear_bindings(&mut self, action_id: &str) -> Result<(), RegistryError>;
}

/// In-memory [`ActionRegistry`] backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    actions: BTreeMap<String, Vec<KeyBinding>>,
}

impl MemoryRegistry {
    /// An empty registry with no known actions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that knows the given action ids, all unbound.
    pub fn with_actions<I, S>(action_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let actions = action_ids
            .into_iter()
            .map(|id| (id.into(), Vec::new()))
            .collect();
        Self { actions }
    }

    /// Register an action id (unbound) if it is not already known.
    pub fn register(&mut self, action_id: &str) {
        self.actions.entry(action_id.to_string()).or_default();
    }

    /// True if the registry knows `action_id`.
    pub fn knows(&self, action_id: &str) -> bool {
        self.actions.contains_key(action_id)
    }
}

impl ActionRegistry for MemoryRegistry {
    fn bindings(&self, action_id: &str) -> Result<Vec<KeyBinding>, RegistryError> {
        self.actions
            .get(action_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAction {
                action: action_id.to_string(),
            })
    }

    fn set_bindings(
        &mut self,
        action_id: &str,
        bindings: Vec<KeyBinding>,
    ) -> Result<(), RegistryError> {
        self.actions.insert(action_id.to_string(), bindings);
        Ok(())
    }

    fn clear_bindings(&mut self, action_id: &str) -> Result<(), RegistryError> {
        self.actions.insert(action_id.to_string(), Vec::new());
        Ok(())
    }
}
