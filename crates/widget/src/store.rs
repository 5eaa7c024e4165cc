//! Binding store: registry delegation plus default tracking.
//!
//! Responsibilities:
//! - Delegate live binding reads and writes to the host action registry,
//!   normalizing to at most one binding per action.
//! - Capture each action's binding the first time it is observed, as the
//!   reset target.
//!
//! Does NOT handle:
//! - Conflict detection or the edit state machine (see `editor`).
//! - Persistence (see `keymap_config::codec`).
//!
//! Invariants:
//! - The live value is always re-read from the registry, never cached;
//!   `defaults` is the only persistent cache here.
//! - `defaults` is append-only for the store's lifetime: once captured, an
//!   action's default is never overwritten. There is no reset-defaults
//!   operation; a fresh widget instance starts a fresh defaults map.

use std::collections::BTreeMap;

use keymap_config::KeyBinding;
use tracing::debug;

use crate::registry::{ActionRegistry, RegistryError};

/// The authoritative mapping from action id to its bound key combination,
/// with per-action default capture.
#[derive(Debug)]
pub struct BindingStore<R: ActionRegistry> {
    registry: R,
    defaults: BTreeMap<String, Option<KeyBinding>>,
}

impl<R: ActionRegistry> BindingStore<R> {
    /// A store delegating to `registry`, with no defaults captured yet.
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            defaults: BTreeMap::new(),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The underlying registry, mutably. Mutations made through this
    /// accessor bypass default capture and change events; hosts normally
    /// go through the editor instead.
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// The action's current binding: first registry entry or none.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError::UnknownAction`] from the registry.
    pub fn current(&self, action_id: &str) -> Result<Option<KeyBinding>, RegistryError> {
        self.registry
            .bindings(action_id)
            .map(|bindings| bindings.into_iter().next())
    }

    /// The action's current binding, treating an unknown action as unbound.
    ///
    /// Used by read paths the widget recovers locally: default capture,
    /// conflict scans over stale action lists, save snapshots.
    pub fn current_or_unbound(&self, action_id: &str) -> Option<KeyBinding> {
        match self.current(action_id) {
            Ok(binding) => binding,
            Err(RegistryError::UnknownAction { .. }) => {
                debug!(action = action_id, "Unknown action treated as unbound");
                None
            }
        }
    }

    /// Record the action's current binding as its default, if no default
    /// has been captured yet. Idempotent.
    pub fn capture_default_if_absent(&mut self, action_id: &str) {
        if self.defaults.contains_key(action_id) {
            return;
        }
        let current = self.current_or_unbound(action_id);
        self.defaults.insert(action_id.to_string(), current);
    }

    /// The action's captured default. Outer `None` means the action has
    /// never been observed; inner `None` means it was unbound when first
    /// observed.
    pub fn default_binding(&self, action_id: &str) -> Option<Option<KeyBinding>> {
        self.defaults.get(action_id).copied()
    }

    /// True iff a default was captured and the current binding differs
    /// from it. Unbound-vs-unbound counts as unchanged.
    pub fn is_changed_from_default(&self, action_id: &str) -> bool {
        match self.defaults.get(action_id) {
            Some(default) => *default != self.current_or_unbound(action_id),
            None => false,
        }
    }

    /// Bind the action to exactly one key combination (clear-then-add:
    /// never accumulates multiple bindings per action, even though the
    /// registry could hold several).
    ///
    /// # Errors
    ///
    /// Propagates registry rejection.
    pub fn set(&mut self, action_id: &str, binding: KeyBinding) -> Result<(), RegistryError> {
        self.registry.set_bindings(action_id, vec![binding])
    }

    /// Remove the action's binding. Does not touch the captured default.
    ///
    /// # Errors
    ///
    /// Propagates registry rejection.
    pub fn clear(&mut self, action_id: &str) -> Result<(), RegistryError> {
        self.registry.clear_bindings(action_id)
    }
}
