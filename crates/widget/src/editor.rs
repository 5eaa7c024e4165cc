//! Conflict-resolving edit controller.
//!
//! Responsibilities:
//! - Orchestrate binding change requests: capture raw key input, scan for
//!   collisions with existing bindings, and hold conflicting edits pending
//!   an explicit user decision.
//! - Implement clear-to-empty and reset-to-default.
//! - Rebuild the keymap tree on every structural change and keep lazy
//!   default capture current.
//! - Queue change events and recompute registered shortcut labels.
//! - Save and load the binding snapshot through the persistence codec.
//!
//! Does NOT handle:
//! - Rendering the tree, the search box, or the confirmation dialog; the
//!   host forwards clicks and raw key events here and presents
//!   [`ConflictInfo`] however it likes.
//!
//! Invariants:
//! - At most one edit is in flight; beginning a capture abandons any
//!   pending edit without mutating the store.
//! - Every committed mutation (set, clear, reset, load) queues exactly one
//!   `KeymapEvent::Changed`.
//! - Conflict is an expected state machine branch, never an error.

use std::collections::{BTreeSet, VecDeque};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keymap_config::{CodecError, KeyBinding, KeyCodeName, ModifierFlags, codec};
use thiserror::Error;
use tracing::debug;

use crate::listener::{Listener, ListenerId, ShortcutLabel};
use crate::registry::{ActionRegistry, RegistryError};
use crate::store::BindingStore;
use crate::tree::{KeymapConfig, KeymapTree, TreeError, build_tree};

/// Errors surfaced by editor operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The host registry rejected a read or write.
    #[error("Registry rejected the operation: {0}")]
    Registry(#[from] RegistryError),

    /// The keymap configuration could not be built into a tree.
    #[error("Keymap tree rebuild failed: {0}")]
    Tree(#[from] TreeError),

    /// Saving or loading the binding file failed.
    #[error("Binding persistence failed: {0}")]
    Persistence(#[from] CodecError),
}

/// The edit state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    /// No edit in flight.
    Idle,
    /// Waiting for the user to press the new key combination.
    Capturing {
        /// The action being rebound
        action: String,
    },
    /// A candidate collided with an existing binding; waiting for the
    /// user's reassign-or-cancel decision.
    PendingConflict {
        /// The action being rebound
        action: String,
        /// The proposed new binding
        candidate: KeyBinding,
        /// The action currently holding the candidate key
        conflicting: String,
    },
}

/// Message parameters for the host's confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    /// The proposed binding
    pub candidate: KeyBinding,
    /// Canonical text of the proposed binding
    pub candidate_text: String,
    /// Action id currently holding the key
    pub conflicting_action: String,
    /// Display name of that action (falls back to the id when the leaf is
    /// hidden by the current filter)
    pub conflicting_display: String,
}

/// Result of feeding a raw key event into an active capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No capture is in flight; the event was ignored.
    NotCapturing,
    /// Escape pressed; the capture was abandoned with no mutation.
    Cancelled,
    /// A pure modifier (or unrepresentable key) was pressed; capture
    /// continues and the host may show the transient text.
    Pending {
        /// Transient display text for the partially held combination
        display: String,
    },
    /// The candidate was free and has been committed.
    Committed,
    /// The candidate collides; the editor is now holding the edit pending
    /// confirmation.
    Conflict(ConflictInfo),
}

/// Result of a reset-to-default request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The action has no captured default; nothing happened and no event
    /// was queued.
    NoDefault,
    /// The default was restored (for an unbound default, the binding was
    /// cleared).
    Committed,
    /// Restoring the default collides with another action's current
    /// binding; the editor is holding the edit pending confirmation.
    Conflict(ConflictInfo),
}

/// Events queued for the host to drain after calling into the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapEvent {
    /// A binding mutation was committed (set, clear, reset, or load).
    /// Consumers re-query the store for every action they track.
    Changed,
    /// The tree was rebuilt; the host should run one re-measurement pass
    /// before reading row positions.
    RemeasureRequested,
}

/// The keybinding-configuration widget engine.
///
/// Owns the binding store, the keymap configuration, filter and collapse
/// state, and the edit state machine. The rendering layer observes the
/// tree via [`KeymapEditor::tree`] and forwards raw input and clicks into
/// the methods below.
#[derive(Debug)]
pub struct KeymapEditor<R: ActionRegistry> {
    store: BindingStore<R>,
    config: KeymapConfig,
    filter: String,
    collapsed: BTreeSet<String>,
    tree: KeymapTree,
    state: EditState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    events: VecDeque<KeymapEvent>,
}

impl<R: ActionRegistry> KeymapEditor<R> {
    /// Build an editor over `config`, delegating live bindings to
    /// `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Tree`] if the configuration carries duplicate
    /// action ids.
    pub fn new(config: KeymapConfig, registry: R) -> Result<Self, EditError> {
        let mut editor = Self {
            store: BindingStore::new(registry),
            config,
            filter: String::new(),
            collapsed: BTreeSet::new(),
            tree: KeymapTree::default(),
            state: EditState::Idle,
            listeners: Vec::new(),
            next_listener: 0,
            events: VecDeque::new(),
        };
        editor.rebuild()?;
        Ok(editor)
    }

    /// The last built tree. Read-only; rebuilt from scratch on every
    /// structural change.
    pub fn tree(&self) -> &KeymapTree {
        &self.tree
    }

    /// The current edit state.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// The binding store (for value queries from the rendering layer).
    pub fn store(&self) -> &BindingStore<R> {
        &self.store
    }

    /// True iff the action's current binding differs from its captured
    /// default; drives the "modified" marker and the reset affordance.
    pub fn is_changed_from_default(&self, action_id: &str) -> bool {
        self.store.is_changed_from_default(action_id)
    }

    /// Queued events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<KeymapEvent> {
        self.events.drain(..).collect()
    }

    // ---- tree structure -------------------------------------------------

    /// Replace the filter text and rebuild.
    pub fn set_filter(&mut self, filter: &str) -> Result<(), EditError> {
        self.filter = filter.to_string();
        self.rebuild()
    }

    /// Toggle a section's collapse state (keyed by name) and rebuild.
    pub fn toggle_collapsed(&mut self, section_name: &str) -> Result<(), EditError> {
        if !self.collapsed.remove(section_name) {
            self.collapsed.insert(section_name.to_string());
        }
        self.rebuild()
    }

    fn rebuild(&mut self) -> Result<(), EditError> {
        let tree = build_tree(&self.config, &self.filter, &self.collapsed)?;
        // Lazy default capture: an action's reset target is its binding
        // the first time any build observes it.
        for action in &tree.actions {
            self.store.capture_default_if_absent(action);
        }
        self.tree = tree;
        self.events.push_back(KeymapEvent::RemeasureRequested);
        Ok(())
    }

    // ---- edit state machine ---------------------------------------------

    /// Begin capturing a new binding for `action`. Any edit already in
    /// flight is abandoned without mutating the store.
    pub fn begin_capture(&mut self, action: &str) {
        if self.state != EditState::Idle {
            debug!(state = ?self.state, "Abandoning in-flight edit for new capture");
        }
        self.state = EditState::Capturing {
            action: action.to_string(),
        };
    }

    /// Feed a raw key event into the active capture.
    ///
    /// Escape abandons the capture even with modifiers held, so
    /// combinations like `Ctrl+Esc` are never capturable. A pure modifier
    /// keeps the capture open; any other representable key becomes the
    /// candidate binding and is either committed or parked behind a
    /// conflict confirmation.
    ///
    /// # Errors
    ///
    /// Propagates registry rejection of the commit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<CaptureOutcome, EditError> {
        let EditState::Capturing { action } = &self.state else {
            return Ok(CaptureOutcome::NotCapturing);
        };
        let action = action.clone();

        if key.code == KeyCode::Esc {
            self.state = EditState::Idle;
            return Ok(CaptureOutcome::Cancelled);
        }

        if matches!(key.code, KeyCode::Modifier(_)) {
            return Ok(CaptureOutcome::Pending {
                display: pending_display(key),
            });
        }

        let Some(candidate) = normalize_key_event(key) else {
            // Keys with no normalized form (media keys and the like) keep
            // the capture open, like a pure modifier press.
            debug!(code = ?key.code, "Ignoring unrepresentable key during capture");
            return Ok(CaptureOutcome::Pending {
                display: pending_display(key),
            });
        };

        match self.commit_candidate(&action, candidate)? {
            None => Ok(CaptureOutcome::Committed),
            Some(info) => Ok(CaptureOutcome::Conflict(info)),
        }
    }

    /// Resolve a pending conflict by reassigning: the conflicting action
    /// loses its binding and the held candidate is committed.
    ///
    /// Returns false (and does nothing) if no conflict is pending.
    ///
    /// # Errors
    ///
    /// Propagates registry rejection; the edit stays pending in that case.
    pub fn confirm_conflict(&mut self) -> Result<bool, EditError> {
        let EditState::PendingConflict {
            action,
            candidate,
            conflicting,
        } = &self.state
        else {
            return Ok(false);
        };
        let (action, candidate, conflicting) = (action.clone(), *candidate, conflicting.clone());

        self.store.clear(&conflicting)?;
        self.store.set(&action, candidate)?;
        self.state = EditState::Idle;
        self.committed()?;
        Ok(true)
    }

    /// Dismiss a pending conflict, discarding the held candidate with no
    /// mutation. Returns false if no conflict was pending.
    pub fn cancel_conflict(&mut self) -> bool {
        if matches!(self.state, EditState::PendingConflict { .. }) {
            self.state = EditState::Idle;
            true
        } else {
            false
        }
    }

    /// Clear the action's binding (the inline clear button). Valid from
    /// any state; clearing cannot collide, so no conflict scan runs and
    /// the editor returns to idle directly.
    ///
    /// # Errors
    ///
    /// Propagates registry rejection.
    pub fn clear_binding(&mut self, action: &str) -> Result<(), EditError> {
        self.state = EditState::Idle;
        self.store.clear(action)?;
        self.committed()?;
        Ok(())
    }

    /// Restore the action's captured default.
    ///
    /// Routed through the same conflict scan as a captured key: if the
    /// default now collides with another action's current binding, the
    /// editor parks the edit behind the usual confirmation. An action with
    /// no captured default is a no-op with no event.
    ///
    /// # Errors
    ///
    /// Propagates registry rejection.
    pub fn reset_binding(&mut self, action: &str) -> Result<ResetOutcome, EditError> {
        match self.store.default_binding(action) {
            None => Ok(ResetOutcome::NoDefault),
            Some(None) => {
                // Default was unbound: resetting is a clear.
                self.clear_binding(action)?;
                Ok(ResetOutcome::Committed)
            }
            Some(Some(default)) => match self.commit_candidate(action, default)? {
                None => Ok(ResetOutcome::Committed),
                Some(info) => Ok(ResetOutcome::Conflict(info)),
            },
        }
    }

    /// Commit `candidate` for `action`, or park it behind a conflict.
    ///
    /// Scans the last built tree's full action list (excluding the target)
    /// for an action whose current binding equals the candidate; first
    /// match in traversal order wins.
    fn commit_candidate(
        &mut self,
        action: &str,
        candidate: KeyBinding,
    ) -> Result<Option<ConflictInfo>, EditError> {
        let conflicting = self
            .tree
            .actions
            .iter()
            .find(|other| {
                other.as_str() != action
                    && self.store.current_or_unbound(other) == Some(candidate)
            })
            .cloned();

        match conflicting {
            Some(conflicting) => {
                let info = ConflictInfo {
                    candidate,
                    candidate_text: candidate.to_string(),
                    conflicting_display: self
                        .tree
                        .display_name(&conflicting)
                        .unwrap_or(&conflicting)
                        .to_string(),
                    conflicting_action: conflicting.clone(),
                };
                self.state = EditState::PendingConflict {
                    action: action.to_string(),
                    candidate,
                    conflicting,
                };
                Ok(Some(info))
            }
            None => {
                self.store.set(action, candidate)?;
                self.state = EditState::Idle;
                self.committed()?;
                Ok(None)
            }
        }
    }

    /// Queue the change event and rebuild after a committed mutation.
    fn committed(&mut self) -> Result<(), EditError> {
        self.events.push_back(KeymapEvent::Changed);
        self.rebuild()
    }

    // ---- listeners ------------------------------------------------------

    /// Register a single-action element whose shortcut label should be
    /// refreshed on every change.
    pub fn register_action(&mut self, action: &str) -> ListenerId {
        self.register(Listener::Button {
            action: action.to_string(),
        })
    }

    /// Register a multi-action element (menu) in display order.
    pub fn register_action_group(&mut self, actions: Vec<String>) -> ListenerId {
        self.register(Listener::Menu { actions })
    }

    fn register(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Drop a registered listener. Returns false if the id is unknown.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Recomputed labels for one listener, in its display order.
    pub fn listener_labels(&self, id: ListenerId) -> Option<Vec<ShortcutLabel>> {
        let (_, listener) = self.listeners.iter().find(|(lid, _)| *lid == id)?;
        Some(self.labels_for(listener))
    }

    /// Recomputed labels for every registered listener; called by the host
    /// after draining a `Changed` event.
    pub fn refresh_all(&self) -> Vec<(ListenerId, Vec<ShortcutLabel>)> {
        self.listeners
            .iter()
            .map(|(id, listener)| (*id, self.labels_for(listener)))
            .collect()
    }

    fn labels_for(&self, listener: &Listener) -> Vec<ShortcutLabel> {
        listener
            .action_ids()
            .iter()
            .map(|action| ShortcutLabel::new(action, self.store.current_or_unbound(action)))
            .collect()
    }

    // ---- persistence ----------------------------------------------------

    /// Snapshot the current bindings for the last built action list as a
    /// JSON document.
    pub fn to_json(&self) -> String {
        codec::encode_bindings(&self.snapshot())
    }

    /// Save the binding snapshot to `path` (atomic write).
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persistence`] on io failure; nothing is
    /// emitted on failure.
    pub fn save(&self, path: &std::path::Path) -> Result<(), EditError> {
        codec::save_bindings(path, &self.snapshot())?;
        Ok(())
    }

    /// Apply a binding document: explicit clears clear, bindings set,
    /// absent actions stay untouched, unknown action ids apply anyway.
    ///
    /// The document is decoded in full before anything is applied, so a
    /// malformed document leaves the store unchanged. One `Changed` event
    /// is queued after the whole load.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persistence`] for malformed documents and
    /// propagates registry rejection of an individual apply.
    pub fn apply_json(&mut self, text: &str) -> Result<(), EditError> {
        let entries = codec::decode_bindings(text)?;
        self.apply_entries(entries)
    }

    /// Load a binding file saved by [`KeymapEditor::save`] and apply it.
    ///
    /// # Errors
    ///
    /// A missing or unreadable file surfaces [`EditError::Persistence`];
    /// the in-memory store is unchanged on any failed load.
    pub fn load(&mut self, path: &std::path::Path) -> Result<(), EditError> {
        let entries = codec::load_bindings(path)?;
        self.apply_entries(entries)
    }

    fn apply_entries(&mut self, entries: Vec<keymap_config::BindingEntry>) -> Result<(), EditError> {
        for (action, binding) in entries {
            match binding {
                Some(binding) => self.store.set(&action, binding)?,
                None => self.store.clear(&action)?,
            }
        }
        self.committed()
    }

    fn snapshot(&self) -> Vec<keymap_config::BindingEntry> {
        self.tree
            .actions
            .iter()
            .map(|action| (action.clone(), self.store.current_or_unbound(action)))
            .collect()
    }
}

/// Transient display text while modifiers are held mid-capture.
fn pending_display(key: KeyEvent) -> String {
    let mut flags = convert_modifiers(key.modifiers);
    if let KeyCode::Modifier(held) = key.code {
        use crossterm::event::ModifierKeyCode;
        match held {
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => flags.ctrl = true,
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => flags.shift = true,
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => flags.alt = true,
            ModifierKeyCode::LeftSuper
            | ModifierKeyCode::RightSuper
            | ModifierKeyCode::LeftMeta
            | ModifierKeyCode::RightMeta => flags.meta = true,
            _ => {}
        }
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("{}+", flags)
    }
}

/// Normalize a raw crossterm key event into a [`KeyBinding`].
///
/// Returns `None` for keys with no normalized representation. The space
/// bar maps to `Space` and a shifted `Tab` to `BackTab`, matching the
/// textual syntax so captured and parsed bindings compare equal.
fn normalize_key_event(key: KeyEvent) -> Option<KeyBinding> {
    let modifiers = convert_modifiers(key.modifiers);

    let code = match key.code {
        KeyCode::Char(' ') => KeyCodeName::Space,
        KeyCode::Char(c) => KeyCodeName::Char(c),
        KeyCode::F(n) if (1..=20).contains(&n) => KeyCodeName::F(n),
        KeyCode::Enter => KeyCodeName::Enter,
        KeyCode::Tab if modifiers.shift => KeyCodeName::BackTab,
        KeyCode::Tab => KeyCodeName::Tab,
        KeyCode::BackTab => KeyCodeName::BackTab,
        KeyCode::Backspace => KeyCodeName::Backspace,
        KeyCode::Delete => KeyCodeName::Delete,
        KeyCode::Insert => KeyCodeName::Insert,
        KeyCode::Home => KeyCodeName::Home,
        KeyCode::End => KeyCodeName::End,
        KeyCode::PageUp => KeyCodeName::PageUp,
        KeyCode::PageDown => KeyCodeName::PageDown,
        KeyCode::Up => KeyCodeName::Up,
        KeyCode::Down => KeyCodeName::Down,
        KeyCode::Left => KeyCodeName::Left,
        KeyCode::Right => KeyCodeName::Right,
        _ => return None,
    };

    Some(KeyBinding { code, modifiers })
}

fn convert_modifiers(modifiers: KeyModifiers) -> ModifierFlags {
    ModifierFlags {
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        shift: modifiers.contains(KeyModifiers::SHIFT),
        alt: modifiers.contains(KeyModifiers::ALT),
        meta: modifiers.contains(KeyModifiers::SUPER)
            || modifiers.contains(KeyModifiers::META),
    }
}
