//! Keybinding-configuration widget engine.
//!
//! Given a hierarchical map of human-readable action names to action ids,
//! this crate maintains a searchable, collapsible tree model, lets the
//! host rebind, clear, and reset each action's key combination, detects
//! and resolves binding conflicts through explicit user confirmation, and
//! persists the resulting bindings through `keymap-config`.
//!
//! The rendering layer is the host's: it observes [`KeymapEditor::tree`]
//! for structure and the binding store for values, and forwards raw key
//! events and clicks into the editor.

pub mod editor;
pub mod listener;
pub mod registry;
pub mod store;
pub mod tree;

pub use editor::{
    CaptureOutcome, ConflictInfo, EditError, EditState, KeymapEditor, KeymapEvent, ResetOutcome,
};
pub use listener::{Listener, ListenerId, ShortcutLabel};
pub use registry::{ActionRegistry, MemoryRegistry, RegistryError};
pub use store::BindingStore;
pub use tree::{ConfigEntry, ConfigValue, KeymapConfig, KeymapNode, KeymapTree, TreeError, build_tree};
