//! Key representation and binding persistence for the keymap widget.
//!
//! This crate provides the normalized key combination type, the
//! human-readable key-string syntax, and the codec used to persist
//! per-action bindings to disk. Terminal-backend integration lives in
//! the widget crate.

pub mod codec;
pub mod key;

pub use codec::{BindingEntry, CodecError, decode_bindings, encode_bindings, load_bindings, save_bindings};
pub use key::{KeyBinding, KeyCodeName, KeyError, ModifierFlags, parse_key};
