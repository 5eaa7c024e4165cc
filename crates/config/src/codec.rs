//! Binding persistence codec.
//!
//! Responsibilities:
//! - Encode an action's binding snapshot to a flat JSON document.
//! - Decode such a document back into per-action binding entries.
//! - Read and write binding files atomically (temp file + rename).
//!
//! Does NOT handle:
//! - Applying decoded entries to a registry (the widget crate does that).
//! - Validating action ids against the active keymap; files may be written
//!   before the corresponding keymap config is active, so unknown ids are
//!   passed through untouched.
//!
//! Invariants:
//! - Decoding is all-or-nothing: a malformed document or a malformed
//!   binding string yields an error and zero entries.
//! - An empty-string value means "explicitly cleared"; an absent action id
//!   means "not touched by this file".
//! - Output key order is deterministic (`BTreeMap`).

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::key::{KeyBinding, KeyError, parse_key};

/// Errors that can occur while saving or loading a binding file.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The file could not be read or written.
    #[error("Failed to access binding file: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not a flat JSON object of strings.
    #[error("Malformed binding file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A binding string inside an otherwise well-formed document is invalid.
    #[error("Invalid binding for action '{action}': {source}")]
    Key {
        /// The action id whose binding failed to parse
        action: String,
        /// The underlying parse failure
        source: KeyError,
    },
}

/// One decoded file entry: `None` means the file explicitly clears the action.
pub type BindingEntry = (String, Option<KeyBinding>);

/// Encode a binding snapshot as a flat JSON object.
///
/// Unbound actions encode as the empty string. Only the actions passed in
/// appear in the output; the caller supplies the action list it considers
/// current (typically the last built keymap tree's actions).
pub fn encode_bindings(entries: &[BindingEntry]) -> String {
    let map: BTreeMap<&str, String> = entries
        .iter()
        .map(|(action, binding)| {
            let value = binding.map(|b| b.to_string()).unwrap_or_default();
            (action.as_str(), value)
        })
        .collect();

    // BTreeMap of strings cannot fail to serialize
    serde_json::to_string_pretty(&map).unwrap_or_default()
}

/// Decode a binding document produced by [`encode_bindings`].
///
/// The whole document and every binding string are validated before any
/// entry is returned, so callers can apply the result without risking a
/// partially applied load.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] if the document is not a flat string map,
/// or [`CodecError::Key`] naming the offending action if a binding string
/// does not parse.
pub fn decode_bindings(text: &str) -> Result<Vec<BindingEntry>, CodecError> {
    let map: BTreeMap<String, String> = serde_json::from_str(text)?;

    let mut entries = Vec::with_capacity(map.len());
    for (action, value) in map {
        let binding = if value.is_empty() {
            None
        } else {
            Some(
                parse_key(&value).map_err(|source| CodecError::Key {
                    action: action.clone(),
                    source,
                })?,
            )
        };
        entries.push((action, binding));
    }

    Ok(entries)
}

/// Write a binding snapshot to `path`, creating parent directories.
///
/// The write is atomic: the document is written to a temp file in the same
/// directory and renamed over the target, so a crash mid-write never leaves
/// a truncated binding file behind.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if the directory cannot be created or the
/// file cannot be written.
pub fn save_bindings(path: &Path, entries: &[BindingEntry]) -> Result<(), CodecError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let document = encode_bindings(entries);

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, document)?;
    std::fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), entries = entries.len(), "Saved keybindings");
    Ok(())
}

/// Read and decode a binding file.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if the file is missing or unreadable, and the
/// decode errors documented on [`decode_bindings`]. A failed load reports
/// zero entries; it never reports a partial document.
pub fn load_bindings(path: &Path) -> Result<Vec<BindingEntry>, CodecError> {
    let text = std::fs::read_to_string(path)?;
    let entries = decode_bindings(&text)?;
    info!(path = %path.display(), entries = entries.len(), "Loaded keybindings");
    Ok(entries)
}
