//! Property-based tests for key parsing and binding persistence.
//!
//! These tests verify the two round-trip laws the rest of the widget relies
//! on, using randomly generated inputs to catch edge cases that might not
//! be covered by unit tests:
//! - `parse_key` is the inverse of `Display` for every representable binding.
//! - `decode_bindings` is the inverse of `encode_bindings` for every
//!   binding snapshot.

use std::collections::BTreeMap;

use proptest::prelude::*;

use keymap_config::{
    KeyBinding, KeyCodeName, ModifierFlags, decode_bindings, encode_bindings, parse_key,
};

/// Strategy for generating key codes that have a textual spelling.
///
/// Covers the whole printable-ASCII range including `'+'`, which is
/// spelled as a trailing plus ("Ctrl++"). Whitespace is excluded: capture
/// normalizes the space bar to `Space` and no other whitespace key exists.
fn key_code_strategy() -> impl Strategy<Value = KeyCodeName> {
    prop_oneof![
        prop::char::range('!', '~').prop_map(KeyCodeName::Char),
        (1u8..=20u8).prop_map(KeyCodeName::F),
        Just(KeyCodeName::Esc),
        Just(KeyCodeName::Enter),
        Just(KeyCodeName::Space),
        Just(KeyCodeName::Tab),
        Just(KeyCodeName::BackTab),
        Just(KeyCodeName::Backspace),
        Just(KeyCodeName::Delete),
        Just(KeyCodeName::Insert),
        Just(KeyCodeName::Home),
        Just(KeyCodeName::End),
        Just(KeyCodeName::PageUp),
        Just(KeyCodeName::PageDown),
        Just(KeyCodeName::Up),
        Just(KeyCodeName::Down),
        Just(KeyCodeName::Left),
        Just(KeyCodeName::Right),
    ]
}

/// Strategy for generating normalized key bindings.
///
/// `Shift+Tab` is spelled `BackTab` after normalization, so the generator
/// applies the same rewrite `parse_key` would.
fn key_binding_strategy() -> impl Strategy<Value = KeyBinding> {
    (
        key_code_strategy(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(code, ctrl, shift, alt, meta)| {
            let code = if matches!(code, KeyCodeName::Tab) && shift {
                KeyCodeName::BackTab
            } else {
                code
            };
            KeyBinding {
                code,
                modifiers: ModifierFlags {
                    ctrl,
                    shift,
                    alt,
                    meta,
                },
            }
        })
}

/// Strategy for generating action ids in the usual snake_case shape.
fn action_id_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,24}"
}

/// Strategy for generating a binding snapshot: distinct action ids mapped
/// to a binding or an explicit clear.
fn snapshot_strategy() -> impl Strategy<Value = BTreeMap<String, Option<KeyBinding>>> {
    prop::collection::btree_map(
        action_id_strategy(),
        prop::option::of(key_binding_strategy()),
        0..16,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Parsing the canonical display text of any binding yields the same
    /// binding back. This is what makes the persisted format lossless.
    #[test]
    fn test_display_parse_identity(binding in key_binding_strategy()) {
        let text = binding.to_string();
        let reparsed = parse_key(&text);
        prop_assert_eq!(reparsed, Ok(binding), "failed for '{}'", text);
    }

    /// Encoding a snapshot and decoding it back reproduces every entry,
    /// including explicit clears.
    #[test]
    fn test_codec_round_trip(snapshot in snapshot_strategy()) {
        let entries: Vec<(String, Option<KeyBinding>)> =
            snapshot.iter().map(|(a, b)| (a.clone(), *b)).collect();

        let decoded = decode_bindings(&encode_bindings(&entries))
            .expect("encoded snapshot must decode");

        prop_assert_eq!(decoded, entries);
    }

    /// Display is injective: two bindings that render to the same text are
    /// the same binding, so conflict detection and the on-screen shortcut
    /// never disagree.
    #[test]
    fn test_display_is_injective(
        a in key_binding_strategy(),
        b in key_binding_strategy(),
    ) {
        if a.to_string() == b.to_string() {
            prop_assert_eq!(a, b);
        }
    }
}
