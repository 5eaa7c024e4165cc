//! Listener registration for external shortcut labels.
//!
//! Responsibilities:
//! - Associate host UI elements (buttons, menus) with the action ids whose
//!   shortcut text they display.
//! - Recompute display labels after binding changes.
//!
//! Does NOT handle:
//! - Painting labels or owning widget references; the host keeps its own
//!   element handles and matches them to [`ListenerId`]s.

use keymap_config::KeyBinding;

/// Opaque handle the host keeps for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A registered external element, tagged by kind instead of inspecting the
/// host's widget types at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listener {
    /// A single-action element (an inline shortcut button).
    Button {
        /// The tracked action id
        action: String,
    },
    /// A multi-action element (a menu with one row per action).
    Menu {
        /// The tracked action ids, in menu order
        actions: Vec<String>,
    },
}

impl Listener {
    /// The action ids this listener tracks, in display order.
    pub fn action_ids(&self) -> &[String] {
        match self {
            Self::Button { action } => std::slice::from_ref(action),
            Self::Menu { actions } => actions,
        }
    }
}

/// Recomputed shortcut text for one tracked action. `None` means the
/// action is currently unbound and the host should show a blank shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutLabel {
    /// The tracked action id
    pub action: String,
    /// Canonical shortcut text, if bound
    pub text: Option<String>,
}

impl ShortcutLabel {
    pub(crate) fn new(action: &str, binding: Option<KeyBinding>) -> Self {
        Self {
            action: action.to_string(),
            text: binding.map(|b| b.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymap_config::parse_key;

    #[test]
    fn test_button_tracks_one_action() {
        let listener = Listener::Button {
            action: "jump".to_string(),
        };
        assert_eq!(listener.action_ids(), ["jump".to_string()]);
    }

    #[test]
    fn test_menu_preserves_order() {
        let listener = Listener::Menu {
            actions: vec!["save".to_string(), "load".to_string()],
        };
        assert_eq!(
            listener.action_ids(),
            ["save".to_string(), "load".to_string()]
        );
    }

    #[test]
    fn test_label_text_is_canonical_display() {
        let label = ShortcutLabel::new("jump", Some(parse_key("shift+ctrl+j").unwrap()));
        assert_eq!(label.text.as_deref(), Some("Ctrl+Shift+j"));

        let unbound = ShortcutLabel::new("run", None);
        assert_eq!(unbound.text, None);
    }
}
