//! Key combination parsing and canonical display.
//!
//! Responsibilities:
//! - Define the normalized key combination type (`KeyBinding`).
//! - Parse human-readable key strings into structured representations.
//! - Render key combinations back to their canonical text form.
//!
//! Does NOT handle:
//! - Integration with crossterm (that's in the widget crate).
//! - Conflict detection or persistence (see `codec` and the widget crate).
//!
//! Invariants:
//! - `parse_key(binding.to_string()) == Ok(binding)` for every binding.
//! - Modifier order never affects equality; flags are fields, not a list.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a key string.
#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    /// Invalid key syntax
    #[error("Invalid key syntax: '{key}'. Expected format like 'q', 'Ctrl+x', 'Shift+Tab', 'F1'")]
    InvalidSyntax {
        /// The invalid key string
        key: String,
    },

    /// Unknown key name
    #[error("Unknown key name: '{name}'")]
    UnknownKey {
        /// The unknown key name
        name: String,
    },
}

/// Key code names that can appear in a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCodeName {
    /// A character key (e.g., 'a', '1', '?')
    Char(char),
    /// Function key F1-F20
    F(u8),
    /// Escape key
    Esc,
    /// Enter/Return key
    Enter,
    /// Space key
    Space,
    /// Tab key
    Tab,
    /// BackTab (Shift+Tab) key
    BackTab,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Insert key
    Insert,
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
    /// Up arrow key
    Up,
    /// Down arrow key
    Down,
    /// Left arrow key
    Left,
    /// Right arrow key
    Right,
}

impl fmt::Display for KeyCodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{}", c),
            Self::F(n) => write!(f, "F{}", n),
            Self::Esc => write!(f, "Esc"),
            Self::Enter => write!(f, "Enter"),
            Self::Space => write!(f, "Space"),
            Self::Tab => write!(f, "Tab"),
            Self::BackTab => write!(f, "BackTab"),
            Self::Backspace => write!(f, "Backspace"),
            Self::Delete => write!(f, "Delete"),
            Self::Insert => write!(f, "Insert"),
            Self::Home => write!(f, "Home"),
            Self::End => write!(f, "End"),
            Self::PageUp => write!(f, "PageUp"),
            Self::PageDown => write!(f, "PageDown"),
            Self::Up => write!(f, "Up"),
            Self::Down => write!(f, "Down"),
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
        }
    }
}

/// Modifier flags for key combinations.
///
/// Equality is field-wise, so two combinations written with modifiers in a
/// different order always compare equal once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ModifierFlags {
    /// Control key pressed
    pub ctrl: bool,
    /// Shift key pressed
    pub shift: bool,
    /// Alt/Option key pressed
    pub alt: bool,
    /// Meta/Super/Command key pressed
    pub meta: bool,
}

impl ModifierFlags {
    /// Returns true if no modifier is set.
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.shift || self.alt || self.meta)
    }
}

impl fmt::Display for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.meta {
            parts.push("Meta");
        }
        if parts.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// A normalized physical key combination: base key code plus modifier flags.
///
/// Two bindings are equal iff key code and modifier set match exactly; the
/// text they were parsed from does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBinding {
    /// The base key code
    pub code: KeyCodeName,
    /// Modifier flags
    pub modifiers: ModifierFlags,
}

impl KeyBinding {
    /// A binding with no modifiers.
    pub fn plain(code: KeyCodeName) -> Self {
        Self {
            code,
            modifiers: ModifierFlags::default(),
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}+{}", self.modifiers, self.code)
        }
    }
}

/// Parse a key string like "Ctrl+x", "F1", "Shift+Tab" into a [`KeyBinding`].
///
/// # Examples
///
/// ```
/// use keymap_config::key::{parse_key, KeyCodeName};
///
/// let key = parse_key("Ctrl+x").unwrap();
/// assert!(matches!(key.code, KeyCodeName::Char('x')));
/// assert!(key.modifiers.ctrl);
///
/// let key = parse_key("F1").unwrap();
/// assert!(matches!(key.code, KeyCodeName::F(1)));
/// ```
pub fn parse_key(key_str: &str) -> Result<KeyBinding, KeyError> {
    let key_str = key_str.trim();

    if key_str.is_empty() {
        return Err(KeyError::InvalidSyntax {
            key: key_str.to_string(),
        });
    }

    // "+" and "Ctrl++" spell the literal plus key; peel it off before
    // splitting so the separator scan below never sees it. A dangling
    // separator like "Ctrl+" stays invalid.
    let (body, literal_plus) = match key_str.strip_suffix('+').map(str::trim_end) {
        Some("") => ("", true),
        Some(rest) => match rest.strip_suffix('+') {
            Some(mods) => (mods, true),
            None => (key_str, false),
        },
        None => (key_str, false),
    };

    // Split by '+' to handle modifiers
    let parts: Vec<&str> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('+').map(|s| s.trim()).collect()
    };

    let mut modifiers = ModifierFlags::default();
    let mut key_name = "";

    // Parse modifiers and find the key name
    for part in &parts {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            "alt" => modifiers.alt = true,
            "meta" | "super" | "cmd" => modifiers.meta = true,
            _ => {
                if key_name.is_empty() {
                    key_name = part;
                } else {
                    // Multiple non-modifier parts is invalid
                    return Err(KeyError::InvalidSyntax {
                        key: key_str.to_string(),
                    });
                }
            }
        }
    }

    if literal_plus {
        // The plus key cannot be combined with another key name
        if !key_name.is_empty() {
            return Err(KeyError::InvalidSyntax {
                key: key_str.to_string(),
            });
        }
        return Ok(KeyBinding {
            code: KeyCodeName::Char('+'),
            modifiers,
        });
    }

    if key_name.is_empty() {
        return Err(KeyError::InvalidSyntax {
            key: key_str.to_string(),
        });
    }

    let code = parse_key_code(key_name)?;

    // Shift+Tab and BackTab are the same physical key
    let code = if matches!(code, KeyCodeName::Tab) && modifiers.shift {
        KeyCodeName::BackTab
    } else {
        code
    };

    Ok(KeyBinding { code, modifiers })
}

/// Parse a key code name (without modifiers).
fn parse_key_code(name: &str) -> Result<KeyCodeName, KeyError> {
    let name_lower = name.to_ascii_lowercase();

    // Check for special keys
    match name_lower.as_str() {
        "esc" | "escape" => return Ok(KeyCodeName::Esc),
        "enter" | "return" => return Ok(KeyCodeName::Enter),
        "space" => return Ok(KeyCodeName::Space),
        "tab" => return Ok(KeyCodeName::Tab),
        "backtab" => return Ok(KeyCodeName::BackTab),
        "backspace" => return Ok(KeyCodeName::Backspace),
        "delete" | "del" => return Ok(KeyCodeName::Delete),
        "insert" | "ins" => return Ok(KeyCodeName::Insert),
        "home" => return Ok(KeyCodeName::Home),
        "end" => return Ok(KeyCodeName::End),
        "pageup" | "page_up" | "pgup" => return Ok(KeyCodeName::PageUp),
        "pagedown" | "page_down" | "pgdn" => return Ok(KeyCodeName::PageDown),
        "up" => return Ok(KeyCodeName::Up),
        "down" => return Ok(KeyCodeName::Down),
        "left" => return Ok(KeyCodeName::Left),
        "right" => return Ok(KeyCodeName::Right),
        _ => {}
    }

    // Check for function keys (F1-F20)
    if let Some(num_str) = name_lower.strip_prefix('f')
        && let Ok(num) = num_str.parse::<u8>()
        && (1..=20).contains(&num)
    {
        return Ok(KeyCodeName::F(num));
    }

    // Check for single character
    let chars: Vec<char> = name.chars().collect();
    if chars.len() == 1 {
        return Ok(KeyCodeName::Char(chars[0]));
    }

    Err(KeyError::UnknownKey {
        name: name.to_string(),
    })
}
