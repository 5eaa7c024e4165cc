//! Keymap tree model.
//!
//! Responsibilities:
//! - Parse the host's nested action-map configuration into an ordered tree
//!   of sections and bindable leaves.
//! - Apply incremental substring filtering, pruning sections with no
//!   surviving leaves.
//! - Track collapse state across rebuilds by section name.
//!
//! Does NOT handle:
//! - Rendering (expand/collapse chrome, scroll handling).
//! - Binding values; leaves carry action ids only (see `store`).
//!
//! Invariants:
//! - Traversal is depth-first, pre-order, and deterministic for identical
//!   input, so UI row positions are stable across rebuilds.
//! - The source configuration is never mutated by a build.
//! - `actions` lists every leaf in the configuration regardless of the
//!   filter, so conflict scans and default capture see hidden actions too.
//! - Collapse state is keyed by section name, not path: two sections with
//!   the same name at different nesting levels share collapse state. This
//!   is an accepted quirk, kept for config-compatibility.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors that can occur while building the keymap tree.
#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    /// The same action id appears on more than one leaf.
    #[error("Duplicate action id in keymap config: '{action}'")]
    DuplicateAction {
        /// The duplicated action id
        action: String,
    },
}

/// One named entry in the configuration: a section or a bindable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Display name (section name, or the leaf's human-readable label)
    pub name: String,
    /// Nested entries or an action id
    pub value: ConfigValue,
}

/// The value side of a configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// A named grouping of further entries
    Section(Vec<ConfigEntry>),
    /// A bindable action id
    Action(String),
}

impl ConfigEntry {
    /// A leaf entry binding `display_name` to `action_id`.
    pub fn action(display_name: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            name: display_name.into(),
            value: ConfigValue::Action(action_id.into()),
        }
    }

    /// A section entry containing `children` in author order.
    pub fn section(name: impl Into<String>, children: Vec<ConfigEntry>) -> Self {
        Self {
            name: name.into(),
            value: ConfigValue::Section(children),
        }
    }
}

/// The host's keymap configuration: an ordered, arbitrarily nested mapping
/// whose leaves are action ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeymapConfig {
    /// Top-level entries in author order
    pub entries: Vec<ConfigEntry>,
}

impl KeymapConfig {
    /// A configuration from top-level entries in author order.
    pub fn new(entries: Vec<ConfigEntry>) -> Self {
        Self { entries }
    }
}

/// A node of the built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapNode {
    /// A named grouping node; purely organizational, not bindable.
    Section {
        /// Section name (unique among siblings)
        name: String,
        /// Whether the renderer should elide the children
        collapsed: bool,
        /// Child nodes in author order
        children: Vec<KeymapNode>,
    },
    /// A bindable row.
    Leaf {
        /// Human-readable label
        display_name: String,
        /// Stable action id
        action_id: String,
    },
}

/// The result of a build: the filtered node tree plus the full ordered
/// action list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeymapTree {
    /// Root nodes surviving the filter, in author order
    pub nodes: Vec<KeymapNode>,
    /// Every action id in the configuration, depth-first pre-order,
    /// regardless of the filter
    pub actions: Vec<String>,
}

impl KeymapTree {
    /// The display name of the leaf carrying `action_id`, if present in the
    /// filtered tree.
    pub fn display_name(&self, action_id: &str) -> Option<&str> {
        fn find<'a>(nodes: &'a [KeymapNode], action_id: &str) -> Option<&'a str> {
            for node in nodes {
                match node {
                    KeymapNode::Leaf {
                        display_name,
                        action_id: id,
                    } if id == action_id => return Some(display_name),
                    KeymapNode::Section { children, .. } => {
                        if let Some(found) = find(children, action_id) {
                            return Some(found);
                        }
                    }
                    KeymapNode::Leaf { .. } => {}
                }
            }
            None
        }
        find(&self.nodes, action_id)
    }
}

/// Build the tree for `config` under the given filter and collapse state.
///
/// A leaf survives the filter iff the filter is empty, or it is a
/// case-insensitive substring of the leaf's display name, or of the action
/// id with underscores replaced by spaces. A section survives iff at least
/// one descendant leaf survives. Collapsed sections keep their children in
/// the returned nodes; collapse is a display property, not a filter.
///
/// # Errors
///
/// Returns [`TreeError::DuplicateAction`] if any action id appears on more
/// than one leaf, filtered or not.
pub fn build_tree(
    config: &KeymapConfig,
    filter: &str,
    collapsed: &BTreeSet<String>,
) -> Result<KeymapTree, TreeError> {
    let filter_lower = filter.trim().to_lowercase();

    let mut actions = Vec::new();
    let mut seen = BTreeSet::new();
    let nodes = walk(
        &config.entries,
        &filter_lower,
        collapsed,
        &mut actions,
        &mut seen,
    )?;

    Ok(KeymapTree { nodes, actions })
}

fn walk(
    entries: &[ConfigEntry],
    filter_lower: &str,
    collapsed: &BTreeSet<String>,
    actions: &mut Vec<String>,
    seen: &mut BTreeSet<String>,
) -> Result<Vec<KeymapNode>, TreeError> {
    let mut nodes = Vec::new();

    for entry in entries {
        match &entry.value {
            ConfigValue::Action(action_id) => {
                if !seen.insert(action_id.clone()) {
                    return Err(TreeError::DuplicateAction {
                        action: action_id.clone(),
                    });
                }
                actions.push(action_id.clone());

                if leaf_matches(filter_lower, &entry.name, action_id) {
                    nodes.push(KeymapNode::Leaf {
                        display_name: entry.name.clone(),
                        action_id: action_id.clone(),
                    });
                }
            }
            ConfigValue::Section(children) => {
                let child_nodes = walk(children, filter_lower, collapsed, actions, seen)?;
                // Sections with no surviving leaves are pruned from the
                // output; the source configuration is untouched.
                if !child_nodes.is_empty() {
                    nodes.push(KeymapNode::Section {
                        name: entry.name.clone(),
                        collapsed: collapsed.contains(&entry.name),
                        children: child_nodes,
                    });
                }
            }
        }
    }

    Ok(nodes)
}

fn leaf_matches(filter_lower: &str, display_name: &str, action_id: &str) -> bool {
    if filter_lower.is_empty() {
        return true;
    }
    display_name.to_lowercase().contains(filter_lower)
        || action_id.replace('_', " ").to_lowercase().contains(filter_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> KeymapConfig {
        KeymapConfig::new(vec![
            ConfigEntry::section(
                "Movement",
                vec![
                    ConfigEntry::action("Jump", "jump"),
                    ConfigEntry::action("Run Fast", "run_fast"),
                    ConfigEntry::section("Camera", vec![ConfigEntry::action("Pan Left", "pan_left")]),
                ],
            ),
            ConfigEntry::section("Combat", vec![ConfigEntry::action("Attack", "attack")]),
        ])
    }

    fn no_collapse() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_build_preserves_author_order() {
        let tree = build_tree(&sample_config(), "", &no_collapse()).unwrap();
        assert_eq!(tree.actions, vec!["jump", "run_fast", "pan_left", "attack"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = sample_config();
        let first = build_tree(&config, "", &no_collapse()).unwrap();
        let second = build_tree(&config, "", &no_collapse()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_by_display_name_case_insensitive() {
        let tree = build_tree(&sample_config(), "JUMP", &no_collapse()).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        match &tree.nodes[0] {
            KeymapNode::Section { name, children, .. } => {
                assert_eq!(name, "Movement");
                assert_eq!(children.len(), 1);
                assert!(matches!(
                    &children[0],
                    KeymapNode::Leaf { action_id, .. } if action_id == "jump"
                ));
            }
            other => panic!("expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_matches_action_id_with_spaces() {
        // "run fast" matches action id "run_fast" with underscores replaced
        let tree = build_tree(&sample_config(), "run fast", &no_collapse()).unwrap();
        assert_eq!(tree.display_name("run_fast"), Some("Run Fast"));
    }

    #[test]
    fn test_filter_prunes_empty_sections() {
        let tree = build_tree(&sample_config(), "attack", &no_collapse()).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert!(matches!(
            &tree.nodes[0],
            KeymapNode::Section { name, .. } if name == "Combat"
        ));
    }

    #[test]
    fn test_filter_keeps_full_action_list() {
        // Hidden leaves still participate in conflict scans
        let tree = build_tree(&sample_config(), "attack", &no_collapse()).unwrap();
        assert_eq!(tree.actions, vec!["jump", "run_fast", "pan_left", "attack"]);
    }

    #[test]
    fn test_filter_is_monotonic() {
        let full = build_tree(&sample_config(), "", &no_collapse()).unwrap();
        let filtered = build_tree(&sample_config(), "pan", &no_collapse()).unwrap();

        fn leaves(nodes: &[KeymapNode], out: &mut Vec<String>) {
            for node in nodes {
                match node {
                    KeymapNode::Leaf { action_id, .. } => out.push(action_id.clone()),
                    KeymapNode::Section { children, .. } => leaves(children, out),
                }
            }
        }
        let mut full_leaves = Vec::new();
        let mut filtered_leaves = Vec::new();
        leaves(&full.nodes, &mut full_leaves);
        leaves(&filtered.nodes, &mut filtered_leaves);

        for leaf in &filtered_leaves {
            assert!(full_leaves.contains(leaf));
        }
    }

    #[test]
    fn test_collapse_state_keyed_by_name() {
        let mut collapsed = BTreeSet::new();
        collapsed.insert("Camera".to_string());
        let tree = build_tree(&sample_config(), "", &collapsed).unwrap();

        fn find_section<'a>(nodes: &'a [KeymapNode], name: &str) -> Option<&'a KeymapNode> {
            for node in nodes {
                if let KeymapNode::Section {
                    name: n, children, ..
                } = node
                {
                    if n == name {
                        return Some(node);
                    }
                    if let Some(found) = find_section(children, name) {
                        return Some(found);
                    }
                }
            }
            None
        }

        match find_section(&tree.nodes, "Camera") {
            Some(KeymapNode::Section {
                collapsed: true,
                children,
                ..
            }) => {
                // Children survive; collapse is a display property
                assert!(!children.is_empty());
            }
            other => panic!("expected collapsed Camera section, got {:?}", other),
        }
    }

    #[test]
    fn test_same_named_sections_share_collapse_state() {
        let config = KeymapConfig::new(vec![
            ConfigEntry::section("Tools", vec![ConfigEntry::action("Cut", "cut")]),
            ConfigEntry::section(
                "Advanced",
                vec![ConfigEntry::section(
                    "Tools",
                    vec![ConfigEntry::action("Weld", "weld")],
                )],
            ),
        ]);
        let mut collapsed = BTreeSet::new();
        collapsed.insert("Tools".to_string());
        let tree = build_tree(&config, "", &collapsed).unwrap();

        let mut collapsed_count = 0;
        fn count(nodes: &[KeymapNode], name: &str, acc: &mut usize) {
            for node in nodes {
                if let KeymapNode::Section {
                    name: n,
                    collapsed,
                    children,
                } = node
                {
                    if n == name && *collapsed {
                        *acc += 1;
                    }
                    count(children, name, acc);
                }
            }
        }
        count(&tree.nodes, "Tools", &mut collapsed_count);
        assert_eq!(collapsed_count, 2);
    }

    #[test]
    fn test_duplicate_action_id_rejected() {
        let config = KeymapConfig::new(vec![
            ConfigEntry::action("Jump", "jump"),
            ConfigEntry::section("Other", vec![ConfigEntry::action("Leap", "jump")]),
        ]);
        assert_eq!(
            build_tree(&config, "", &no_collapse()),
            Err(TreeError::DuplicateAction {
                action: "jump".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_detected_even_when_filtered_out() {
        let config = KeymapConfig::new(vec![
            ConfigEntry::action("Jump", "jump"),
            ConfigEntry::action("Leap", "jump"),
        ]);
        assert!(build_tree(&config, "nomatch", &no_collapse()).is_err());
    }
}
