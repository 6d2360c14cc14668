//! Logging and debugging facilities.
//!
//! wrench-set uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("wrench_set_core::dispatch=trace,wrench_set=debug")
//!     .init();
//! ```
//!
//! Use [`HostTreeDebug`] to render a subtree of the host tree:
//!
//! ```
//! use wrench_set_core::HostTree;
//! use wrench_set_core::logging::{HostTreeDebug, TreeFormatOptions, TreeStyle};
//!
//! let mut tree = HostTree::new();
//! let root = tree.create_element("div");
//! tree.set_inner_html(root, "<b>bold</b>").unwrap();
//!
//! let options = TreeFormatOptions { style: TreeStyle::Ascii, ..TreeFormatOptions::minimal() };
//! let output = HostTreeDebug::with_options(options).format_subtree(&tree, root).unwrap();
//! assert_eq!(output, "<div>\n`-- <b>\n   `-- \"bold\"\n");
//! ```

use std::fmt::Write as FmtWrite;

use crate::error::{HostError, HostResult};
use crate::node::{NodeData, NodeId, NodeKind};
use crate::tree::HostTree;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Host tree structure and native listener table.
    pub const TREE: &str = "wrench_set_core::tree";
    /// Native event dispatch.
    pub const DISPATCH: &str = "wrench_set_core::dispatch";
    /// Widget lifecycle.
    pub const ELEMENT: &str = "wrench_set::element";
    /// Delegated listener registry.
    pub const REGISTRY: &str = "wrench_set::registry";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show element attributes.
    pub show_attributes: bool,
    /// Whether to show the number of native listeners per node.
    pub show_listeners: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_attributes: true,
            show_listeners: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            show_listeners: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output: tags and text only.
    pub fn minimal() -> Self {
        Self {
            show_attributes: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing host tree subtrees.
#[derive(Debug, Clone, Default)]
pub struct HostTreeDebug {
    options: TreeFormatOptions,
}

impl HostTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, tree: &HostTree, root: NodeId) -> HostResult<String> {
        let mut output = String::new();
        // Whether each ancestor level on the current path was a last child.
        let mut last_flags: Vec<bool> = Vec::new();
        let mut stack = vec![(root, 0usize, true)];

        while let Some((id, depth, is_last)) = stack.pop() {
            let data = tree.data(id).ok_or(HostError::InvalidNode)?;
            if depth > 0 {
                last_flags.truncate(depth - 1);
                last_flags.push(is_last);
            }
            output.push_str(&self.build_prefix(&last_flags, depth));
            self.write_node(id, data, &mut output);

            if self.options.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            let child_count = data.children.len();
            for (i, &child) in data.children.iter().enumerate().rev() {
                stack.push((child, depth + 1, i + 1 == child_count));
            }
        }
        Ok(output)
    }

    fn write_node(&self, id: NodeId, data: &NodeData, output: &mut String) {
        // Writing to a String cannot fail.
        match &data.kind {
            NodeKind::Text(text) => {
                let _ = write!(output, "{text:?}");
            }
            NodeKind::Element(element) => {
                output.push('<');
                output.push_str(&element.tag);
                if self.options.show_attributes {
                    for (name, value) in &element.attributes {
                        let _ = write!(output, " {name}=\"{value}\"");
                    }
                }
                output.push('>');
            }
        }
        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        if self.options.show_listeners && !data.listeners.is_empty() {
            let _ = write!(output, " ({} listeners)", data.listeners.len());
        }
        output.push('\n');
    }

    /// Build the prefix string for a node at `depth`.
    ///
    /// `last_flags[i]` tells whether the ancestor at level `i + 1` was the
    /// last child of its parent; finished levels are drawn as blank space.
    fn build_prefix(&self, last_flags: &[bool], depth: usize) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };
        let indent = " ".repeat(self.options.indent_size);
        let blank = " ".repeat(branch.chars().count());

        let mut prefix = String::new();
        for &ancestor_was_last in &last_flags[..depth - 1] {
            prefix.push_str(if ancestor_was_last { &blank } else { branch });
            prefix.push_str(&indent);
        }
        let is_last = last_flags[depth - 1];
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{HostEvent, ListenerOptions, Propagation};
    use crate::tree::SharedHostTree;
    use std::sync::Arc;

    fn sample() -> (HostTree, NodeId) {
        let mut tree = HostTree::new();
        let root = tree.create_element("div");
        tree.set_inner_html(root, "<ul class=\"menu\"><li>one</li><li>two</li></ul>")
            .unwrap();
        (tree, root)
    }

    #[test]
    fn test_format_unicode_hierarchy() {
        let (tree, root) = sample();
        let output = HostTreeDebug::new().format_subtree(&tree, root).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "<div>");
        assert_eq!(lines[1], "\u{2514}\u{2500}\u{2500} <ul class=\"menu\">");
        assert!(lines[2].ends_with("<li>"));
        assert!(lines[3].ends_with("\"one\""));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_finished_levels_are_blank() {
        let (tree, root) = sample();
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };
        let output = HostTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();
        assert_eq!(
            output,
            "<div>\n\
             `-- <ul>\n   \
             +-- <li>\n   \
             |  `-- \"one\"\n   \
             `-- <li>\n      \
             `-- \"two\"\n"
        );
    }

    #[test]
    fn test_format_deep_nesting() {
        let mut tree = HostTree::new();
        let root = tree.create_element("div");
        let mut parent = root;
        for _ in 0..5_000 {
            let child = tree.create_element("span");
            tree.append_child(parent, child).unwrap();
            parent = child;
        }
        let options = TreeFormatOptions {
            indent_size: 0,
            ..TreeFormatOptions::minimal()
        };
        let output = HostTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();
        assert_eq!(output.lines().count(), 5_001);
    }

    #[test]
    fn test_format_max_depth() {
        let (tree, root) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        };
        let output = HostTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains("menu"));
    }

    #[test]
    fn test_format_detailed_shows_listeners() {
        let (mut tree, root) = sample();
        tree.add_event_listener(
            root,
            "click",
            ListenerOptions::default(),
            Arc::new(|_: &mut HostEvent, _: &SharedHostTree| Ok(Propagation::Continue)),
        )
        .unwrap();
        let output = HostTreeDebug::with_options(TreeFormatOptions::detailed())
            .format_subtree(&tree, root)
            .unwrap();
        assert!(output.lines().next().unwrap().contains("(1 listeners)"));
        assert!(output.contains("[NodeId("));
    }

    #[test]
    fn test_format_invalid_node() {
        let (mut tree, root) = sample();
        tree.remove_node(root).unwrap();
        assert_eq!(
            HostTreeDebug::new().format_subtree(&tree, root),
            Err(HostError::InvalidNode)
        );
    }
}
