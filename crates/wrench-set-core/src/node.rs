//! Host tree nodes.

use slotmap::new_key_type;
use wrench_set_selector::SelectorElement;

use crate::event::NativeListenerId;
use crate::tree::HostTree;

new_key_type! {
    /// A unique identifier for a node in a [`HostTree`].
    ///
    /// `NodeId`s are stable handles that remain valid while the node is
    /// attached to or detached from parents. They become invalid when the
    /// node is removed with [`HostTree::remove_node`], unless it is retained.
    pub struct NodeId;
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name and attributes.
    Element(ElementData),
    /// A run of character data.
    Text(String),
}

/// Tag and attributes of an element node.
///
/// `class` and `id` are stored as ordinary attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Tag name, lowercase.
    pub tag: String,
    /// Attributes in insertion order, names lowercase.
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Value of an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: String) {
        let name = name.to_ascii_lowercase();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let pos = self.attributes.iter().position(|(key, _)| *key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Whether the `class` attribute contains `name` as a word.
    pub fn has_class(&self, name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == name))
    }
}

/// Internal data stored in the arena for each node.
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Native listeners in attach order.
    pub(crate) listeners: Vec<NativeListenerId>,
    /// Owned outside the tree; see `HostTree::retain_node`.
    pub(crate) retained: bool,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
            retained: false,
        }
    }

    pub(crate) fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }
}

/// A borrowed view of one element node, used for selector matching.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a HostTree,
    id: NodeId,
    element: &'a ElementData,
}

impl<'a> NodeRef<'a> {
    /// View `id` as an element; `None` for text nodes and unknown IDs.
    pub(crate) fn new(tree: &'a HostTree, id: NodeId) -> Option<Self> {
        let element = tree.data(id)?.element()?;
        Some(Self { tree, id, element })
    }

    /// The node's ID.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Walk element siblings in one direction.
    fn sibling(&self, forward: bool) -> Option<Self> {
        let parent = self.tree.data(self.id)?.parent?;
        let siblings = &self.tree.data(parent)?.children;
        let pos = siblings.iter().position(|&c| c == self.id)?;
        if forward {
            siblings[pos + 1..]
                .iter()
                .find_map(|&id| NodeRef::new(self.tree, id))
        } else {
            siblings[..pos]
                .iter()
                .rev()
                .find_map(|&id| NodeRef::new(self.tree, id))
        }
    }
}

impl SelectorElement for NodeRef<'_> {
    fn local_name(&self) -> &str {
        &self.element.tag
    }

    fn id(&self) -> Option<&str> {
        self.element.attribute("id")
    }

    fn has_class(&self, name: &str) -> bool {
        self.element.has_class(name)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.element.attribute(name)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.tree.data(self.id)?.parent?;
        NodeRef::new(self.tree, parent)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(false)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(true)
    }

    fn has_content(&self) -> bool {
        self.tree
            .data(self.id)
            .is_some_and(|data| !data.children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_case_insensitive_on_write() {
        let mut data = ElementData::new("DIV");
        assert_eq!(data.tag, "div");

        data.set_attribute("Data-Yup", "meho".to_string());
        assert_eq!(data.attribute("data-yup"), Some("meho"));

        data.set_attribute("data-yup", "meh".to_string());
        assert_eq!(data.attributes.len(), 1);
        assert_eq!(data.attribute("data-yup"), Some("meh"));

        assert_eq!(data.remove_attribute("DATA-YUP"), Some("meh".to_string()));
        assert_eq!(data.attribute("data-yup"), None);
    }

    #[test]
    fn test_has_class() {
        let mut data = ElementData::new("div");
        data.set_attribute("class", "bro jack  rick".to_string());
        assert!(data.has_class("jack"));
        assert!(data.has_class("rick"));
        assert!(!data.has_class("ja"));
    }
}
