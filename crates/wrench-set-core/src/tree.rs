//! The host tree: an arena of element and text nodes with native listeners.
//!
//! [`HostTree`] owns every node in a [`SlotMap`] keyed by [`NodeId`], plus a
//! table of native listeners keyed by [`NativeListenerId`]. Parent/child links
//! are kept on both sides and mutated together, so a node is either a root or
//! listed exactly once in its parent's children.
//!
//! [`SharedHostTree`] wraps the tree in an `Arc<RwLock<_>>` so that widgets,
//! listeners, and the dispatcher can all hold it.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use slotmap::SlotMap;
use wrench_set_selector::{SelectorList, parse_selector_list};

use crate::error::{HostError, HostResult};
use crate::event::{ListenerOptions, NativeHandler, NativeListener, NativeListenerId};
use crate::logging::{HostTreeDebug, targets};
use crate::markup::{self, MarkupContent};
use crate::node::{ElementData, NodeData, NodeId, NodeKind, NodeRef};

/// A native listener as stored in the listener table.
pub(crate) struct ListenerRecord {
    pub(crate) node: NodeId,
    pub(crate) event_type: String,
    pub(crate) options: ListenerOptions,
    pub(crate) handler: NativeHandler,
}

/// Node arena and native listener table.
pub struct HostTree {
    nodes: SlotMap<NodeId, NodeData>,
    listeners: SlotMap<NativeListenerId, ListenerRecord>,
}

impl HostTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            listeners: SlotMap::with_key(),
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    fn data_or_err(&self, id: NodeId) -> HostResult<&NodeData> {
        self.nodes.get(id).ok_or(HostError::InvalidNode)
    }

    fn element_data(&self, id: NodeId) -> HostResult<&ElementData> {
        self.data_or_err(id)?.element().ok_or(HostError::NotAnElement)
    }

    fn element_data_mut(&mut self, id: NodeId) -> HostResult<&mut ElementData> {
        match &mut self.nodes.get_mut(id).ok_or(HostError::InvalidNode)?.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(HostError::NotAnElement),
        }
    }

    // =========================================================================
    // Node creation and content
    // =========================================================================

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self
            .nodes
            .insert(NodeData::new(NodeKind::Element(ElementData::new(tag))));
        tracing::trace!(target: targets::TREE, ?id, tag, "created element");
        id
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData::new(NodeKind::Text(text.into())))
    }

    /// Check if a node exists in the tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Total number of nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// What the node holds.
    pub fn kind(&self, id: NodeId) -> HostResult<&NodeKind> {
        Ok(&self.data_or_err(id)?.kind)
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> HostResult<&str> {
        Ok(&self.element_data(id)?.tag)
    }

    /// Replace the `class` attribute.
    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) -> HostResult<()> {
        self.set_attribute(id, "class", class_name)
    }

    /// The `class` attribute, or an empty string.
    pub fn class_name(&self, id: NodeId) -> HostResult<&str> {
        Ok(self.element_data(id)?.attribute("class").unwrap_or(""))
    }

    /// Individual class names, in attribute order.
    pub fn class_list(&self, id: NodeId) -> HostResult<Vec<&str>> {
        Ok(self.class_name(id)?.split_ascii_whitespace().collect())
    }

    /// Set an attribute. Names are lowercased.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> HostResult<()> {
        self.element_data_mut(id)?
            .set_attribute(name, value.to_string());
        Ok(())
    }

    /// Get an attribute value.
    pub fn attribute(&self, id: NodeId, name: &str) -> HostResult<Option<&str>> {
        Ok(self
            .element_data(id)?
            .attribute(&name.to_ascii_lowercase()))
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> HostResult<Option<String>> {
        Ok(self.element_data_mut(id)?.remove_attribute(name))
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> HostResult<String> {
        let mut output = String::new();
        let mut nodes = vec![id];
        nodes.extend(self.descendants(id)?);
        for node in nodes {
            if let Some(NodeKind::Text(text)) = self.nodes.get(node).map(|data| &data.kind) {
                output.push_str(text);
            }
        }
        Ok(output)
    }

    /// Replace the children of `id` with a parsed markup fragment.
    ///
    /// The fragment is parsed before anything is touched, so invalid markup
    /// leaves the node unchanged. The old children are removed as with
    /// [`remove_node`](Self::remove_node).
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> HostResult<()> {
        self.element_data(id)?;
        let fragment = markup::parse_fragment(markup)?;

        let old_children = self.data_or_err(id)?.children.clone();
        for child in old_children {
            self.remove_node(child)?;
        }

        // Parents always precede their children in the fragment.
        let mut built: Vec<NodeId> = Vec::with_capacity(fragment.len());
        for node in fragment {
            let kind = match node.content {
                MarkupContent::Text(text) => NodeKind::Text(text),
                MarkupContent::Element { tag, attributes } => {
                    let mut element = ElementData::new(&tag);
                    element.attributes = attributes;
                    NodeKind::Element(element)
                }
            };
            let child = self.nodes.insert(NodeData::new(kind));
            let parent = node.parent.and_then(|index| built.get(index).copied()).unwrap_or(id);
            self.attach(parent, child);
            built.push(child);
        }
        tracing::trace!(target: targets::TREE, ?id, len = markup.len(), nodes = built.len(), "set inner html");
        Ok(())
    }

    /// Serialize the children of `id` to markup.
    pub fn inner_html(&self, id: NodeId) -> HostResult<String> {
        let mut output = String::new();
        markup::serialize_children(self, id, &mut output)?;
        Ok(output)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> HostResult<()> {
        self.element_data(parent)?;
        if !self.nodes.contains_key(child) {
            return Err(HostError::InvalidNode);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(HostError::CircularParentage);
        }
        self.detach(child)?;
        self.attach(parent, child);
        tracing::trace!(target: targets::TREE, ?parent, ?child, "appended child");
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(data) = self.nodes.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.nodes.get_mut(parent) {
            data.children.push(child);
        }
    }

    /// Remove `child` from `parent`. The child stays in the tree as a root.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> HostResult<()> {
        self.data_or_err(parent)?;
        if self.data_or_err(child)?.parent != Some(parent) {
            return Err(HostError::NotAChild);
        }
        self.detach(child)
    }

    /// Remove a node from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) -> HostResult<()> {
        let parent = self.data_or_err(id)?.parent;
        if let Some(parent) = parent {
            if let Some(data) = self.nodes.get_mut(parent) {
                data.children.retain(|&c| c != id);
            }
            if let Some(data) = self.nodes.get_mut(id) {
                data.parent = None;
            }
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(node).and_then(|d| d.parent);
        }
        false
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> HostResult<Option<NodeId>> {
        Ok(self.data_or_err(id)?.parent)
    }

    /// Get the children of a node, text nodes included.
    pub fn children(&self, id: NodeId) -> HostResult<&[NodeId]> {
        Ok(&self.data_or_err(id)?.children)
    }

    /// Get the element children of a node.
    pub fn element_children(&self, id: NodeId) -> HostResult<Vec<NodeId>> {
        Ok(self
            .children(id)?
            .iter()
            .copied()
            .filter(|&c| self.nodes.get(c).is_some_and(|d| d.element().is_some()))
            .collect())
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> HostResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.data_or_err(id)?.parent;
        while let Some(node) = current {
            result.push(node);
            current = self.nodes.get(node).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// Remove a node and its subtree from the tree.
    ///
    /// Native listeners attached to removed nodes are dropped with them.
    /// Retained nodes are never freed here: a retained descendant is
    /// detached and kept, with its own subtree, as a new root, and removing a
    /// retained node only detaches it. See [`retain_node`](Self::retain_node).
    #[tracing::instrument(skip(self), target = "wrench_set_core::tree", level = "trace")]
    pub fn remove_node(&mut self, id: NodeId) -> HostResult<()> {
        self.detach(id)?;
        if self.data_or_err(id)?.retained {
            tracing::trace!(target: targets::TREE, ?id, "retained node detached, not removed");
            return Ok(());
        }

        let mut doomed = Vec::new();
        let mut kept = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(data) = self.nodes.get(node) else {
                continue;
            };
            if node != id && data.retained {
                kept.push(node);
                continue;
            }
            doomed.push(node);
            stack.extend(data.children.iter().copied());
        }
        for &node in &kept {
            self.detach(node)?;
        }

        let mut listeners_dropped = 0;
        for node in &doomed {
            if let Some(data) = self.nodes.remove(*node) {
                for listener in data.listeners {
                    if self.listeners.remove(listener).is_some() {
                        listeners_dropped += 1;
                    }
                }
            }
        }
        tracing::trace!(
            target: targets::TREE,
            ?id,
            nodes = doomed.len(),
            kept = kept.len(),
            listeners_dropped,
            "removed subtree"
        );
        Ok(())
    }

    /// Mark a node as owned by someone outside the tree.
    ///
    /// A retained node survives [`remove_node`](Self::remove_node) of itself
    /// or of any ancestor, so its `NodeId` and listeners stay valid until the
    /// owner calls [`release_node`](Self::release_node).
    pub fn retain_node(&mut self, id: NodeId) -> HostResult<()> {
        self.nodes.get_mut(id).ok_or(HostError::InvalidNode)?.retained = true;
        Ok(())
    }

    /// Whether the node is retained.
    pub fn is_retained(&self, id: NodeId) -> HostResult<bool> {
        Ok(self.data_or_err(id)?.retained)
    }

    /// Drop the retention mark and remove the node.
    ///
    /// Retained descendants are kept, as with [`remove_node`](Self::remove_node).
    pub fn release_node(&mut self, id: NodeId) -> HostResult<()> {
        self.nodes.get_mut(id).ok_or(HostError::InvalidNode)?.retained = false;
        self.remove_node(id)
    }

    /// Descendants of `id` in document order (preorder), `id` excluded.
    fn descendants(&self, id: NodeId) -> HostResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.data_or_err(id)?.children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            if let Some(data) = self.nodes.get(node) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    /// First descendant of `scope` in document order matching `selectors`.
    ///
    /// `scope` itself is never returned, but combinators may match against
    /// `scope` and its ancestors.
    pub fn query_selector(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> HostResult<Option<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .find(|&id| self.node_matches(id, selectors)))
    }

    /// Parse `selector` and run [`query_selector`](Self::query_selector).
    pub fn query_selector_str(&self, scope: NodeId, selector: &str) -> HostResult<Option<NodeId>> {
        self.query_selector(scope, &parse_selector_list(selector)?)
    }

    /// All descendants of `scope` matching `selectors`, in document order.
    pub fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &SelectorList,
    ) -> HostResult<Vec<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .filter(|&id| self.node_matches(id, selectors))
            .collect())
    }

    /// Parse `selector` and run [`query_selector_all`](Self::query_selector_all).
    pub fn query_selector_all_str(&self, scope: NodeId, selector: &str) -> HostResult<Vec<NodeId>> {
        self.query_selector_all(scope, &parse_selector_list(selector)?)
    }

    /// Whether the node matches `selectors`. Text nodes never match.
    pub fn matches(&self, id: NodeId, selectors: &SelectorList) -> HostResult<bool> {
        self.data_or_err(id)?;
        Ok(self.node_matches(id, selectors))
    }

    /// A selector-matching view of an element node.
    pub fn element_ref(&self, id: NodeId) -> Option<NodeRef<'_>> {
        NodeRef::new(self, id)
    }

    fn node_matches(&self, id: NodeId, selectors: &SelectorList) -> bool {
        NodeRef::new(self, id).is_some_and(|node| selectors.matches(&node))
    }

    // =========================================================================
    // Native listeners
    // =========================================================================

    /// Attach a native listener to a node.
    ///
    /// The returned handle is the only way to detach the listener again.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        options: ListenerOptions,
        handler: NativeHandler,
    ) -> HostResult<NativeListener> {
        self.data_or_err(node)?;
        let id = self.listeners.insert(ListenerRecord {
            node,
            event_type: event_type.to_string(),
            options,
            handler,
        });
        if let Some(data) = self.nodes.get_mut(node) {
            data.listeners.push(id);
        }
        tracing::trace!(target: targets::TREE, ?node, ?id, event_type, ?options, "attached listener");
        Ok(NativeListener { id, node })
    }

    /// Detach a native listener.
    ///
    /// `event_type` and `capture` must be the ones used to attach it.
    /// Returns `false` if no such listener is attached, for example because
    /// it was a `once` listener that already fired.
    pub fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: &NativeListener,
        capture: bool,
    ) -> bool {
        let identical = self.listeners.get(listener.id).is_some_and(|record| {
            record.node == node
                && listener.node == node
                && record.event_type == event_type
                && record.options.capture == capture
        });
        if !identical {
            tracing::trace!(target: targets::TREE, ?node, id = ?listener.id, event_type, "no listener to detach");
            return false;
        }
        self.drop_listener(listener.id);
        tracing::trace!(target: targets::TREE, ?node, id = ?listener.id, event_type, "detached listener");
        true
    }

    fn drop_listener(&mut self, id: NativeListenerId) -> Option<ListenerRecord> {
        let record = self.listeners.remove(id)?;
        if let Some(data) = self.nodes.get_mut(record.node) {
            data.listeners.retain(|&l| l != id);
        }
        Some(record)
    }

    /// Number of native listeners attached to a node.
    pub fn listener_count(&self, node: NodeId) -> HostResult<usize> {
        Ok(self.data_or_err(node)?.listeners.len())
    }

    /// Number of native listeners attached anywhere in the tree.
    pub fn total_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listener keys of a node in attach order; empty for removed nodes.
    pub(crate) fn listener_ids(&self, node: NodeId) -> Vec<NativeListenerId> {
        self.nodes
            .get(node)
            .map(|data| data.listeners.clone())
            .unwrap_or_default()
    }

    /// Fetch a listener's handler for one invocation.
    ///
    /// Returns `None` if the listener is gone or does not accept the event
    /// in this phase. `once` listeners are removed here, before they run.
    pub(crate) fn claim_listener(
        &mut self,
        id: NativeListenerId,
        event_type: &str,
        accept: impl Fn(&ListenerOptions) -> bool,
    ) -> Option<(NativeHandler, ListenerOptions)> {
        let record = self.listeners.get(id)?;
        if record.event_type != event_type || !accept(&record.options) {
            return None;
        }
        let claimed = (Arc::clone(&record.handler), record.options);
        if claimed.1.once {
            self.drop_listener(id);
        }
        Some(claimed)
    }

    // =========================================================================
    // Debug / Diagnostics
    // =========================================================================

    /// Debug dump of the subtree rooted at `id`.
    pub fn dump_tree(&self, id: NodeId) -> HostResult<String> {
        HostTreeDebug::new().format_subtree(self, id)
    }
}

impl Default for HostTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTree")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A thread-safe, cloneable handle to a [`HostTree`].
///
/// Clones share the same tree. Locks are never held by the tree while a
/// listener runs, so listeners may lock it themselves.
#[derive(Clone, Default)]
pub struct SharedHostTree {
    inner: Arc<RwLock<HostTree>>,
}

static_assertions::assert_impl_all!(SharedHostTree: Send, Sync);

impl SharedHostTree {
    /// Create a handle to a new, empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the tree for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, HostTree> {
        self.inner.read()
    }

    /// Lock the tree for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, HostTree> {
        self.inner.write()
    }

    /// Execute a function with read access to the tree.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HostTree) -> R,
    {
        f(&self.inner.read())
    }

    /// Execute a function with write access to the tree.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HostTree) -> R,
    {
        f(&mut self.inner.write())
    }

    /// Whether two handles share the same tree.
    pub fn ptr_eq(&self, other: &SharedHostTree) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedHostTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedHostTree").field(&*self.inner.read()).finish()
    }
}
