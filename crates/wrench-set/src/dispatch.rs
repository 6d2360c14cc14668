//! Delegated dispatch.
//!
//! Each registered listener is attached to the host as a trampoline. When
//! the host fires it, the trampoline finds its registry entry, wraps the
//! native event in a [`DelegatedEvent`], and calls the user callback with the
//! owning [`Element`]. The callback's [`Propagation`] goes back to the host
//! unchanged.

use std::sync::{Arc, Weak};

use wrench_set_core::logging::targets;
use wrench_set_core::{
    DispatchError, EventPhase, HostEvent, NativeHandler, NodeId, Propagation, SharedHostTree,
};
use wrench_set_selector::{SelectorList, parse_selector_list};

use crate::element::{Element, ElementInner};
use crate::registry::ListenerHandle;

/// A native event seen through a delegated listener.
///
/// Adds ancestor-aware targeting ([`get_target`](Self::get_target)) on top
/// of the host event. It only lives for the duration of the callback; the
/// host event itself is never altered to carry it.
pub struct DelegatedEvent<'a> {
    event: &'a mut HostEvent,
    tree: &'a SharedHostTree,
    element_node: NodeId,
}

impl<'a> DelegatedEvent<'a> {
    /// How far [`get_target`](Self::get_target) climbs by default.
    pub const DEFAULT_MAXIMUM_DEPTH: usize = 200;

    pub(crate) fn new(event: &'a mut HostEvent, tree: &'a SharedHostTree, element_node: NodeId) -> Self {
        Self {
            event,
            tree,
            element_node,
        }
    }

    /// Find the event target or its nearest ancestor matching `selector`.
    ///
    /// Like `query_selector`, but searching upward from the target. Climbs at
    /// most [`DEFAULT_MAXIMUM_DEPTH`](Self::DEFAULT_MAXIMUM_DEPTH) levels.
    ///
    /// The read lock on the tree is taken for the duration of the search, so
    /// this must not be called while holding the tree's write lock.
    pub fn get_target(&self, selector: &str) -> wrench_set_selector::Result<Option<NodeId>> {
        self.get_target_within(selector, Self::DEFAULT_MAXIMUM_DEPTH)
    }

    /// [`get_target`](Self::get_target) with an explicit depth bound.
    ///
    /// A candidate is accepted when it is the first match of `selector`
    /// under its own parent, in document order. The search starts at the
    /// target and moves one level up per step; each step that does not
    /// match counts toward `maximum_depth`. A `maximum_depth` of zero never
    /// matches, and a node without a parent is never returned.
    pub fn get_target_within(
        &self,
        selector: &str,
        maximum_depth: usize,
    ) -> wrench_set_selector::Result<Option<NodeId>> {
        let selectors = parse_selector_list(selector)?;
        Ok(self.find_target(&selectors, maximum_depth))
    }

    fn find_target(&self, selectors: &SelectorList, maximum_depth: usize) -> Option<NodeId> {
        let tree = self.tree.read();
        let mut candidate = self.event.target()?;
        let mut depth = 0;

        loop {
            if depth >= maximum_depth {
                return None;
            }
            // Removed nodes end the search like a missing parent.
            let parent = tree.parent(candidate).ok().flatten()?;
            if tree.query_selector(parent, selectors).ok().flatten() == Some(candidate) {
                return Some(candidate);
            }
            candidate = parent;
            depth += 1;
        }
    }

    /// The underlying host event.
    pub fn event(&self) -> &HostEvent {
        self.event
    }

    /// Mutable access to the underlying host event.
    pub fn event_mut(&mut self) -> &mut HostEvent {
        self.event
    }

    /// The tree the event is being dispatched on.
    pub fn tree(&self) -> &SharedHostTree {
        self.tree
    }

    /// The event type (e.g., "click").
    pub fn event_type(&self) -> &str {
        self.event.event_type()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.event.target()
    }

    /// The node whose listener is running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.event.current_target()
    }

    /// The current dispatch phase.
    pub fn phase(&self) -> EventPhase {
        self.event.phase()
    }

    /// The node owned by the element the listener was registered on.
    pub fn element_node(&self) -> NodeId {
        self.element_node
    }

    /// Cancel the default action.
    pub fn prevent_default(&mut self) {
        self.event.prevent_default();
    }

    /// Whether the default action was canceled.
    pub fn is_default_prevented(&self) -> bool {
        self.event.is_default_prevented()
    }

    /// Stop propagation after the current node's listeners.
    pub fn stop_propagation(&mut self) {
        self.event.stop_propagation();
    }

    /// Stop propagation and skip the remaining listeners on this node.
    pub fn stop_immediate_propagation(&mut self) {
        self.event.stop_immediate_propagation();
    }
}

/// Build the native handler for one registry entry.
pub(crate) fn trampoline(owner: Weak<ElementInner>, handle: ListenerHandle) -> NativeHandler {
    Arc::new(move |event: &mut HostEvent, tree: &SharedHostTree| {
        let Some(inner) = owner.upgrade() else {
            return Err(desync(event, "owning element was dropped"));
        };

        let (callback, node) = {
            let mut state = inner.state.lock();
            let Some(node) = state.node else {
                return Err(desync(event, "owning element has no node"));
            };
            let Some(entry) = state.registry.lookup_handle(handle) else {
                return Err(desync(event, "no registry entry for the fired listener"));
            };
            let callback = Arc::clone(entry.callback());
            let once = entry.options().once;
            // The host already dropped the native side.
            if once {
                state.registry.discard(handle);
            }
            (callback, node)
        };

        let element = Element::from_inner(inner);
        let mut delegated = DelegatedEvent::new(event, tree, node);
        Ok(callback(&element, &mut delegated))
    })
}

fn desync(event: &HostEvent, detail: &'static str) -> DispatchError {
    tracing::error!(
        target: targets::REGISTRY,
        event_type = event.event_type(),
        detail,
        "listener fired without a registry entry"
    );
    DispatchError::ListenerDesync {
        event_type: event.event_type().to_string(),
        detail,
    }
}
