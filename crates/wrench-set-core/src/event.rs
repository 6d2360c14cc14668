//! Native event types for the host tree.
//!
//! A [`HostEvent`] travels from the root down to its target (capture phase),
//! is delivered at the target, then travels back up (bubble phase) when it
//! bubbles. Listeners are attached per node with [`ListenerOptions`] and are
//! identified by the [`NativeListener`] handle returned at attach time.

use std::sync::Arc;

use slotmap::new_key_type;

use crate::error::DispatchError;
use crate::node::NodeId;
use crate::tree::SharedHostTree;

new_key_type! {
    /// Key of a native listener in the host tree's listener table.
    pub struct NativeListenerId;
}

/// A native listener function.
///
/// Receives the event being dispatched and the tree it is dispatched on.
/// The returned [`Propagation`] is honored after the listener returns.
pub type NativeHandler = Arc<
    dyn Fn(&mut HostEvent, &SharedHostTree) -> Result<Propagation, DispatchError> + Send + Sync,
>;

/// What a listener asks the dispatcher to do after it returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Keep propagating.
    #[default]
    Continue,
    /// Stop propagating after the current node's listeners.
    Stop,
}

/// The phase an event is in while a listener runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventPhase {
    /// Not being dispatched.
    #[default]
    None,
    /// Travelling from the root toward the target.
    Capturing,
    /// Being delivered at the target.
    AtTarget,
    /// Travelling from the target back toward the root.
    Bubbling,
}

/// Options passed when a listener is attached.
///
/// `capture` is part of a listener's identity: detaching must pass the same
/// flag that was used to attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Invoke during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener before its first invocation.
    pub once: bool,
    /// The listener promises not to call `prevent_default`.
    pub passive: bool,
}

impl ListenerOptions {
    /// Options for a capture-phase listener.
    pub fn capture() -> Self {
        Self {
            capture: true,
            ..Default::default()
        }
    }

    /// Set the `once` flag.
    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Set the `passive` flag.
    pub fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }
}

/// Owned handle to a listener attached to a host node.
///
/// Returned by [`HostTree::add_event_listener`](crate::HostTree::add_event_listener)
/// and required by [`HostTree::remove_event_listener`](crate::HostTree::remove_event_listener).
/// It is deliberately not `Clone`: whoever attached the listener owns the
/// only way to detach it.
#[derive(Debug, PartialEq, Eq)]
pub struct NativeListener {
    pub(crate) id: NativeListenerId,
    pub(crate) node: NodeId,
}

impl NativeListener {
    /// The listener's key in the host tree.
    pub fn id(&self) -> NativeListenerId {
        self.id
    }

    /// The node the listener is attached to.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// An event dispatched through the host tree.
#[derive(Debug, Clone)]
pub struct HostEvent {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    pub(crate) target: Option<NodeId>,
    pub(crate) current_target: Option<NodeId>,
    pub(crate) phase: EventPhase,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
    pub(crate) in_passive_listener: bool,
    default_prevented: bool,
}

impl HostEvent {
    /// Create a bubbling, cancelable event (like a click).
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: true,
            cancelable: true,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            in_passive_listener: false,
            default_prevented: false,
        }
    }

    /// Set whether the event bubbles.
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether the event can be canceled.
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// The event category (e.g., "click").
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the event takes part in the bubble phase.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether `prevent_default` has any effect.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    /// The current dispatch phase.
    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Stop propagation after the current node's listeners.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip the remaining listeners on the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Whether propagation was stopped.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Cancel the default action.
    ///
    /// Ignored for non-cancelable events and inside passive listeners.
    pub fn prevent_default(&mut self) {
        if self.cancelable && !self.in_passive_listener {
            self.default_prevented = true;
        }
    }

    /// Whether the default action was canceled.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Summary of a completed dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Some listener canceled the default action.
    pub default_prevented: bool,
    /// Propagation was stopped before reaching every node on the path.
    pub propagation_stopped: bool,
    /// Number of listeners invoked.
    pub listeners_invoked: usize,
}
