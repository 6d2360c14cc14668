//! Error types for the host tree.

/// Errors that can occur during host tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node ID is invalid or the node has been removed.
    #[error("Invalid or removed node ID")]
    InvalidNode,

    /// Attempted to append a node to itself or one of its descendants.
    #[error("Cannot append a node to itself or one of its descendants")]
    CircularParentage,

    /// The node is not a child of the given parent.
    #[error("Node is not a child of the given parent")]
    NotAChild,

    /// The operation requires an element node but got a text node.
    #[error("Operation requires an element node")]
    NotAnElement,

    /// Markup passed to `set_inner_html` could not be parsed.
    #[error("Invalid markup at byte {position}: {message}")]
    Markup { message: String, position: u64 },

    /// A selector passed to a query could not be parsed.
    #[error(transparent)]
    Selector(#[from] wrench_set_selector::Error),

    /// A listener failed while an event was being dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl HostError {
    /// Create a markup error.
    pub fn markup(message: impl Into<String>, position: u64) -> Self {
        Self::Markup {
            message: message.into(),
            position,
        }
    }
}

/// Errors raised by native listeners during dispatch.
///
/// These abort the dispatch and are returned to the caller of
/// [`SharedHostTree::dispatch_event`](crate::SharedHostTree::dispatch_event).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The dispatch target is not a node of the tree.
    #[error("Dispatch target is invalid or has been removed")]
    InvalidTarget,

    /// A native listener fired but its owner has no record of it.
    ///
    /// This means the owner's listener bookkeeping and the host tree's
    /// listener table have diverged. It is a programming defect.
    #[error("Listener for '{event_type}' fired without a registry entry: {detail}")]
    ListenerDesync {
        event_type: String,
        detail: &'static str,
    },
}

/// Result type for host tree operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
