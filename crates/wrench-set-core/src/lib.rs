//! Host tree for wrench-set.
//!
//! This crate provides the in-process document tree that wrench-set widgets
//! render into:
//!
//! - **Node arena**: Element and text nodes keyed by [`NodeId`], with
//!   attributes, class lists, and parent/child links
//! - **Markup**: `set_inner_html` / `inner_html` backed by `quick-xml`
//! - **Selectors**: `query_selector`, `query_selector_all`, and `matches`
//! - **Native listeners**: Per-node listeners with capture, once, and
//!   passive options, detached through an owned [`NativeListener`] handle
//! - **Dispatch**: Capture, target, and bubble phases
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wrench_set_core::{HostEvent, ListenerOptions, Propagation, SharedHostTree};
//!
//! let tree = SharedHostTree::new();
//! let (list, item) = tree.with_write(|tree| {
//!     let list = tree.create_element("ul");
//!     tree.set_inner_html(list, "<li class=\"item\">one</li>").unwrap();
//!     let item = tree.query_selector_str(list, ".item").unwrap().unwrap();
//!     (list, item)
//! });
//!
//! let listener = tree
//!     .write()
//!     .add_event_listener(
//!         list,
//!         "click",
//!         ListenerOptions::default(),
//!         Arc::new(|event: &mut HostEvent, _: &SharedHostTree| {
//!             event.prevent_default();
//!             Ok(Propagation::Continue)
//!         }),
//!     )
//!     .unwrap();
//!
//! let outcome = tree.dispatch_event(item, HostEvent::new("click")).unwrap();
//! assert!(outcome.default_prevented);
//!
//! assert!(tree.write().remove_event_listener(list, "click", &listener, false));
//! ```

mod dispatch;
mod error;
mod event;
pub mod logging;
mod markup;
mod node;
mod tree;

pub use error::{DispatchError, HostError, HostResult};
pub use event::{
    DispatchOutcome, EventPhase, HostEvent, ListenerOptions, NativeHandler, NativeListener,
    NativeListenerId, Propagation,
};
pub use node::{ElementData, NodeId, NodeKind, NodeRef};
pub use tree::{HostTree, SharedHostTree};

// Selector types are part of this crate's query API.
pub use wrench_set_selector::{self as selector, SelectorList};
