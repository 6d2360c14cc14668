//! wrench-set: widgets that own one host node, with delegated events.
//!
//! An [`Element`] creates a node in a [`SharedHostTree`], fills it from an
//! [`ElementConfig`], and manages listeners on it:
//!
//! - **Listener registry**: every `on` call attaches one native listener and
//!   records it, so `un` and `destroy` detach exactly what was attached
//! - **Delegated events**: callbacks get a [`DelegatedEvent`] whose
//!   [`get_target`](DelegatedEvent::get_target) finds the event target or its
//!   nearest ancestor matching a selector
//! - **Lifecycle**: `destroy` (or dropping the last handle) detaches every
//!   listener and removes the node
//!
//! This crate re-exports the host tree API from `wrench-set-core`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use wrench_set::{Element, ElementConfig, HostEvent, Propagation, SharedHostTree};
//!
//! let tree = SharedHostTree::new();
//! let body = tree.write().create_element("body");
//!
//! let menu = Element::new(
//!     &tree,
//!     ElementConfig::new()
//!         .with_element_type("ul")
//!         .with_inner_html("<li class=\"item\"><b>open</b></li>")
//!         .with_render_to(body),
//! )
//! .unwrap();
//!
//! let clicked = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&clicked);
//! menu.on("click", move |_, event| {
//!     if event.get_target(".item").unwrap().is_some() {
//!         flag.store(true, Ordering::SeqCst);
//!     }
//!     Propagation::Continue
//! })
//! .unwrap();
//!
//! let node = menu.element().unwrap();
//! let bold = tree.read().query_selector_str(node, "b").unwrap().unwrap();
//! tree.dispatch_event(bold, HostEvent::new("click")).unwrap();
//! assert!(clicked.load(Ordering::SeqCst));
//! ```

mod config;
mod dispatch;
mod element;
mod error;
mod registry;

pub use config::ElementConfig;
pub use dispatch::DelegatedEvent;
pub use element::{Element, Lifecycle};
pub use error::{ElementError, Result};
pub use registry::{DelegatedCallback, ListenerEntry, ListenerHandle, ListenerRegistry};

pub use wrench_set_core::*;
