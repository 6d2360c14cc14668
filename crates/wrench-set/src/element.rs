//! The widget base: one host node plus its delegated listeners.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use wrench_set_core::logging::targets;
use wrench_set_core::{HostResult, ListenerOptions, NodeId, Propagation, SharedHostTree};

use crate::config::ElementConfig;
use crate::dispatch::{DelegatedEvent, trampoline};
use crate::error::{ElementError, Result};
use crate::registry::{ListenerHandle, ListenerRegistry};

/// Where an element is in its life.
///
/// Transitions only move forward: `Uninitialized` to `Initialized` to
/// `Destroyed`, or straight from `Uninitialized` to `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built with `x_auto_init_element`; no node yet.
    Uninitialized,
    /// Owns a node and accepts listeners.
    Initialized,
    /// Node and listeners released.
    Destroyed,
}

pub(crate) struct ElementState {
    lifecycle: Lifecycle,
    pub(crate) node: Option<NodeId>,
    pub(crate) registry: ListenerRegistry,
}

impl ElementState {
    fn require_node(&self) -> Result<NodeId> {
        match (self.lifecycle, self.node) {
            (Lifecycle::Initialized, Some(node)) => Ok(node),
            (Lifecycle::Destroyed, _) => Err(ElementError::Destroyed),
            _ => Err(ElementError::NotInitialized),
        }
    }

    fn destroy(&mut self, tree: &SharedHostTree) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Destroyed => return Ok(()),
            Lifecycle::Uninitialized => {
                self.lifecycle = Lifecycle::Destroyed;
                return Ok(());
            }
            Lifecycle::Initialized => {}
        }
        self.lifecycle = Lifecycle::Destroyed;
        let node = self.node.take();

        let registry = &mut self.registry;
        let listeners = tree.with_write(|tree| -> HostResult<usize> {
            let listeners = registry.unregister_all(tree);
            // Widgets rendered inside this one keep their own nodes.
            if let Some(node) = node.filter(|&node| tree.contains(node)) {
                tree.release_node(node)?;
            }
            Ok(listeners)
        })?;
        tracing::debug!(target: targets::ELEMENT, ?node, listeners, "element destroyed");
        Ok(())
    }
}

pub(crate) struct ElementInner {
    tree: SharedHostTree,
    config: ElementConfig,
    pub(crate) state: Mutex<ElementState>,
}

impl Drop for ElementInner {
    fn drop(&mut self) {
        // Never leave native listeners behind.
        if let Err(error) = self.state.get_mut().destroy(&self.tree) {
            tracing::warn!(target: targets::ELEMENT, %error, "destroy on drop failed");
        }
    }
}

/// A widget that owns exactly one host node.
///
/// `Element` is a cheap handle: clones refer to the same widget. The widget
/// is destroyed explicitly with [`destroy`](Self::destroy), or implicitly
/// when the last handle is dropped.
///
/// Listener callbacks run without any lock held, so they may call `on`,
/// `un`, or `destroy` on their own element. Dropping the last handle, or
/// calling `destroy`, while holding the tree's lock on the same thread
/// deadlocks.
///
/// # Example
///
/// ```
/// use wrench_set::{Element, ElementConfig, Propagation, SharedHostTree};
///
/// let tree = SharedHostTree::new();
/// let body = tree.write().create_element("body");
///
/// let element = Element::new(
///     &tree,
///     ElementConfig::new()
///         .with_element_type("span")
///         .with_class_name("my-CSS-Class")
///         .with_inner_html("Hi it's me :) <b class='my-button'><i>XOX</i></b>")
///         .with_render_to(body),
/// )
/// .unwrap();
///
/// element
///     .on("click", |_, event| {
///         if let Ok(Some(_button)) = event.get_target(".my-button") {
///             // do something
///         }
///         Propagation::Continue
///     })
///     .unwrap();
///
/// element.destroy().unwrap();
/// assert!(tree.read().children(body).unwrap().is_empty());
/// assert_eq!(tree.read().total_listener_count(), 0);
/// ```
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

static_assertions::assert_impl_all!(Element: Send, Sync);

impl Element {
    /// Create an element on `tree`.
    ///
    /// Unless `config.x_auto_init_element` is set, the element is
    /// initialized immediately (see [`initialize_element`](Self::initialize_element)).
    pub fn new(tree: &SharedHostTree, config: ElementConfig) -> Result<Self> {
        let deferred = config.x_auto_init_element;
        let element = Self {
            inner: Arc::new(ElementInner {
                tree: tree.clone(),
                config,
                state: Mutex::new(ElementState {
                    lifecycle: Lifecycle::Uninitialized,
                    node: None,
                    registry: ListenerRegistry::new(),
                }),
            }),
        };
        if !deferred {
            element.initialize_element()?;
        }
        Ok(element)
    }

    pub(crate) fn from_inner(inner: Arc<ElementInner>) -> Self {
        Self { inner }
    }

    /// Create the node, apply the configured class and markup, and render it
    /// into `config.render_to` if set.
    ///
    /// If any step fails the node is discarded and the element stays
    /// uninitialized.
    pub fn initialize_element(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        match state.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Initialized => return Err(ElementError::AlreadyInitialized),
            Lifecycle::Destroyed => return Err(ElementError::Destroyed),
        }

        let config = &self.inner.config;
        let tag = if config.element_type.is_empty() {
            "div"
        } else {
            config.element_type.as_str()
        };
        let node = self.inner.tree.with_write(|tree| -> HostResult<NodeId> {
            let node = tree.create_element(tag);
            let populated = tree
                .set_class_name(node, &config.class_name)
                .and_then(|()| tree.set_inner_html(node, &config.inner_html))
                .and_then(|()| match config.render_to {
                    Some(parent) => tree.append_child(parent, node),
                    None => Ok(()),
                })
                .and_then(|()| tree.retain_node(node));
            if let Err(error) = populated {
                // Freshly created, so removal cannot fail.
                let _ = tree.remove_node(node);
                return Err(error);
            }
            Ok(node)
        })?;

        state.node = Some(node);
        state.lifecycle = Lifecycle::Initialized;
        tracing::debug!(target: targets::ELEMENT, ?node, tag, render_to = ?config.render_to, "element initialized");
        Ok(())
    }

    /// The owned host node; `None` before initialization and after destroy.
    pub fn element(&self) -> Option<NodeId> {
        self.inner.state.lock().node
    }

    /// Append the element's node to `parent`.
    ///
    /// `None` is a no-op.
    pub fn render_to(&self, parent: Option<NodeId>) -> Result<()> {
        let Some(parent) = parent else {
            return Ok(());
        };
        let state = self.inner.state.lock();
        let node = state.require_node()?;
        self.inner.tree.write().append_child(parent, node)?;
        Ok(())
    }

    /// Listen for `event_name` on the element's node.
    ///
    /// The callback also sees events that bubble up from descendants; use
    /// [`DelegatedEvent::get_target`] to find out which one. Returns a
    /// handle for [`un_handle`](Self::un_handle).
    pub fn on<F>(&self, event_name: &str, callback: F) -> Result<ListenerHandle>
    where
        F: Fn(&Element, &mut DelegatedEvent<'_>) -> Propagation + Send + Sync + 'static,
    {
        self.on_with_options(event_name, ListenerOptions::default(), callback)
    }

    /// [`on`](Self::on) with explicit capture, once, and passive options.
    pub fn on_with_options<F>(
        &self,
        event_name: &str,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle>
    where
        F: Fn(&Element, &mut DelegatedEvent<'_>) -> Propagation + Send + Sync + 'static,
    {
        let mut state = self.inner.state.lock();
        let node = state.require_node()?;
        let owner = Arc::downgrade(&self.inner);
        let registry = &mut state.registry;
        let handle = self.inner.tree.with_write(|tree| {
            registry.register(tree, node, event_name, Arc::new(callback), options, |handle| {
                trampoline(owner, handle)
            })
        })?;
        Ok(handle)
    }

    /// Stop listening for `event_name`.
    ///
    /// Removes every listener registered for the name and returns how many
    /// there were. Unknown names are a no-op.
    pub fn un(&self, event_name: &str) -> Result<usize> {
        let mut state = self.inner.state.lock();
        state.require_node()?;
        let registry = &mut state.registry;
        Ok(self
            .inner
            .tree
            .with_write(|tree| registry.unregister(tree, event_name)))
    }

    /// Remove the single listener identified by `handle`.
    ///
    /// Returns `false` if it was already removed.
    pub fn un_handle(&self, handle: ListenerHandle) -> Result<bool> {
        let mut state = self.inner.state.lock();
        state.require_node()?;
        let registry = &mut state.registry;
        Ok(self
            .inner
            .tree
            .with_write(|tree| registry.unregister_handle(tree, handle)))
    }

    /// Detach every listener, release the node, and mark the element
    /// destroyed.
    ///
    /// The node leaves its parent and is freed with its content, except for
    /// nodes owned by other elements rendered inside it: those are detached
    /// and keep working. Calling it again has no effect.
    #[tracing::instrument(skip(self), target = "wrench_set::element", level = "debug")]
    pub fn destroy(&self) -> Result<()> {
        self.inner.state.lock().destroy(&self.inner.tree)
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle() == Lifecycle::Destroyed
    }

    /// The current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.lock().lifecycle
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    /// Registered event names in registration order.
    pub fn event_names(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        state
            .registry
            .event_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// The configuration the element was built with.
    pub fn config(&self) -> &ElementConfig {
        &self.inner.config
    }

    /// The tree the element lives in.
    pub fn tree(&self) -> &SharedHostTree {
        &self.inner.tree
    }

    /// Whether two handles refer to the same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Element")
            .field("lifecycle", &state.lifecycle)
            .field("node", &state.node)
            .field("listeners", &state.registry)
            .finish()
    }
}
