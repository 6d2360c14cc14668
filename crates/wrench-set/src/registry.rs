//! The per-element listener registry.
//!
//! Every delegated listener is attached to the element's host node through
//! its own native trampoline. The registry pairs each user callback with the
//! [`NativeListener`] handle of that trampoline, so detaching always passes
//! the host exactly what was used to attach.
//!
//! Several entries may share an event name. Each is addressed by its
//! [`ListenerHandle`]; removal by name removes all of them.

use std::fmt;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};
use wrench_set_core::logging::targets;
use wrench_set_core::{HostResult, HostTree, ListenerOptions, NativeHandler, NativeListener, NodeId, Propagation};

use crate::dispatch::DelegatedEvent;
use crate::element::Element;

new_key_type! {
    /// Identifies one registered listener.
    ///
    /// Returned by [`Element::on`] and accepted by [`Element::un_handle`].
    pub struct ListenerHandle;
}

/// A delegated listener callback.
///
/// Receives the owning element and the wrapped event. The returned
/// [`Propagation`] is handed back to the host tree unchanged.
pub type DelegatedCallback =
    Arc<dyn Fn(&Element, &mut DelegatedEvent<'_>) -> Propagation + Send + Sync>;

/// One registered listener.
pub struct ListenerEntry {
    event_name: String,
    callback: DelegatedCallback,
    options: ListenerOptions,
    native: NativeListener,
}

impl ListenerEntry {
    /// The event type the listener was registered for.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Options passed to the host when attaching.
    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Handle of the native trampoline attached to the host node.
    pub fn native(&self) -> &NativeListener {
        &self.native
    }

    pub(crate) fn callback(&self) -> &DelegatedCallback {
        &self.callback
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("event_name", &self.event_name)
            .field("options", &self.options)
            .field("native", &self.native)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of an element's delegated listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: SlotMap<ListenerHandle, ListenerEntry>,
    /// Registration order.
    order: Vec<ListenerHandle>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a trampoline for `event_name` to `node` and record the entry.
    ///
    /// `trampoline` builds the native handler for the new entry's handle.
    /// Nothing is recorded if the host refuses the listener.
    pub(crate) fn register(
        &mut self,
        tree: &mut HostTree,
        node: NodeId,
        event_name: &str,
        callback: DelegatedCallback,
        options: ListenerOptions,
        trampoline: impl FnOnce(ListenerHandle) -> NativeHandler,
    ) -> HostResult<ListenerHandle> {
        let handle = self.entries.try_insert_with_key(|handle| {
            let native = tree.add_event_listener(node, event_name, options, trampoline(handle))?;
            Ok::<_, wrench_set_core::HostError>(ListenerEntry {
                event_name: event_name.to_string(),
                callback,
                options,
                native,
            })
        })?;
        self.order.push(handle);
        tracing::trace!(target: targets::REGISTRY, ?handle, event_name, ?options, "registered listener");
        Ok(handle)
    }

    /// First entry for `event_name` in registration order, with its position.
    pub fn lookup(&self, event_name: &str) -> Option<(usize, &ListenerEntry)> {
        self.iter()
            .enumerate()
            .find(|(_, (_, entry))| entry.event_name == event_name)
            .map(|(index, (_, entry))| (index, entry))
    }

    /// The entry for `handle`, if it is still registered.
    pub fn lookup_handle(&self, handle: ListenerHandle) -> Option<&ListenerEntry> {
        self.entries.get(handle)
    }

    /// Detach and remove every entry for `event_name`.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn unregister(&mut self, tree: &mut HostTree, event_name: &str) -> usize {
        let doomed: Vec<ListenerHandle> = self
            .iter()
            .filter(|(_, entry)| entry.event_name == event_name)
            .map(|(handle, _)| handle)
            .collect();
        for &handle in &doomed {
            self.unregister_handle(tree, handle);
        }
        doomed.len()
    }

    /// Detach and remove one entry. Returns `false` if it was not registered.
    pub(crate) fn unregister_handle(&mut self, tree: &mut HostTree, handle: ListenerHandle) -> bool {
        let Some(entry) = self.take(handle) else {
            return false;
        };
        // A `once` listener that already fired is gone from the host.
        let detached = tree.remove_event_listener(
            entry.native.node(),
            &entry.event_name,
            &entry.native,
            entry.options.capture,
        );
        tracing::trace!(target: targets::REGISTRY, ?handle, event_name = %entry.event_name, detached, "unregistered listener");
        true
    }

    /// Detach and remove every entry, in registration order.
    pub(crate) fn unregister_all(&mut self, tree: &mut HostTree) -> usize {
        let handles = std::mem::take(&mut self.order);
        let count = handles.len();
        for handle in handles {
            if let Some(entry) = self.entries.remove(handle) {
                tree.remove_event_listener(
                    entry.native.node(),
                    &entry.event_name,
                    &entry.native,
                    entry.options.capture,
                );
            }
        }
        tracing::trace!(target: targets::REGISTRY, count, "unregistered all listeners");
        count
    }

    /// Remove an entry whose native side the host already dropped.
    pub(crate) fn discard(&mut self, handle: ListenerHandle) -> bool {
        self.take(handle).is_some()
    }

    fn take(&mut self, handle: ListenerHandle) -> Option<ListenerEntry> {
        let entry = self.entries.remove(handle)?;
        self.order.retain(|&h| h != handle);
        Some(entry)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ListenerHandle, &ListenerEntry)> + '_ {
        self.order
            .iter()
            .filter_map(|&handle| self.entries.get(handle).map(|entry| (handle, entry)))
    }

    /// Event names in registration order, duplicates included.
    pub fn event_names(&self) -> Vec<&str> {
        self.iter().map(|(_, entry)| entry.event_name.as_str()).collect()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, entry)| entry)).finish()
    }
}
