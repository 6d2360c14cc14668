//! Native event dispatch through the host tree.

use crate::error::{DispatchError, HostResult};
use crate::event::{DispatchOutcome, EventPhase, HostEvent, ListenerOptions, Propagation};
use crate::logging::targets;
use crate::node::NodeId;
use crate::tree::SharedHostTree;

impl SharedHostTree {
    /// Dispatch `event` at `target`.
    ///
    /// The event visits the target's ancestors root first (capture phase,
    /// capture listeners only), then the target (all listeners), then the
    /// ancestors again nearest first (bubble phase, non-capture listeners)
    /// if the event bubbles.
    ///
    /// The tree is not locked while a listener runs. Listeners detached by
    /// an earlier listener in the same dispatch are skipped; listeners
    /// attached during dispatch are not run until the next one. The first
    /// listener error aborts the dispatch and is returned.
    #[tracing::instrument(
        skip(self, event),
        target = "wrench_set_core::dispatch",
        level = "trace",
        fields(event_type = %event.event_type())
    )]
    pub fn dispatch_event(&self, target: NodeId, mut event: HostEvent) -> HostResult<DispatchOutcome> {
        let path = self.with_read(|tree| -> HostResult<Vec<NodeId>> {
            if !tree.contains(target) {
                return Err(DispatchError::InvalidTarget.into());
            }
            let mut path = vec![target];
            path.extend(tree.ancestors(target)?);
            Ok(path)
        })?;

        event.target = Some(target);
        let mut invoked = 0;

        for &node in path[1..].iter().rev() {
            if event.propagation_stopped {
                break;
            }
            event.phase = EventPhase::Capturing;
            invoked += self.invoke_listeners(node, &mut event, |options| options.capture)?;
        }

        if !event.propagation_stopped {
            event.phase = EventPhase::AtTarget;
            invoked += self.invoke_listeners(target, &mut event, |_| true)?;
        }

        if event.bubbles() {
            for &node in &path[1..] {
                if event.propagation_stopped {
                    break;
                }
                event.phase = EventPhase::Bubbling;
                invoked += self.invoke_listeners(node, &mut event, |options| !options.capture)?;
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;

        let outcome = DispatchOutcome {
            default_prevented: event.is_default_prevented(),
            propagation_stopped: event.propagation_stopped,
            listeners_invoked: invoked,
        };
        tracing::trace!(target: targets::DISPATCH, ?target, ?outcome, "dispatch complete");
        Ok(outcome)
    }

    /// Run the listeners of one node that `accept` admits for this phase.
    fn invoke_listeners(
        &self,
        node: NodeId,
        event: &mut HostEvent,
        accept: impl Fn(&ListenerOptions) -> bool,
    ) -> HostResult<usize> {
        let ids = self.read().listener_ids(node);
        if ids.is_empty() {
            return Ok(0);
        }

        event.current_target = Some(node);
        let mut invoked = 0;
        for id in ids {
            if event.immediate_propagation_stopped {
                break;
            }
            let claimed = {
                let mut tree = self.write();
                tree.claim_listener(id, event.event_type(), &accept)
            };
            let Some((handler, options)) = claimed else {
                continue;
            };

            tracing::trace!(target: targets::DISPATCH, ?node, ?id, phase = ?event.phase, "invoking listener");
            event.in_passive_listener = options.passive;
            let result = handler(event, self);
            event.in_passive_listener = false;
            invoked += 1;

            if result? == Propagation::Stop {
                event.stop_propagation();
            }
        }
        Ok(invoked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::error::HostError;
    use crate::event::NativeHandler;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, label: &'static str, result: Propagation) -> NativeHandler {
        let log = Arc::clone(log);
        Arc::new(move |event: &mut HostEvent, _: &SharedHostTree| {
            log.lock().push(format!("{label}:{:?}", event.phase()));
            Ok(result)
        })
    }

    /// root > middle > leaf
    fn chain(tree: &SharedHostTree) -> (NodeId, NodeId, NodeId) {
        let mut tree = tree.write();
        let root = tree.create_element("div");
        let middle = tree.create_element("ul");
        let leaf = tree.create_element("li");
        tree.append_child(root, middle).unwrap();
        tree.append_child(middle, leaf).unwrap();
        (root, middle, leaf)
    }

    #[test]
    fn test_capture_target_bubble_order() {
        let shared = SharedHostTree::new();
        let (root, middle, leaf) = chain(&shared);
        let log: Log = Arc::default();
        {
            let mut tree = shared.write();
            let bubble = ListenerOptions::default();
            let capture = ListenerOptions::capture();
            tree.add_event_listener(root, "click", bubble, recorder(&log, "root-bubble", Propagation::Continue)).unwrap();
            tree.add_event_listener(root, "click", capture, recorder(&log, "root-capture", Propagation::Continue)).unwrap();
            tree.add_event_listener(middle, "click", bubble, recorder(&log, "middle-bubble", Propagation::Continue)).unwrap();
            tree.add_event_listener(leaf, "click", bubble, recorder(&log, "leaf", Propagation::Continue)).unwrap();
            tree.add_event_listener(leaf, "keyup", bubble, recorder(&log, "leaf-keyup", Propagation::Continue)).unwrap();
        }

        let outcome = shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        assert_eq!(outcome.listeners_invoked, 4);
        assert_eq!(
            *log.lock(),
            vec![
                "root-capture:Capturing",
                "leaf:AtTarget",
                "middle-bubble:Bubbling",
                "root-bubble:Bubbling",
            ]
        );
    }

    #[test]
    fn test_non_bubbling_event_skips_bubble_phase() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        shared
            .write()
            .add_event_listener(root, "focus", ListenerOptions::default(), recorder(&log, "root", Propagation::Continue))
            .unwrap();

        let outcome = shared
            .dispatch_event(leaf, HostEvent::new("focus").with_bubbles(false))
            .unwrap();
        assert_eq!(outcome.listeners_invoked, 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_stop_propagation_finishes_current_node() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        {
            let mut tree = shared.write();
            let options = ListenerOptions::default();
            tree.add_event_listener(leaf, "click", options, recorder(&log, "first", Propagation::Stop)).unwrap();
            tree.add_event_listener(leaf, "click", options, recorder(&log, "second", Propagation::Continue)).unwrap();
            tree.add_event_listener(root, "click", options, recorder(&log, "root", Propagation::Continue)).unwrap();
        }

        let outcome = shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        assert!(outcome.propagation_stopped);
        assert_eq!(*log.lock(), vec!["first:AtTarget", "second:AtTarget"]);
    }

    #[test]
    fn test_stop_immediate_propagation_skips_siblings() {
        let shared = SharedHostTree::new();
        let (_, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        {
            let mut tree = shared.write();
            let options = ListenerOptions::default();
            tree.add_event_listener(
                leaf,
                "click",
                options,
                Arc::new(|event: &mut HostEvent, _: &SharedHostTree| {
                    event.stop_immediate_propagation();
                    Ok(Propagation::Continue)
                }),
            )
            .unwrap();
            tree.add_event_listener(leaf, "click", options, recorder(&log, "second", Propagation::Continue)).unwrap();
        }

        let outcome = shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        assert_eq!(outcome.listeners_invoked, 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_once_listener_runs_once() {
        let shared = SharedHostTree::new();
        let (_, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        shared
            .write()
            .add_event_listener(
                leaf,
                "click",
                ListenerOptions::default().with_once(true),
                recorder(&log, "once", Propagation::Continue),
            )
            .unwrap();

        shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        assert_eq!(log.lock().len(), 1);
        assert_eq!(shared.read().listener_count(leaf).unwrap(), 0);
    }

    #[test]
    fn test_passive_listener_cannot_prevent_default() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        let prevent: NativeHandler = Arc::new(|event: &mut HostEvent, _: &SharedHostTree| {
            event.prevent_default();
            Ok(Propagation::Continue)
        });
        {
            let mut tree = shared.write();
            tree.add_event_listener(leaf, "wheel", ListenerOptions::default().with_passive(true), Arc::clone(&prevent))
                .unwrap();
        }
        let outcome = shared.dispatch_event(leaf, HostEvent::new("wheel")).unwrap();
        assert!(!outcome.default_prevented);

        shared
            .write()
            .add_event_listener(root, "wheel", ListenerOptions::default(), prevent)
            .unwrap();
        let outcome = shared.dispatch_event(leaf, HostEvent::new("wheel")).unwrap();
        assert!(outcome.default_prevented);
    }

    #[test]
    fn test_listener_may_detach_later_listener() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        let victim = shared
            .write()
            .add_event_listener(root, "click", ListenerOptions::default(), recorder(&log, "root", Propagation::Continue))
            .unwrap();
        let victim = Arc::new(Mutex::new(Some(victim)));

        let slot = Arc::clone(&victim);
        shared
            .write()
            .add_event_listener(
                leaf,
                "click",
                ListenerOptions::default(),
                Arc::new(move |_: &mut HostEvent, tree: &SharedHostTree| {
                    if let Some(listener) = slot.lock().take() {
                        tree.write()
                            .remove_event_listener(listener.node(), "click", &listener, false);
                    }
                    Ok(Propagation::Continue)
                }),
            )
            .unwrap();

        let outcome = shared.dispatch_event(leaf, HostEvent::new("click")).unwrap();
        assert_eq!(outcome.listeners_invoked, 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_listener_error_aborts_dispatch() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        let log: Log = Arc::default();
        {
            let mut tree = shared.write();
            tree.add_event_listener(
                leaf,
                "click",
                ListenerOptions::default(),
                Arc::new(|event: &mut HostEvent, _: &SharedHostTree| {
                    Err(DispatchError::ListenerDesync {
                        event_type: event.event_type().to_string(),
                        detail: "test",
                    })
                }),
            )
            .unwrap();
            tree.add_event_listener(root, "click", ListenerOptions::default(), recorder(&log, "root", Propagation::Continue))
                .unwrap();
        }

        let result = shared.dispatch_event(leaf, HostEvent::new("click"));
        assert!(matches!(
            result,
            Err(HostError::Dispatch(DispatchError::ListenerDesync { .. }))
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_dispatch_to_removed_node() {
        let shared = SharedHostTree::new();
        let (root, _, leaf) = chain(&shared);
        shared.write().remove_node(root).unwrap();
        assert_eq!(
            shared.dispatch_event(leaf, HostEvent::new("click")),
            Err(HostError::Dispatch(DispatchError::InvalidTarget))
        );
    }
}
