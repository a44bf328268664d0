use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::page::Page;
use crate::Result;

/// Event type fired by [`Page::click`](crate::Page::click).
pub const CLICK: &str = "click";

/// Lifecycle event fired once by
/// [`Page::dom_content_loaded`](crate::Page::dom_content_loaded).
pub const CONTENT_LOADED: &str = "DOMContentLoaded";

/// A dispatched event, passed mutably to every listener on its path.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: NodeId,
    bubbles: bool,
    trusted: bool,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl Event {
    pub(crate) fn new(event_type: &str, target: NodeId, bubbles: bool, trusted: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            bubbles,
            trusted,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub(crate) fn set_current_target(&mut self, node: NodeId) {
        self.current_target = node;
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub(crate) type HandlerFn = dyn Fn(&mut Page, &mut Event) -> Result<()>;

/// A callback attached to a single node for a single event type. Cloning a
/// `Listener` shares the underlying handler.
#[derive(Clone)]
pub struct Listener {
    pub(crate) handler: Rc<HandlerFn>,
}

impl Listener {
    pub fn new(handler: impl Fn(&mut Page, &mut Event) -> Result<()> + 'static) -> Self {
        Self {
            handler: Rc::new(handler),
        }
    }

    fn same_handler(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        let listeners = self.map.entry(node_id).or_default().entry(event).or_default();

        // Match browser semantics: re-adding the same handler reference for
        // the same node and event type is a no-op.
        if listeners
            .iter()
            .any(|existing| existing.same_handler(&listener))
        {
            return;
        }

        listeners.push(listener);
    }

    pub(crate) fn remove(&mut self, node_id: NodeId, event: &str, listener: &Listener) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let Some(listeners) = events.get_mut(event) else {
            return false;
        };

        if let Some(pos) = listeners
            .iter()
            .position(|existing| existing.same_handler(listener))
        {
            listeners.remove(pos);
            if listeners.is_empty() {
                events.remove(event);
            }
            if events.is_empty() {
                self.map.remove(&node_id);
            }
            return true;
        }

        false
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub(crate) fn total(&self) -> usize {
        self.map
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }
}
