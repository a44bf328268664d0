use crate::console::Console;
use crate::dom::{Dom, NodeId};
use crate::events::{Event, Listener, ListenerStore, CLICK, CONTENT_LOADED};
use crate::html::parse_html;
use crate::{Error, Result};

/// Document lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Loading,
    Ready,
}

/// An in-memory page: parsed document, listener store, console channel, and
/// lifecycle state. All dispatch is synchronous on the caller's thread.
#[derive(Debug)]
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    console: Console,
    document_state: DocumentState,
    bootstrap_ran: bool,
}

impl Page {
    /// Parses `html` into a page in the `Loading` state. The content-loaded
    /// event has not fired yet; call [`Page::dom_content_loaded`] next.
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        tracing::debug!(elements = dom.element_count(), "parsed document");
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            console: Console::new(),
            document_state: DocumentState::Loading,
            bootstrap_ran: false,
        })
    }

    pub fn document_state(&self) -> DocumentState {
        self.document_state
    }

    pub fn is_ready(&self) -> bool {
        self.document_state == DocumentState::Ready
    }

    /// Fires the content-loaded lifecycle event. Fires at most once per
    /// page; a second call is a lifecycle error.
    pub fn dom_content_loaded(&mut self) -> Result<Event> {
        if self.is_ready() {
            return Err(Error::Lifecycle(
                "content-loaded already fired for this page".into(),
            ));
        }
        self.document_state = DocumentState::Ready;
        let root = self.dom.root();
        self.dispatch_to_node(root, CONTENT_LOADED, false)
    }

    pub(crate) fn mark_bootstrap_ran(&mut self) {
        self.bootstrap_ran = true;
    }

    pub fn bootstrap_ran(&self) -> bool {
        self.bootstrap_ran
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// The document node itself; listeners for lifecycle events go here.
    pub fn document_node(&self) -> NodeId {
        self.dom.root()
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.dom.query_selector(selector)
    }

    pub fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn text_content(&self, selector: &str) -> Result<String> {
        Ok(self.dom.text_content(self.select_one(selector)?))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .dom
            .attr(self.select_one(selector)?, name)
            .map(str::to_string))
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn node_attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.dom.attr(node, name)
    }

    pub fn element_count(&self) -> usize {
        self.dom.element_count()
    }

    /// Appends a fresh element under the first match of `parent_selector`.
    /// Listener attachment is a snapshot, so elements created here after a
    /// bootstrap ran do not pick up its listeners.
    pub fn append_element(
        &mut self,
        parent_selector: &str,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Result<NodeId> {
        let parent = self.select_one(parent_selector)?;
        let attrs = attrs
            .iter()
            .map(|&(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Ok(self.dom.create_element(parent, tag.to_string(), attrs))
    }

    /// Attaches `listener` to every current match of `selector`; returns how
    /// many elements were matched.
    pub fn on(&mut self, selector: &str, event_type: &str, listener: Listener) -> Result<usize> {
        let targets = self.query_selector_all(selector)?;
        for &node in &targets {
            self.listeners
                .add(node, event_type.to_string(), listener.clone());
        }
        Ok(targets.len())
    }

    pub fn add_node_listener(&mut self, node: NodeId, event_type: &str, listener: Listener) {
        tracing::trace!(node = node.0, event_type, "listener attached");
        self.listeners.add(node, event_type.to_string(), listener);
    }

    pub fn remove_node_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> bool {
        self.listeners.remove(node, event_type, listener)
    }

    pub fn listener_count(&self, selector: &str, event_type: &str) -> Result<usize> {
        let targets = self.query_selector_all(selector)?;
        Ok(targets
            .iter()
            .map(|&node| self.listeners.count(node, event_type))
            .sum())
    }

    pub fn node_listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    pub fn total_listener_count(&self) -> usize {
        self.listeners.total()
    }

    pub fn click(&mut self, selector: &str) -> Result<Event> {
        let target = self.select_one(selector)?;
        self.click_node(target)
    }

    pub fn click_node(&mut self, target: NodeId) -> Result<Event> {
        // Handlers may trigger nested dispatch; grow the stack up front.
        stacker::grow(32 * 1024 * 1024, || {
            self.dispatch_to_node(target, CLICK, true)
        })
    }

    /// Dispatches an arbitrary bubbling event to the first match.
    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<Event> {
        let target = self.select_one(selector)?;
        self.dispatch_to_node(target, event_type, true)
    }

    fn dispatch_to_node(&mut self, target: NodeId, event_type: &str, bubbles: bool) -> Result<Event> {
        let event = Event::new(event_type, target, bubbles, true);
        self.dispatch_prepared(event)
    }

    fn dispatch_prepared(&mut self, mut event: Event) -> Result<Event> {
        let mut path = Vec::new();
        let mut cursor = Some(event.target());
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }

        // Target phase first, then bubble toward the document node.
        for (depth, &node) in path.iter().enumerate() {
            if depth > 0 && !event.bubbles() {
                break;
            }
            event.set_current_target(node);
            for listener in self.listeners.get(node, event.event_type()) {
                (*listener.handler)(self, &mut event)?;
            }
            if event.propagation_stopped() {
                tracing::trace!(event_type = event.event_type(), "propagation stopped");
                break;
            }
        }

        Ok(event)
    }
}
