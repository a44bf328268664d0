use std::collections::HashMap;

/// Handle to a node in a page's arena DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element_id = attrs.get("id").cloned();
        let id = self.create_node(Some(parent), NodeType::Element(Element { tag_name, attrs }));
        if let Some(element_id) = element_id {
            // First occurrence wins, matching id lookup order in a browser.
            self.id_index.entry(element_id).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|element| element.attrs.get(name))
            .map(String::as_str)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn by_id(&self, element_id: &str) -> Option<NodeId> {
        self.id_index.get(element_id).copied()
    }

    pub(crate) fn collect_elements_dfs(&self, from: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(from) {
            if self.is_element(child) {
                out.push(child);
            }
            self.collect_elements_dfs(child, out);
        }
    }

    pub(crate) fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node.node_type, NodeType::Element(_)))
            .count()
    }

    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.append_text(id, &mut out);
        out
    }

    fn append_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        if let NodeType::Text(text) = &node.node_type {
            out.push_str(text);
        }
        for &child in &node.children {
            self.append_text(child, out);
        }
    }

    pub(crate) fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.element(id).is_some_and(|element| {
            element
                .attrs
                .get("class")
                .is_some_and(|value| value.split_whitespace().any(|token| token == class_name))
        })
    }
}
