//! In-memory element tree backing the virtual document.
//!
//! Nodes live in an arena and are never reclaimed; removal marks the
//! subtree dead and detaches it from its parent, so stale handles keep
//! working (they just see a dead node).

/// Index of a node in the arena.
pub(crate) type NodeId = usize;

/// Description of an element to insert, builder-style.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
}

impl Element {
    /// Start describing an element with the given tag name.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
        }
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add a class; may be called repeatedly.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub tag: String,
    pub id_attr: Option<String>,
    pub classes: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub alive: bool,
}

/// The document tree: an arena of nodes rooted at `body`.
#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            id_attr: None,
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            alive: true,
        };
        Self {
            nodes: vec![body],
            body: 0,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.alive)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Insert `element` as the last child of `parent`.
    pub fn insert(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: element.tag,
            id_attr: element.id,
            classes: element.classes,
            parent: Some(parent),
            children: Vec::new(),
            alive: true,
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Detach `node` and mark its whole subtree dead.
    ///
    /// The body cannot be detached. Returns whether anything changed.
    pub fn detach(&mut self, node: NodeId) -> bool {
        if node == self.body || !self.is_alive(node) {
            return false;
        }
        if let Some(parent) = self.nodes[node].parent {
            self.nodes[parent].children.retain(|&child| child != node);
        }
        self.nodes[node].parent = None;

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            self.nodes[current].alive = false;
            stack.extend(self.nodes[current].children.iter().copied());
        }
        true
    }

    /// Live nodes in document order (depth-first from body).
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![self.body];
        while let Some(current) = stack.pop() {
            ordered.push(current);
            // Reversed so the leftmost child is visited first.
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        ordered
    }

    /// 1-based position among same-tag preceding siblings.
    pub fn nth_of_type(&self, node: NodeId) -> usize {
        let Some(parent) = self.nodes[node].parent else {
            return 1;
        };
        let tag = &self.nodes[node].tag;
        self.nodes[parent]
            .children
            .iter()
            .take_while(|&&sibling| sibling != node)
            .filter(|&&sibling| &self.nodes[sibling].tag == tag)
            .count()
            + 1
    }
}
