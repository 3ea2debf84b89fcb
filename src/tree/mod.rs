// Document tree for jsonlayout
//
// An ordered, parented tree of typed nodes mirroring a JSON value. Nodes live
// in an arena owned by the tree and refer to each other by index, so the
// parent link is a plain back-reference and dropping the tree drops every
// subtree with it.

pub use self::layout::{EditMode, FieldType, LeafLayout};
pub use self::value::{LeafValue, PackedDate, ValueType};

pub mod layout;
pub mod value;

/// Key given to the root node of every tree.
pub const ROOT_KEY: &str = "root";

/// Stable handle to a node within one `DocumentTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its tree's arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A single tree element.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    key: String,
    value_type: ValueType,
    value: Option<LeafValue>,
    layout: Option<LeafLayout>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(key: String, value_type: ValueType, parent: Option<NodeId>) -> Self {
        Self {
            key,
            value_type,
            value: None,
            layout: None,
            parent,
            children: Vec::new(),
        }
    }

    /// Key under the parent: the member name, or the index for array elements.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// JSON kind at this position.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Scalar payload; always `None` for containers.
    pub fn value(&self) -> Option<&LeafValue> {
        self.value.as_ref()
    }

    /// Layout metadata, present only on schema-built leaves.
    pub fn layout(&self) -> Option<&LeafLayout> {
        self.layout.as_ref()
    }

    /// True once layout metadata has been attached.
    pub fn is_leaf(&self) -> bool {
        self.layout.is_some()
    }

    /// True for arrays and objects.
    pub fn is_container(&self) -> bool {
        self.value_type.is_container()
    }

    /// Free-text description from the layout, or "" without one.
    pub fn description(&self) -> &str {
        self.layout.as_ref().map(|l| l.description.as_str()).unwrap_or("")
    }
}

/// Arena-backed document tree. The root is always the first node.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTree {
    nodes: Vec<Node>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new(ValueType::Object)
    }
}

impl DocumentTree {
    /// Creates a tree holding only a root container of the given kind.
    pub fn new(root_type: ValueType) -> Self {
        Self {
            nodes: vec![Node::new(ROOT_KEY.to_string(), root_type, None)],
        }
    }

    /// The root container.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].children.is_empty()
    }

    /// Looks up a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Appends a fresh node under `parent`. Nodes are only ever created here,
    /// so the structure cannot contain cycles.
    pub fn add_child(&mut self, parent: NodeId, key: impl Into<String>, value_type: ValueType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key.into(), value_type, Some(parent)));
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(id);
        }
        id
    }

    /// The `row`-th child of a node.
    pub fn child(&self, id: NodeId, row: usize) -> Option<NodeId> {
        self.node(id)?.children.get(row).copied()
    }

    /// Children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of a node; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Position of the node among its siblings; the root reports 0.
    pub fn row(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|p| self.children(p).iter().position(|c| *c == id))
            .unwrap_or(0)
    }

    /// Replaces a node's value without any validation.
    pub fn set_value(&mut self, id: NodeId, value: LeafValue) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.value = Some(value);
        }
    }

    /// Attaches layout metadata, marking the node as a leaf.
    pub fn set_layout(&mut self, id: NodeId, layout: LeafLayout) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.layout = Some(layout);
        }
    }

    /// Every node carrying layout metadata, in tree order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                if node.is_leaf() {
                    out.push(id);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Looks a node up by its `/`-separated key path below the root.
    /// An empty path names the root.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .children(current)
                .iter()
                .copied()
                .find(|c| self.nodes[c.0].key == segment)?;
        }
        Some(current)
    }

    /// Key path from the root to the node, e.g. `config/ports/0`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.node(cur) {
                Some(node) if node.parent.is_some() => {
                    segments.push(node.key.as_str());
                    current = node.parent;
                }
                _ => break,
            }
        }
        segments.reverse();
        segments.join("/")
    }
}
