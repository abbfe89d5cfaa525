//! Mutable element tree the engine reads and annotates.
//!
//! Consumers mirror their real UI tree into a [`Document`] (or build one via
//! the widget factory) and hand subtree roots to the extraction, annotation,
//! and submission modules. The tree is an arena of nodes addressed by
//! [`NodeId`]; detached nodes stay in the arena but are unreachable from any
//! root, so traversal never sees them. Documents are transient — built per
//! form, dropped when the page moves on.

use std::collections::BTreeMap;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Arena-backed element tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag));
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first if
    /// it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Detach `node` from its parent. The subtree stays intact but becomes
    /// unreachable from the old root.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Tag name of `node`.
    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    /// Attribute value, if set.
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attrs.remove(name);
    }

    /// Whether `node` carries the given class.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    /// Add a class (no duplicates).
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node.0].classes.push(class.to_string());
        }
    }

    /// Remove a class if present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node.0].classes.retain(|c| c != class);
    }

    /// The node's own text content.
    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    /// Replace the node's text content.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node.0].text = text.to_string();
    }

    /// Child handles in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Parent handle, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// All descendants of `root` in document (preorder) order, excluding
    /// `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(root, &mut out);
        out
    }

    fn collect_descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(node) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Nearest ancestor (including `node` itself) matching the predicate.
    pub fn closest<F>(&self, node: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        let mut current = Some(node);
        while let Some(n) = current {
            if pred(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// First descendant of `root` matching the predicate, in document order.
    pub fn find_first<F>(&self, root: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        self.descendants(root).into_iter().find(|&n| pred(self, n))
    }

    /// All descendants of `root` matching the predicate, in document order.
    pub fn find_all<F>(&self, root: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        self.descendants(root)
            .into_iter()
            .filter(|&n| pred(self, n))
            .collect()
    }

    /// First descendant whose `name` attribute equals `name`.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.find_first(root, |d, n| d.attr(n, "name") == Some(name))
    }

    /// All descendants whose `name` attribute equals `name`, in document order.
    pub fn find_all_by_name(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.find_all(root, |d, n| d.attr(n, "name") == Some(name))
    }
}
