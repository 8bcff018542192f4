//! In-memory DOM snapshot
//!
//! An arena of nodes addressed by [`NodeId`]. Index 0 is always the document
//! node; elements hang off it. Detached elements (no parent at all) are
//! supported because selector resolution has to handle them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node
    pub const DOCUMENT: NodeId = NodeId(0);
}

/// Kind of DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The document root
    Document,
    /// An element
    Element,
}

/// A single DOM node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    /// Node kind
    pub kind: NodeKind,
    /// Tag name, lowercase. Empty for the document node.
    #[serde(default, deserialize_with = "lowercase_tag")]
    pub tag_name: String,
    /// Attributes in name order
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Direct text of this node (descendant text excluded)
    #[serde(default)]
    pub text: String,
    /// Parent node, if attached
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Child elements in document order
    #[serde(default)]
    pub children: Vec<NodeId>,
}

fn lowercase_tag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|tag| tag.to_ascii_lowercase())
}

impl DomNode {
    fn element(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::Element,
            tag_name: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Attribute value, treating empty strings as absent
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether this is an element node
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }
}

/// DOM snapshot of one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<DomNode>,
}

impl Document {
    /// Create a document containing only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![DomNode {
                kind: NodeKind::Document,
                tag_name: String::new(),
                attributes: BTreeMap::new(),
                text: String::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append an element under `parent` and return its id
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode::element(tag, Some(parent)));
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Create an element that is not attached anywhere
    pub fn create_detached(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode::element(tag, None));
        id
    }

    /// Set an attribute on a node. Unknown ids are ignored.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> &mut Self {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Set the direct text of a node. Unknown ids are ignored.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> &mut Self {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.text = text.to_string();
        }
        self
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    /// Parent of a node if that parent is an element.
    ///
    /// The root `<html>` element's parent is the document node, so this
    /// returns `None` for it, matching `Element.parentElement`.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id)?.parent?;
        self.node(parent)
            .filter(|p| p.is_element())
            .map(|_| parent)
    }

    /// 1-based position of `id` among its parent's element children
    pub fn element_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id)?.parent?;
        self.node(parent)?
            .children
            .iter()
            .filter(|c| self.node(**c).map(DomNode::is_element).unwrap_or(false))
            .position(|c| *c == id)
            .map(|i| i + 1)
    }

    /// Concatenated text of a node and all its descendants, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, 0);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String, depth: usize) {
        // Cyclic snapshots stop at node-count depth
        if depth > self.nodes.len() {
            return;
        }
        if let Some(node) = self.node(id) {
            out.push_str(&node.text);
            for child in &node.children {
                self.collect_text(*child, out, depth + 1);
            }
        }
    }

    /// Number of nodes, including the document node
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no elements
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
