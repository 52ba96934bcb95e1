//! DOM Module - Arena-based mutable document tree
//!
//! Implements an efficient DOM representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, attribute values and character data
//! - HTML serialization and two tree builders (strict and lenient)

pub mod builder;
pub mod node;
pub mod serializer;
pub mod strings;
pub mod tree;

use std::collections::HashMap;

pub use node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
pub use strings::StringPool;
pub use tree::Tree;

/// Read access to a document, the seam the XPath engine evaluates against
pub trait DocumentAccess {
    /// The document node (absolute paths start here)
    fn document_node_id(&self) -> NodeId {
        DOCUMENT_NODE
    }

    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    /// Get a node by ID
    fn get_node(&self, id: NodeId) -> Option<&Node>;

    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Get node name as string (elements, PIs, doctypes)
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Get node local name (without prefix)
    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        match name.find(':') {
            Some(pos) => Some(&name[pos + 1..]),
            None => Some(name),
        }
    }

    /// Character data of a text, CDATA or comment node
    fn text_content(&self, id: NodeId) -> Option<&str>;

    /// Get attribute value by name
    fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str>;

    /// Get all attribute names and values
    fn get_attribute_values(&self, node_id: NodeId) -> Vec<(&str, &str)>;

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.next_sibling)
    }

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.prev_sibling)
    }

    /// Children in document order
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Descendants in document order
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Pre-order position of each node attached to the document
    fn document_order(&self) -> HashMap<NodeId, usize>;
}

impl DocumentAccess for Tree {
    fn root_element_id(&self) -> Option<NodeId> {
        self.document_element()
    }

    fn get_node(&self, id: NodeId) -> Option<&Node> {
        Tree::get_node(self, id)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        Tree::node_name(self, id)
    }

    fn text_content(&self, id: NodeId) -> Option<&str> {
        self.character_data(id)
    }

    fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        Tree::get_attribute(self, node_id, name)
    }

    fn get_attribute_values(&self, node_id: NodeId) -> Vec<(&str, &str)> {
        self.attribute_pairs(node_id)
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id).collect()
    }

    fn document_order(&self) -> HashMap<NodeId, usize> {
        Tree::document_order(self)
    }
}

/// XPath string-value of a node: concatenated descendant text for elements
/// and the document, own data for text, CDATA and comments
pub fn node_string_value<D: DocumentAccess>(doc: &D, id: NodeId) -> String {
    match doc.node_kind_of(id) {
        Some(NodeKind::Element | NodeKind::Document) => {
            let mut result = String::new();
            for desc in doc.descendants_vec(id) {
                if matches!(doc.node_kind_of(desc), Some(NodeKind::Text | NodeKind::CData)) {
                    result.push_str(doc.text_content(desc).unwrap_or(""));
                }
            }
            result
        }
        Some(NodeKind::Text | NodeKind::CData | NodeKind::Comment) => {
            doc.text_content(id).unwrap_or("").to_string()
        }
        _ => String::new(),
    }
}
