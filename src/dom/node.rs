//! Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// The document node always lives at index 0
pub const DOCUMENT_NODE: NodeId = 0;

/// Type of node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// `<!DOCTYPE ...>`
    DocType,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and for detached nodes)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// String pool ID of the name (elements, PIs, doctypes) or of the
    /// character data (text, cdata, comments)
    pub name_id: u32,
    /// String pool ID of processing-instruction data, 0 otherwise
    pub data_id: u32,
    /// Attributes in source order (elements only)
    pub attributes: Vec<Attribute>,
}

impl Node {
    fn with_kind(kind: NodeKind, name_id: u32) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            data_id: 0,
            attributes: Vec::new(),
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, 0)
    }

    /// Create a new element node
    pub fn element(name_id: u32) -> Self {
        Self::with_kind(NodeKind::Element, name_id)
    }

    /// Create a new text node
    pub fn text(content_id: u32) -> Self {
        Self::with_kind(NodeKind::Text, content_id)
    }

    /// Create a new comment node
    pub fn comment(content_id: u32) -> Self {
        Self::with_kind(NodeKind::Comment, content_id)
    }

    /// Create a new CDATA node
    pub fn cdata(content_id: u32) -> Self {
        Self::with_kind(NodeKind::CData, content_id)
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data_id: u32) -> Self {
        let mut node = Self::with_kind(NodeKind::ProcessingInstruction, target_id);
        node.data_id = data_id;
        node
    }

    pub fn doctype(name_id: u32) -> Self {
        Self::with_kind(NodeKind::DocType, name_id)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Text or CDATA
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    /// Whether `name_id` holds character data rather than a name
    #[inline]
    pub fn has_character_data(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData | NodeKind::Comment)
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// String pool ID of the attribute name
    pub name_id: u32,
    /// String pool ID of the attribute value
    pub value_id: u32,
}

impl Attribute {
    pub fn new(name_id: u32, value_id: u32) -> Self {
        Attribute { name_id, value_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = Node::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert!(!doc.has_children());
    }

    #[test]
    fn test_element_node() {
        let elem = Node::element(1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert_eq!(elem.name_id, 1);
        assert!(elem.is_element());
        assert!(!elem.has_attributes());
    }

    #[test]
    fn test_character_data_kinds() {
        assert!(Node::text(3).has_character_data());
        assert!(Node::cdata(3).is_text());
        assert!(Node::comment(3).has_character_data());
        assert!(!Node::comment(3).is_text());
        assert!(!Node::processing_instruction(1, 2).has_character_data());
    }
}
