//! Arena Tree - mutable DOM storage
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names and character data
//!
//! Detached nodes stay in the arena, unlinked. Ids are never reused, so a
//! NodeId handed out once keeps naming the same (possibly detached) node.
//! Interned strings are never released either (`normalize` interns each
//! merged run), so a tree only grows under mutation. Building a new tree
//! is the only way to reclaim space.

use std::collections::HashMap;

use super::node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
use super::strings::StringPool;

/// A document tree stored in arena format
#[derive(Debug, Clone)]
pub struct Tree {
    /// Arena of nodes, index 0 is the document node
    nodes: Vec<Node>,
    /// Interned strings
    pub strings: StringPool,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(Node::document());
        Tree {
            nodes,
            strings: StringPool::new(),
        }
    }

    /// Total number of nodes in the arena, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// First element child of the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(DOCUMENT_NODE)
            .find(|&id| self.kind(id) == Some(NodeKind::Element))
    }

    /// Name of an element, processing instruction target or doctype
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction | NodeKind::DocType => {
                self.strings.get_str(node.name_id)
            }
            _ => None,
        }
    }

    /// Character data of a text, cdata or comment node
    pub fn character_data(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.has_character_data() {
            self.strings.get_str(node.name_id)
        } else {
            None
        }
    }

    /// Data of a processing instruction
    pub fn pi_data(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.kind == NodeKind::ProcessingInstruction {
            self.strings.get_str(node.data_id)
        } else {
            None
        }
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.push(Node::element(name_id))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.strings.intern(text);
        self.push(Node::text(id))
    }

    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        let id = self.strings.intern(text);
        self.push(Node::cdata(id))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let id = self.strings.intern(text);
        self.push(Node::comment(id))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        let target_id = self.strings.intern(target);
        let data_id = self.strings.intern(data);
        self.push(Node::processing_instruction(target_id, data_id))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.push(Node::doctype(name_id))
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.get_node(id).map(|n| n.attributes.as_slice()).unwrap_or(&[])
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| self.strings.get_str(attr.name_id) == Some(name))
            .and_then(|attr| self.strings.get_str(attr.value_id))
    }

    /// All attribute names and values in source order
    pub fn attribute_pairs(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.attributes(id)
            .iter()
            .filter_map(|attr| {
                let name = self.strings.get_str(attr.name_id)?;
                let value = self.strings.get_str(attr.value_id)?;
                Some((name, value))
            })
            .collect()
    }

    /// Set (or overwrite in place) an attribute. Returns false for non-elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        if self.kind(id) != Some(NodeKind::Element) {
            return false;
        }
        let name_id = self.strings.intern(name);
        let value_id = self.strings.intern(value);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        match node.attributes.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => attr.value_id = value_id,
            None => node.attributes.push(Attribute::new(name_id, value_id)),
        }
        true
    }

    /// Remove an attribute. Returns whether it existed.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let name_id = self.strings.intern(name);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let before = node.attributes.len();
        node.attributes.retain(|a| a.name_id != name_id);
        node.attributes.len() != before
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_node(id).and_then(|n| n.parent);
        }
        false
    }

    /// Unlink a node from its parent and siblings. Its subtree stays attached to it.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get_node(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(prev_id) = prev {
            if let Some(p) = self.node_mut(prev_id) {
                p.next_sibling = next;
            }
        } else if let Some(parent_id) = parent {
            if let Some(p) = self.node_mut(parent_id) {
                p.first_child = next;
            }
        }

        if let Some(next_id) = next {
            if let Some(n) = self.node_mut(next_id) {
                n.prev_sibling = prev;
            }
        } else if let Some(parent_id) = parent {
            if let Some(p) = self.node_mut(parent_id) {
                p.last_child = prev;
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// Insert `child` under `parent` before `reference` (append when None).
    ///
    /// The child is detached from its current position first. Returns false
    /// when the insertion would create a cycle or `reference` is not a child
    /// of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> bool {
        if self.get_node(parent).is_none()
            || self.get_node(child).is_none()
            || child == DOCUMENT_NODE
            || self.is_ancestor_or_self(child, parent)
        {
            return false;
        }
        if let Some(ref_id) = reference {
            if ref_id == child || self.get_node(ref_id).and_then(|n| n.parent) != Some(parent) {
                return false;
            }
        }

        self.detach(child);

        let prev = match reference {
            Some(ref_id) => self.get_node(ref_id).and_then(|n| n.prev_sibling),
            None => self.get_node(parent).and_then(|n| n.last_child),
        };

        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }

        match prev {
            Some(prev_id) => {
                if let Some(p) = self.node_mut(prev_id) {
                    p.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(p) = self.node_mut(parent) {
                    p.first_child = Some(child);
                }
            }
        }

        match reference {
            Some(ref_id) => {
                if let Some(r) = self.node_mut(ref_id) {
                    r.prev_sibling = Some(child);
                }
            }
            None => {
                if let Some(p) = self.node_mut(parent) {
                    p.last_child = Some(child);
                }
            }
        }

        true
    }

    #[inline]
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Put `new_child` at `old_child`'s position and detach `old_child`
    pub fn replace_child(&mut self, new_child: NodeId, old_child: NodeId) -> bool {
        if new_child == old_child {
            return true;
        }
        let Some(parent) = self.get_node(old_child).and_then(|n| n.parent) else {
            return false;
        };
        if !self.insert_before(parent, new_child, Some(old_child)) {
            return false;
        }
        self.detach(old_child);
        true
    }

    /// Detach every child of `parent`
    pub fn remove_children(&mut self, parent: NodeId) {
        let children: Vec<NodeId> = self.children(parent).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Deep (or shallow) copy of a node from another tree into this one.
    ///
    /// The copy is left unlinked. Document nodes cannot be imported.
    pub fn import_node(&mut self, source: &Tree, id: NodeId, deep: bool) -> Option<NodeId> {
        let root = self.import_single(source, id)?;
        if !deep {
            return Some(root);
        }

        let mut stack: Vec<(NodeId, NodeId)> = vec![(id, root)];
        while let Some((src_parent, dst_parent)) = stack.pop() {
            let children: Vec<NodeId> = source.children(src_parent).collect();
            for src_child in children {
                if let Some(dst_child) = self.import_single(source, src_child) {
                    self.append_child(dst_parent, dst_child);
                    stack.push((src_child, dst_child));
                }
            }
        }

        Some(root)
    }

    fn import_single(&mut self, source: &Tree, id: NodeId) -> Option<NodeId> {
        let node = source.get_node(id)?;
        let name = source.strings.get_str(node.name_id).unwrap_or("");
        let copy = match node.kind {
            NodeKind::Document => return None,
            NodeKind::Element => {
                let copy = self.create_element(name);
                for (attr_name, attr_value) in source.attribute_pairs(id) {
                    self.set_attribute(copy, attr_name, attr_value);
                }
                copy
            }
            NodeKind::Text => self.create_text(name),
            NodeKind::CData => self.create_cdata(name),
            NodeKind::Comment => self.create_comment(name),
            NodeKind::ProcessingInstruction => {
                let data = source.strings.get_str(node.data_id).unwrap_or("");
                self.create_processing_instruction(name, data)
            }
            NodeKind::DocType => self.create_doctype(name),
        };
        Some(copy)
    }

    /// Merge adjacent text nodes and drop empty ones in the subtree of `id`
    pub fn normalize(&mut self, id: NodeId) {
        let mut parents = vec![id];
        parents.extend(
            self.descendants(id)
                .filter(|&d| self.kind(d) == Some(NodeKind::Element)),
        );

        for parent in parents {
            let children: Vec<NodeId> = self.children(parent).collect();
            let mut previous_text: Option<NodeId> = None;
            for child in children {
                if self.kind(child) != Some(NodeKind::Text) {
                    previous_text = None;
                    continue;
                }
                let text = self.character_data(child).unwrap_or("").to_string();
                if text.is_empty() {
                    self.detach(child);
                    continue;
                }
                match previous_text {
                    Some(prev) => {
                        let merged = format!("{}{}", self.character_data(prev).unwrap_or(""), text);
                        let merged_id = self.strings.intern(&merged);
                        if let Some(node) = self.node_mut(prev) {
                            node.name_id = merged_id;
                        }
                        self.detach(child);
                    }
                    None => previous_text = Some(child),
                }
            }
        }
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { tree: self, next: first }
    }

    /// Iterate over all descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { tree: self, stack }
    }

    /// Concatenated text of a node: own data for character data nodes,
    /// descendant text and CDATA for elements and the document
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.get_node(id) else {
            return String::new();
        };
        match node.kind {
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => {
                self.character_data(id).unwrap_or("").to_string()
            }
            NodeKind::ProcessingInstruction => self.pi_data(id).unwrap_or("").to_string(),
            NodeKind::DocType => String::new(),
            NodeKind::Element | NodeKind::Document => {
                let mut result = String::new();
                for desc in self.descendants(id) {
                    if self.get_node(desc).is_some_and(|n| n.is_text()) {
                        result.push_str(self.character_data(desc).unwrap_or(""));
                    }
                }
                result
            }
        }
    }

    /// Pre-order position of every node reachable from the document node
    pub fn document_order(&self) -> HashMap<NodeId, usize> {
        std::iter::once(DOCUMENT_NODE)
            .chain(self.descendants(DOCUMENT_NODE))
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes
pub struct DescendantIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.tree.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.tree.get_node(id).and_then(|n| n.prev_sibling);
            }
        }
        Some(current)
    }
}
