//! HTML serialization of tree nodes
//!
//! Void elements without children render as `<br>`, every other element
//! gets an explicit end tag. Contents of raw-text elements (`script`,
//! `style`, ...) are written unescaped.

use super::node::{NodeId, NodeKind};
use super::tree::Tree;
use crate::core::entities::{escape_attribute_to_buf, escape_text_to_buf};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Serialize a node and its subtree
pub fn outer_html(tree: &Tree, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(256);
    write_node(tree, node_id, &mut buf);
    buf
}

/// Serialize the children of a node, concatenated
pub fn inner_html(tree: &Tree, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(256);
    for child in tree.children(node_id) {
        write_node(tree, child, &mut buf);
    }
    buf
}

fn write_node(tree: &Tree, node_id: NodeId, buf: &mut String) {
    // Stack entries: Either entering a node or need to write closing tag
    enum StackEntry {
        Enter(NodeId),
        Close(NodeId),
    }

    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Close(id) => {
                if let Some(name) = tree.node_name(id) {
                    buf.push_str("</");
                    buf.push_str(name);
                    buf.push('>');
                }
            }
            StackEntry::Enter(current_id) => {
                let Some(node) = tree.get_node(current_id) else {
                    continue;
                };

                match node.kind {
                    NodeKind::Element => {
                        let name = tree.node_name(current_id).unwrap_or("");
                        buf.push('<');
                        buf.push_str(name);

                        for (attr_name, attr_value) in tree.attribute_pairs(current_id) {
                            buf.push(' ');
                            buf.push_str(attr_name);
                            buf.push_str("=\"");
                            escape_attribute_to_buf(attr_value, buf);
                            buf.push('"');
                        }
                        buf.push('>');

                        if node.first_child.is_none() && is_void(name) {
                            continue;
                        }

                        // Push closing tag first (processed after children)
                        stack.push(StackEntry::Close(current_id));

                        let mut child_id = node.last_child;
                        while let Some(cid) = child_id {
                            stack.push(StackEntry::Enter(cid));
                            child_id = tree.get_node(cid).and_then(|n| n.prev_sibling);
                        }
                    }
                    NodeKind::Text => {
                        let content = tree.character_data(current_id).unwrap_or("");
                        let raw = node
                            .parent
                            .and_then(|p| tree.node_name(p))
                            .is_some_and(is_raw_text);
                        if raw {
                            buf.push_str(content);
                        } else {
                            escape_text_to_buf(content, buf);
                        }
                    }
                    NodeKind::CData => {
                        buf.push_str("<![CDATA[");
                        buf.push_str(tree.character_data(current_id).unwrap_or(""));
                        buf.push_str("]]>");
                    }
                    NodeKind::Comment => {
                        buf.push_str("<!--");
                        buf.push_str(tree.character_data(current_id).unwrap_or(""));
                        buf.push_str("-->");
                    }
                    NodeKind::ProcessingInstruction => {
                        buf.push_str("<?");
                        buf.push_str(tree.node_name(current_id).unwrap_or(""));
                        if let Some(data) = tree.pi_data(current_id).filter(|d| !d.is_empty()) {
                            buf.push(' ');
                            buf.push_str(data);
                        }
                        buf.push_str("?>");
                    }
                    NodeKind::DocType => {
                        buf.push_str("<!DOCTYPE ");
                        buf.push_str(tree.node_name(current_id).unwrap_or("html"));
                        buf.push('>');
                    }
                    NodeKind::Document => {
                        let mut child_id = node.last_child;
                        while let Some(cid) = child_id {
                            stack.push(StackEntry::Enter(cid));
                            child_id = tree.get_node(cid).and_then(|n| n.prev_sibling);
                        }
                    }
                }
            }
        }
    }
}
