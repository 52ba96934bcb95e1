//! Tree construction
//!
//! Two parsers feed the arena: the strict reader for well-formed markup,
//! and html5ever (through `scraper`) for everything else. `parse` tries
//! them in that order; the lenient pass always produces a tree.
//! Fragments that fail the strict reader go through html5ever's fragment
//! algorithm against a context element instead of a whole-document parse.

use std::borrow::Cow;

use html5ever::driver::{parse_fragment, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::{ns, LocalName, QualName};
use memchr::memchr;
use scraper::{Html, HtmlTreeSink, Node as HtmlNode};
use tracing::debug;

use super::node::{NodeId, NodeKind, DOCUMENT_NODE};
use super::tree::Tree;
use crate::core::attributes::is_blank;
use crate::core::scanner::is_whitespace;
use crate::reader::{ParseError, SliceReader, XmlEvent};

/// Which parser produced a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Strict,
    Lenient,
}

/// Parse markup into a tree: strict first (when enabled), then lenient
pub fn parse(input: &str, strict_first: bool) -> (Tree, ParserKind) {
    if is_blank(input) {
        return (Tree::new(), ParserKind::Strict);
    }

    if strict_first {
        match build_strict(input) {
            Ok(tree) => return (tree, ParserKind::Strict),
            Err(err) => debug!(error = %err, "strict parse failed, retrying lenient"),
        }
    }

    (build_lenient(input), ParserKind::Lenient)
}

/// Remove whitespace-only runs between a `>` and the next `<`
pub fn collapse_inter_tag_whitespace(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let mut result: Option<String> = None;
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = memchr(b'>', &bytes[pos..]) {
        let gt = pos + offset;
        let mut end = gt + 1;
        while end < bytes.len() && is_whitespace(bytes[end]) {
            end += 1;
        }
        if end > gt + 1 && bytes.get(end) == Some(&b'<') {
            let out = result.get_or_insert_with(|| String::with_capacity(input.len()));
            out.push_str(&input[copied..=gt]);
            copied = end;
        }
        pos = end.max(gt + 1);
        if pos >= bytes.len() {
            break;
        }
    }

    match result {
        Some(mut out) => {
            out.push_str(&input[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(input),
    }
}

/// Build a tree from well-formed markup.
///
/// Fails on any well-formedness error: mismatched or unclosed tags, bare
/// `&`, undefined entities, unquoted or valueless attributes, more than
/// one root element, or text outside the root.
pub fn build_strict(input: &str) -> Result<Tree, ParseError> {
    let mut tree = Tree::new();
    let mut stack: Vec<(NodeId, &str)> = Vec::new();
    let mut seen_root = false;
    let mut reader = SliceReader::new(input);

    while let Some(event) = reader.next_event()? {
        let parent = stack.last().map(|&(id, _)| id).unwrap_or(DOCUMENT_NODE);
        let at_top = stack.is_empty();

        match event {
            XmlEvent::StartElement(elem) | XmlEvent::EmptyElement(elem)
                if at_top && seen_root =>
            {
                return Err(ParseError::new(
                    format!("Document has multiple root elements: <{}>", elem.name),
                    0,
                ));
            }
            XmlEvent::StartElement(elem) => {
                let id = append_element(&mut tree, parent, elem.name, &elem.attributes);
                seen_root |= at_top;
                stack.push((id, elem.name));
            }
            XmlEvent::EmptyElement(elem) => {
                append_element(&mut tree, parent, elem.name, &elem.attributes);
                seen_root |= at_top;
            }
            XmlEvent::EndElement(name) => match stack.pop() {
                Some((_, open)) if open == name => {}
                Some((_, open)) => {
                    return Err(ParseError::new(
                        format!("Tag mismatch: <{}> closed with </{}>", open, name),
                        0,
                    ))
                }
                None => {
                    return Err(ParseError::new(
                        format!("Unexpected end tag: </{}>", name),
                        0,
                    ))
                }
            },
            XmlEvent::Text(text) => {
                if at_top {
                    if !is_blank(&text) {
                        return Err(ParseError::new("Text content not allowed at document level", 0));
                    }
                    continue;
                }
                let id = tree.create_text(&text);
                tree.append_child(parent, id);
            }
            XmlEvent::CData(text) => {
                if at_top {
                    return Err(ParseError::new("CDATA section not allowed at document level", 0));
                }
                let id = tree.create_cdata(text);
                tree.append_child(parent, id);
            }
            XmlEvent::Comment(text) => {
                let id = tree.create_comment(text);
                tree.append_child(parent, id);
            }
            XmlEvent::ProcessingInstruction { target, data } => {
                let id = tree.create_processing_instruction(target, data.unwrap_or(""));
                tree.append_child(parent, id);
            }
            XmlEvent::DocType(name) => {
                if !at_top || seen_root {
                    return Err(ParseError::new("DOCTYPE must come before the root element", 0));
                }
                let id = tree.create_doctype(name);
                tree.append_child(DOCUMENT_NODE, id);
            }
            XmlEvent::XmlDeclaration => {}
        }
    }

    if let Some(&(_, open)) = stack.first() {
        return Err(ParseError::new(format!("Unclosed tag: <{}>", open), input.len()));
    }
    if !seen_root {
        return Err(ParseError::new("No root element", input.len()));
    }

    Ok(tree)
}

fn append_element(
    tree: &mut Tree,
    parent: NodeId,
    name: &str,
    attributes: &[crate::core::attributes::Attribute<'_>],
) -> NodeId {
    let id = tree.create_element(name);
    for attr in attributes {
        tree.set_attribute(id, attr.name, &attr.value);
    }
    tree.append_child(parent, id);
    id
}

/// Build a tree with the HTML5 parsing algorithm. Never fails.
pub fn build_lenient(input: &str) -> Tree {
    let html = Html::parse_document(input);
    let mut tree = Tree::new();
    copy_html(&html, &mut tree, false);
    drop_empty_head(&mut tree);
    tree
}

/// Parse `input` as the content of a `context` element. Never fails.
///
/// The top-level nodes of the fragment become children of the document
/// node, with no `html` or `body` around them.
pub fn build_fragment_lenient(input: &str, context: &str) -> Tree {
    let context = QualName::new(None, ns!(html), LocalName::from(context.to_ascii_lowercase()));
    let sink = HtmlTreeSink::new(Html::new_fragment());
    let html = parse_fragment(sink, ParseOpts::default(), context, Vec::new(), false).one(input);
    let mut tree = Tree::new();
    copy_html(&html, &mut tree, true);
    tree
}

/// Copy a parsed html5ever tree under the document node. For fragments the
/// `html` wrapper html5ever puts around the content is skipped.
fn copy_html(html: &Html, tree: &mut Tree, fragment: bool) {
    let mut start = html.tree.root();
    if fragment {
        match start.children().find(|child| child.value().is_element()) {
            Some(wrapper) => start = wrapper,
            None => return,
        }
    }

    let mut stack = vec![(start, DOCUMENT_NODE)];
    while let Some((source, parent)) = stack.pop() {
        for child in source.children() {
            let id = match child.value() {
                HtmlNode::Element(el) => {
                    let id = tree.create_element(el.name());
                    for (name, value) in el.attrs() {
                        tree.set_attribute(id, name, value);
                    }
                    stack.push((child, id));
                    id
                }
                HtmlNode::Text(text) => tree.create_text(&**text),
                HtmlNode::Comment(comment) => tree.create_comment(&**comment),
                HtmlNode::Doctype(doctype) => tree.create_doctype(doctype.name()),
                HtmlNode::ProcessingInstruction(pi) => {
                    tree.create_processing_instruction(&*pi.target, &*pi.data)
                }
                HtmlNode::Document | HtmlNode::Fragment => continue,
            };
            tree.append_child(parent, id);
        }
    }
}

/// html5ever always synthesizes `<head>`; drop it when it holds nothing
fn drop_empty_head(tree: &mut Tree) {
    let Some(html) = tree.document_element() else {
        return;
    };
    let head = tree
        .children(html)
        .find(|&id| tree.kind(id) == Some(NodeKind::Element) && tree.node_name(id) == Some("head"));
    if let Some(head) = head {
        let empty = tree
            .get_node(head)
            .is_some_and(|n| !n.has_children() && !n.has_attributes());
        if empty {
            tree.detach(head);
        }
    }
}
