//! Node handles
//!
//! A `NodeHandle` is a weak reference into a document's tree plus a node
//! id. It owns nothing: once the document is dropped or reloaded the
//! handle is detached, reads come back empty and writes fail with
//! `Error::Detached`.
//!
//! Writes that replace the node (`set_outer_markup`, `set_text`) repoint
//! the handle at the replacement. Removing the node leaves the handle on
//! the unlinked node as a placeholder.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::trace;

use crate::collection::{parse_fragment, NodeCollection};
use crate::core::entities::escape_attribute_to_buf;
use crate::document::Document;
use crate::dom::serializer::{inner_html, outer_html};
use crate::dom::{NodeId, NodeKind, Tree, DOCUMENT_NODE};
use crate::error::{Error, Result};
use crate::query::{resolve_index, select, select_css};
use crate::selector::SelectorTranslator;

#[derive(Clone)]
pub struct NodeHandle {
    tree: Weak<RefCell<Tree>>,
    id: NodeId,
    translator: Arc<SelectorTranslator>,
}

impl NodeHandle {
    pub(crate) fn new(tree: Weak<RefCell<Tree>>, id: NodeId, translator: Arc<SelectorTranslator>) -> Self {
        NodeHandle { tree, id, translator }
    }

    /// Arena id of the referenced node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the owning document is gone
    pub fn is_detached(&self) -> bool {
        self.tree.strong_count() == 0
    }

    pub(crate) fn upgrade(&self) -> Option<Rc<RefCell<Tree>>> {
        self.tree.upgrade()
    }

    fn with_tree<T>(&self, f: impl FnOnce(&Tree) -> T) -> Option<T> {
        let cell = self.tree.upgrade()?;
        let tree = cell.borrow();
        Some(f(&tree))
    }

    fn with_tree_mut<T>(&self, f: impl FnOnce(&mut Tree) -> T) -> Result<T> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        let mut tree = cell.borrow_mut();
        Ok(f(&mut tree))
    }

    fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle {
            tree: self.tree.clone(),
            id,
            translator: Arc::clone(&self.translator),
        }
    }

    fn related(&self, pick: impl FnOnce(&Tree) -> Option<NodeId>) -> Option<NodeHandle> {
        self.with_tree(pick).flatten().map(|id| self.handle(id))
    }

    pub fn node_kind(&self) -> Option<NodeKind> {
        self.with_tree(|tree| tree.kind(self.id)).flatten()
    }

    /// Parent element; the document node is never returned
    pub fn parent(&self) -> Option<NodeHandle> {
        self.related(|tree| {
            tree.get_node(self.id)
                .and_then(|n| n.parent)
                .filter(|&p| p != DOCUMENT_NODE)
        })
    }

    pub fn first_child(&self) -> Option<NodeHandle> {
        self.related(|tree| tree.get_node(self.id).and_then(|n| n.first_child))
    }

    pub fn last_child(&self) -> Option<NodeHandle> {
        self.related(|tree| tree.get_node(self.id).and_then(|n| n.last_child))
    }

    pub fn next_sibling(&self) -> Option<NodeHandle> {
        self.related(|tree| tree.get_node(self.id).and_then(|n| n.next_sibling))
    }

    pub fn previous_sibling(&self) -> Option<NodeHandle> {
        self.related(|tree| tree.get_node(self.id).and_then(|n| n.prev_sibling))
    }

    /// Element child at `index`; negative indexes count from the end
    pub fn child(&self, index: isize) -> Option<NodeHandle> {
        self.related(|tree| {
            let elements: Vec<NodeId> = element_children(tree, self.id).collect();
            resolve_index(elements.len(), index).map(|i| elements[i])
        })
    }

    /// Element children
    pub fn children(&self) -> NodeCollection {
        self.with_tree(|tree| element_children(tree, self.id).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    /// All child nodes, text and comments included
    pub fn child_nodes(&self) -> NodeCollection {
        self.with_tree(|tree| tree.children(self.id).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    /// Element name (also the target of a PI and the name of a doctype)
    pub fn tag(&self) -> Option<String> {
        self.with_tree(|tree| tree.node_name(self.id).map(str::to_owned))
            .flatten()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with_tree(|tree| tree.get_attribute(self.id, name).map(str::to_owned))
            .flatten()
    }

    /// Attributes in source order, `None` when there are none
    pub fn all_attributes(&self) -> Option<Vec<(String, String)>> {
        self.with_tree(|tree| {
            let pairs = tree.attribute_pairs(self.id);
            if pairs.is_empty() {
                return None;
            }
            Some(
                pairs
                    .into_iter()
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect(),
            )
        })
        .flatten()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.with_tree(|tree| tree.get_attribute(self.id, name).is_some())
            .unwrap_or(false)
    }

    /// Plain text content, unescaped
    pub fn text(&self) -> String {
        self.with_tree(|tree| tree.text_content(self.id))
            .unwrap_or_default()
    }

    /// Markup of the node and its subtree
    pub fn outer_markup(&self) -> String {
        self.with_tree(|tree| outer_html(tree, self.id))
            .unwrap_or_default()
    }

    /// Markup of the node's children
    pub fn inner_markup(&self) -> String {
        self.with_tree(|tree| inner_html(tree, self.id))
            .unwrap_or_default()
    }

    /// Attributes rendered as they appear in a start tag
    fn attribute_markup(&self) -> String {
        let mut buf = String::new();
        for (name, value) in self.all_attributes().unwrap_or_default() {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(&name);
            buf.push_str("=\"");
            escape_attribute_to_buf(&value, &mut buf);
            buf.push('"');
        }
        buf
    }

    /// Replace this node with the single node parsed from `fragment`.
    ///
    /// More than one top-level node fails with `InvalidFragment` and leaves
    /// the tree alone. An empty fragment removes the node and returns `None`.
    /// A node without a parent (the document node, or one already removed)
    /// cannot be replaced or removed.
    ///
    /// The replaced node stays allocated in the document's arena until the
    /// document is dropped or reloaded.
    pub fn set_outer_markup(&mut self, fragment: &str) -> Result<Option<NodeHandle>> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        let context = {
            let tree = cell.borrow();
            let parent = parent_of(&tree, self.id)?;
            element_name(&tree, parent)
        };
        let parsed = parse_fragment(fragment, context.as_deref());
        let root = match parsed.roots.as_slice() {
            [] => {
                self.remove(&mut cell.borrow_mut());
                return Ok(None);
            }
            [root] => *root,
            _ => return Err(Error::InvalidFragment),
        };

        let mut tree = cell.borrow_mut();
        let imported = tree
            .import_node(&parsed.tree, root, true)
            .ok_or(Error::InvalidFragment)?;
        self.replace(&mut tree, imported)?;
        Ok(Some(self.clone()))
    }

    /// Replace all children with the nodes parsed from `fragment`.
    ///
    /// Malformed markup is parsed as the content of this element, so rows
    /// stay rows inside a table. The old children stay allocated in the
    /// arena until the document is dropped or reloaded.
    pub fn set_inner_markup(&mut self, fragment: &str) -> Result<NodeHandle> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        let mut tree = cell.borrow_mut();
        if !matches!(tree.kind(self.id), Some(NodeKind::Element | NodeKind::Document)) {
            return Err(Error::UnsupportedOperation(
                "only elements have inner markup".to_string(),
            ));
        }

        let parsed = parse_fragment(fragment, element_name(&tree, self.id).as_deref());
        tree.remove_children(self.id);
        for &root in &parsed.roots {
            if let Some(imported) = tree.import_node(&parsed.tree, root, true) {
                tree.append_child(self.id, imported);
            }
        }
        tree.normalize(self.id);
        trace!(node = self.id, roots = parsed.roots.len(), "replaced children");
        Ok(self.clone())
    }

    /// Replace this node with a text node holding `text` verbatim.
    ///
    /// Empty text removes the node and returns `None`. A node without a
    /// parent cannot be replaced or removed. The replaced node stays
    /// allocated in the arena until the document is dropped or reloaded.
    pub fn set_text(&mut self, text: &str) -> Result<Option<NodeHandle>> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        let mut tree = cell.borrow_mut();
        parent_of(&tree, self.id)?;
        if text.is_empty() {
            self.remove(&mut tree);
            return Ok(None);
        }
        let replacement = tree.create_text(text);
        self.replace(&mut tree, replacement)?;
        Ok(Some(self.clone()))
    }

    /// Set an attribute; an empty value removes it
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<NodeHandle> {
        self.with_tree_mut(|tree| {
            if value.is_empty() {
                tree.remove_attribute(self.id, name);
            } else {
                tree.set_attribute(self.id, name, value);
            }
        })?;
        Ok(self.clone())
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attribute(&self, name: &str) -> Result<bool> {
        self.with_tree_mut(|tree| tree.remove_attribute(self.id, name))
    }

    fn remove(&self, tree: &mut Tree) {
        tree.detach(self.id);
        trace!(node = self.id, "removed node");
    }

    fn replace(&mut self, tree: &mut Tree, replacement: NodeId) -> Result<()> {
        if !tree.replace_child(replacement, self.id) {
            return Err(Error::UnsupportedOperation(
                "cannot replace a node that has no parent".to_string(),
            ));
        }
        trace!(old = self.id, new = replacement, "replaced node");
        self.id = replacement;
        Ok(())
    }

    /// Read a pseudo-property or, for any other name, an attribute.
    ///
    /// Pseudo-properties: `outertext`/`outerMarkup`, `innertext`/`innerMarkup`,
    /// `plaintext`/`text`, `tag` and `attr` (all attributes as markup).
    pub fn get(&self, name: &str) -> Option<String> {
        match name {
            "outertext" | "outerMarkup" => Some(self.outer_markup()),
            "innertext" | "innerMarkup" => Some(self.inner_markup()),
            "plaintext" | "text" => Some(self.text()),
            "tag" => self.tag(),
            "attr" => Some(self.attribute_markup()),
            _ => self.attribute(name),
        }
    }

    /// Write a pseudo-property or, for any other name, an attribute.
    ///
    /// `tag`, `plaintext` and `attr` are read-only.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "outertext" | "outerMarkup" => self.set_outer_markup(value).map(drop),
            "innertext" | "innerMarkup" => self.set_inner_markup(value).map(drop),
            "text" => self.set_text(value).map(drop),
            "tag" | "plaintext" | "attr" => Err(Error::UnsupportedOperation(format!(
                "`{}` is read-only",
                name
            ))),
            _ => self.set_attribute(name, value).map(drop),
        }
    }

    /// Nodes matching `selector` in this node's subtree, the node included
    pub fn find(&self, selector: &str) -> Result<NodeCollection> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        select_css(&cell, &self.translator, self.id, selector)
    }

    /// One node of `find(selector)`; negative indexes count from the end
    pub fn find_at(&self, selector: &str, index: isize) -> Result<Option<NodeHandle>> {
        Ok(self.find(selector)?.get(index).cloned())
    }

    /// Run a raw XPath query with this node as context
    pub fn find_xpath(&self, query: &str) -> Result<NodeCollection> {
        let cell = self.tree.upgrade().ok_or(Error::Detached)?;
        select(&cell, &self.translator, self.id, query)
    }

    /// First element in the subtree (the node included) whose `id` is `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.related(|tree| {
            subtree_elements(tree, self.id).find(|&node| tree.get_attribute(node, "id") == Some(id))
        })
    }

    /// First element in the subtree (the node included) named `name`
    pub fn get_element_by_tag_name(&self, name: &str) -> Option<NodeHandle> {
        self.related(|tree| {
            subtree_elements(tree, self.id)
                .find(|&node| tree.node_name(node).is_some_and(|n| n.eq_ignore_ascii_case(name)))
        })
    }

    pub fn get_elements_by_tag_name(&self, name: &str) -> NodeCollection {
        self.with_tree(|tree| {
            subtree_elements(tree, self.id)
                .filter(|&node| tree.node_name(node).is_some_and(|n| n.eq_ignore_ascii_case(name)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
        .into_iter()
        .map(|id| self.handle(id))
        .collect()
    }

    /// Standalone document holding a deep copy of this node
    pub fn get_dom(&self) -> Result<Document> {
        Document::from_node(self)
    }
}

fn parent_of(tree: &Tree, id: NodeId) -> Result<NodeId> {
    tree.get_node(id).and_then(|n| n.parent).ok_or_else(|| {
        Error::UnsupportedOperation("cannot replace a node that has no parent".to_string())
    })
}

/// Name of `id` when it is an element
fn element_name(tree: &Tree, id: NodeId) -> Option<String> {
    match tree.kind(id) {
        Some(NodeKind::Element) => tree.node_name(id).map(str::to_owned),
        _ => None,
    }
}

fn element_children(tree: &Tree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    tree.children(id)
        .filter(move |&child| tree.kind(child) == Some(NodeKind::Element))
}

fn subtree_elements(tree: &Tree, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::once(id)
        .chain(tree.descendants(id))
        .filter(move |&node| tree.kind(node) == Some(NodeKind::Element))
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for NodeHandle {}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_markup())
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("kind", &self.node_kind())
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(all(test, feature = "css"))]
mod tests {
    use super::*;

    fn doc(markup: &str) -> Document {
        Document::from_html(markup)
    }

    #[test]
    fn test_navigation() {
        let doc = doc("<ul><li>a</li>text<li>b</li><li>c</li></ul>");
        let ul = doc.find_at("ul", 0).unwrap().unwrap();
        assert!(ul.parent().is_none());
        assert_eq!(ul.first_child().unwrap().text(), "a");
        assert_eq!(ul.last_child().unwrap().text(), "c");
        assert_eq!(ul.child(1).unwrap().text(), "b");
        assert_eq!(ul.child(-1).unwrap().text(), "c");
        assert!(ul.child(3).is_none());
        assert_eq!(ul.children().len(), 3);
        assert_eq!(ul.child_nodes().len(), 4);

        let first = ul.first_child().unwrap();
        assert!(first.previous_sibling().is_none());
        assert_eq!(first.next_sibling().unwrap().node_kind(), Some(NodeKind::Text));
        assert_eq!(first.parent(), Some(ul.clone()));
        assert!(ul.last_child().unwrap().next_sibling().is_none());
    }

    #[test]
    fn test_reads() {
        let doc = doc("<p id=\"x\" class=\"y\">a <b>b</b></p>");
        let p = doc.find_at("p", 0).unwrap().unwrap();
        assert_eq!(p.tag().as_deref(), Some("p"));
        assert_eq!(p.attribute("id").as_deref(), Some("x"));
        assert!(p.has_attribute("class"));
        assert!(!p.has_attribute("title"));
        assert_eq!(
            p.all_attributes(),
            Some(vec![("id".to_string(), "x".to_string()), ("class".to_string(), "y".to_string())])
        );
        assert_eq!(p.text(), "a b");
        assert_eq!(p.inner_markup(), "a <b>b</b>");
        assert_eq!(p.outer_markup(), "<p id=\"x\" class=\"y\">a <b>b</b></p>");

        let b = p.find_at("b", 0).unwrap().unwrap();
        assert!(b.all_attributes().is_none());
    }

    #[test]
    fn test_outer_markup_two_roots_rejected() {
        let doc = doc("<div><p>foo</p></div>");
        let before = doc.serialize();
        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        assert!(matches!(p.set_outer_markup("foo<h1>bar</h1>"), Err(Error::InvalidFragment)));
        assert_eq!(doc.serialize(), before);
        assert_eq!(p.text(), "foo");
    }

    #[test]
    fn test_outer_markup_empty_removes() {
        let doc = doc("<div><p>foo</p><span>x</span></div>");
        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        assert!(p.set_outer_markup("").unwrap().is_none());
        assert_eq!(doc.serialize(), "<div><span>x</span></div>");
        assert!(p.parent().is_none());
    }

    #[test]
    fn test_outer_markup_replaces_and_repoints() {
        let doc = doc("<div><p>foo</p><span>x</span></div>");
        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        let replaced = p.set_outer_markup("<h1 class=\"t\">bar</h1>").unwrap().unwrap();
        assert_eq!(doc.serialize(), "<div><h1 class=\"t\">bar</h1><span>x</span></div>");
        assert_eq!(p.tag().as_deref(), Some("h1"));
        assert_eq!(replaced, p);
        assert_eq!(p.next_sibling().unwrap().tag().as_deref(), Some("span"));
    }

    #[test]
    fn test_inner_markup() {
        let doc = doc("<div><p>foo</p></div>");
        let mut div = doc.find_at("div", 0).unwrap().unwrap();
        div.set_inner_markup("<h1>bar</h1>").unwrap();
        assert_eq!(doc.serialize(), "<div><h1>bar</h1></div>");

        div.set_inner_markup("a<b>b</b>c").unwrap();
        assert_eq!(div.child_nodes().len(), 3);
        div.set_inner_markup("").unwrap();
        assert_eq!(doc.serialize(), "<div></div>");
    }

    #[test]
    fn test_malformed_fragments_in_tables() {
        let doc = doc("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
        let mut row = doc.find_at("tr", 0).unwrap().unwrap();
        row.set_outer_markup("<tr><td>c<br></td></tr>").unwrap().unwrap();
        assert_eq!(
            doc.serialize(),
            "<table><tr><td>c<br></td></tr><tr><td>b</td></tr></table>"
        );
        assert_eq!(row.tag().as_deref(), Some("tr"));

        row.set_inner_markup("<td>x&nbsp;</td><td>y</td>").unwrap();
        assert_eq!(row.children().len(), 2);

        let mut table = doc.find_at("table", 0).unwrap().unwrap();
        table.set_inner_markup("<tr><td>x&nbsp;</td></tr>").unwrap();
        assert_eq!(doc.serialize(), "<table><tr><td>x\u{a0}</td></tr></table>");
    }

    #[test]
    fn test_parentless_nodes_are_not_removed() {
        let doc = doc("<div><p>foo</p></div>");
        let mut document_node = doc.find_xpath_at("/", 0).unwrap().unwrap();
        assert!(matches!(document_node.set_outer_markup(""), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(document_node.set_text(""), Err(Error::UnsupportedOperation(_))));
        assert_eq!(doc.serialize(), "<div><p>foo</p></div>");

        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        assert!(p.set_outer_markup("").unwrap().is_none());
        assert!(matches!(p.set_outer_markup(""), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(p.set_text(""), Err(Error::UnsupportedOperation(_))));
        assert_eq!(doc.serialize(), "<div></div>");
    }

    #[test]
    fn test_set_text_escapes() {
        let doc = doc("<div><p>foo</p></div>");
        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        p.set_text("<h1>bar</h1>").unwrap();
        assert_eq!(doc.serialize(), "<div>&lt;h1&gt;bar&lt;/h1&gt;</div>");
        assert_eq!(p.text(), "<h1>bar</h1>");
        assert_eq!(p.node_kind(), Some(NodeKind::Text));

        let mut div = doc.find_at("div", 0).unwrap().unwrap();
        let mut text = div.first_child().unwrap();
        assert!(text.set_text("").unwrap().is_none());
        assert_eq!(div.inner_markup(), "");
        assert!(div.set_text("").unwrap().is_none());
        assert_eq!(doc.serialize(), "");
    }

    #[test]
    fn test_attributes() {
        let doc = doc("<div x=\"1\"></div>");
        let div = doc.find_at("div", 0).unwrap().unwrap();
        div.set_attribute("id", "bar").unwrap();
        assert_eq!(div.attribute("id").as_deref(), Some("bar"));
        div.set_attribute("x", "").unwrap();
        assert!(!div.has_attribute("x"));
        assert!(div.remove_attribute("id").unwrap());
        assert!(!div.remove_attribute("id").unwrap());
        assert!(div.all_attributes().is_none());
    }

    #[test]
    fn test_named_properties() {
        let doc = doc("<div><a href=\"/x\" title=\"t\">link</a></div>");
        let mut a = doc.find_at("a", 0).unwrap().unwrap();
        assert_eq!(a.get("href").as_deref(), Some("/x"));
        assert_eq!(a.get("tag").as_deref(), Some("a"));
        assert_eq!(a.get("plaintext").as_deref(), Some("link"));
        assert_eq!(a.get("innertext").as_deref(), Some("link"));
        assert_eq!(a.get("attr").as_deref(), Some("href=\"/x\" title=\"t\""));
        assert!(a.get("missing").is_none());

        a.set("title", "new").unwrap();
        assert_eq!(a.get("title").as_deref(), Some("new"));
        a.set("innerMarkup", "<b>bold</b>").unwrap();
        assert_eq!(a.get("outerMarkup").as_deref(), Some("<a href=\"/x\" title=\"new\"><b>bold</b></a>"));

        for read_only in ["tag", "plaintext", "attr"] {
            assert!(matches!(a.set(read_only, "x"), Err(Error::UnsupportedOperation(_))));
        }

        a.set("outertext", "<em>e</em>").unwrap();
        assert_eq!(doc.serialize(), "<div><em>e</em></div>");
    }

    #[test]
    fn test_detached_after_drop() {
        let doc = doc("<div><p>foo</p></div>");
        let mut p = doc.find_at("p", 0).unwrap().unwrap();
        drop(doc);
        assert!(p.is_detached());
        assert!(p.parent().is_none());
        assert!(p.tag().is_none());
        assert_eq!(p.text(), "");
        assert_eq!(p.outer_markup(), "");
        assert!(matches!(p.set_attribute("id", "x"), Err(Error::Detached)));
        assert!(matches!(p.set_outer_markup("<b/>"), Err(Error::Detached)));
        assert!(matches!(p.find("b"), Err(Error::Detached)));
    }

    #[test]
    fn test_find_includes_self() {
        let doc = doc("<div class=\"a\"><div class=\"b\"><span>s</span></div></div>");
        let inner = doc.find_at("div.b", 0).unwrap().unwrap();
        assert_eq!(inner.find("div").unwrap().len(), 1);
        assert_eq!(inner.find("span").unwrap().len(), 1);
        assert_eq!(inner.find_xpath("..").unwrap().first().and_then(|n| n.attribute("class")).as_deref(), Some("a"));
    }

    #[test]
    fn test_lookup_helpers() {
        let doc = doc("<div><p id=\"one\">1</p><P>2</P><p>3</p></div>");
        let root = doc.root().unwrap();
        assert_eq!(root.get_element_by_id("one").unwrap().text(), "1");
        assert!(root.get_element_by_id("two").is_none());
        assert_eq!(root.get_element_by_tag_name("p").unwrap().text(), "1");
        assert_eq!(root.get_elements_by_tag_name("p").len(), 3);
    }

    #[test]
    fn test_get_dom_copies() {
        let doc = doc("<div><p class=\"x\">foo</p></div>");
        let p = doc.find_at("p", 0).unwrap().unwrap();
        let copy = p.get_dom().unwrap();
        assert_eq!(copy.serialize(), "<p class=\"x\">foo</p>");
        copy.find_at("p", 0).unwrap().unwrap().set_attribute("class", "y").unwrap();
        assert_eq!(p.attribute("class").as_deref(), Some("x"));
    }
}
