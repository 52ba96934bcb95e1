//! Ordered node collections
//!
//! A `NodeCollection` is what every query returns. Members keep discovery
//! order and may repeat. A collection parsed from a fragment holds on to
//! its backing tree, so its members stay usable for as long as it lives.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::dom::builder::{self, collapse_inter_tag_whitespace};
use crate::dom::{NodeId, Tree, DOCUMENT_NODE};
use crate::element::NodeHandle;
use crate::error::Result;
use crate::query::resolve_index;
use crate::selector::SelectorTranslator;

/// Synthetic element wrapped around fragments for the strict parse
pub(crate) const FRAGMENT_CONTAINER: &str = "simplehtmldom-fragment";

/// Contexts whose content model makes html5ever insert `tbody` or `tr`
/// around rows and cells. Those fragments parse under `template` instead.
const TABLE_CONTEXTS: [&str; 5] = ["table", "thead", "tbody", "tfoot", "tr"];

/// A parsed fragment: its own tree plus the top-level nodes, in order
pub(crate) struct Fragment {
    pub tree: Tree,
    pub roots: Vec<NodeId>,
}

/// Parse markup that may hold zero, one or many top-level nodes.
///
/// Well-formed markup goes through the strict reader. Anything else is
/// parsed by html5ever as the content of `context` (the element the nodes
/// will end up in), or of a `template` element when there is none.
/// Whitespace-only input yields no roots.
pub(crate) fn parse_fragment(fragment: &str, context: Option<&str>) -> Fragment {
    let open = format!("<{}>", FRAGMENT_CONTAINER);
    let close = format!("</{}>", FRAGMENT_CONTAINER);
    let wrapped = format!("{}{}{}", open, fragment, close);
    let input = collapse_inter_tag_whitespace(&wrapped);

    let (tree, roots) = match builder::build_strict(&input) {
        Ok(tree) => {
            let roots: Vec<NodeId> = tree
                .document_element()
                .map(|container| tree.children(container).collect())
                .unwrap_or_default();
            (tree, roots)
        }
        Err(err) => {
            let context = lenient_context(context);
            debug!(error = %err, context = %context, "strict fragment parse failed, retrying lenient");
            let inner = &input[open.len()..input.len() - close.len()];
            let tree = builder::build_fragment_lenient(inner, &context);
            let roots = tree.children(DOCUMENT_NODE).collect();
            (tree, roots)
        }
    };
    trace!(roots = roots.len(), "parsed fragment");

    Fragment { tree, roots }
}

fn lenient_context(context: Option<&str>) -> String {
    match context {
        Some(name) if !TABLE_CONTEXTS.iter().any(|t| name.eq_ignore_ascii_case(t)) => {
            name.to_ascii_lowercase()
        }
        _ => "template".to_string(),
    }
}

/// Ordered sequence of node handles
#[derive(Clone, Default)]
pub struct NodeCollection {
    nodes: Vec<NodeHandle>,
    backing: Option<Rc<RefCell<Tree>>>,
}

impl NodeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fragment and collect its top-level nodes.
    ///
    /// The nodes live in a private tree owned by the returned collection.
    pub fn from_string(fragment: &str) -> NodeCollection {
        let Fragment { tree, roots } = parse_fragment(fragment, None);
        let cell = Rc::new(RefCell::new(tree));
        let translator = SelectorTranslator::shared();
        let weak = Rc::downgrade(&cell);
        NodeCollection {
            nodes: roots
                .into_iter()
                .map(|id| NodeHandle::new(weak.clone(), id, translator.clone()))
                .collect(),
            backing: Some(cell),
        }
    }

    /// Query every member and concatenate the results, member by member
    pub fn find(&self, selector: &str) -> Result<NodeCollection> {
        let mut found = NodeCollection {
            nodes: Vec::new(),
            backing: self.backing.clone(),
        };
        for node in &self.nodes {
            found.nodes.extend(node.find(selector)?);
        }
        Ok(found)
    }

    /// One node of `find(selector)`; negative indexes count from the end
    pub fn find_at(&self, selector: &str, index: isize) -> Result<Option<NodeHandle>> {
        Ok(self.find(selector)?.get(index).cloned())
    }

    /// Concatenated text of all members
    pub fn text(&self) -> String {
        self.nodes.iter().map(NodeHandle::text).collect()
    }

    /// Concatenated markup of the members themselves, not their children
    pub fn inner_markup(&self) -> String {
        self.outer_markup()
    }

    pub fn outer_markup(&self) -> String {
        self.nodes.iter().map(NodeHandle::outer_markup).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Member at `index`; negative indexes count from the end
    pub fn get(&self, index: isize) -> Option<&NodeHandle> {
        resolve_index(self.nodes.len(), index).map(|i| &self.nodes[i])
    }

    pub fn first(&self) -> Option<&NodeHandle> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&NodeHandle> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeHandle> {
        self.nodes.iter()
    }

    pub fn push(&mut self, node: NodeHandle) {
        self.nodes.push(node);
    }
}

impl FromIterator<NodeHandle> for NodeCollection {
    fn from_iter<I: IntoIterator<Item = NodeHandle>>(iter: I) -> Self {
        NodeCollection {
            nodes: iter.into_iter().collect(),
            backing: None,
        }
    }
}

impl Extend<NodeHandle> for NodeCollection {
    fn extend<I: IntoIterator<Item = NodeHandle>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl IntoIterator for NodeCollection {
    type Item = NodeHandle;
    type IntoIter = std::vec::IntoIter<NodeHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeCollection {
    type Item = &'a NodeHandle;
    type IntoIter = std::slice::Iter<'a, NodeHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner_markup())
    }
}

impl fmt::Debug for NodeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.nodes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::serializer::outer_html;

    #[test]
    fn test_fragment_roots() {
        assert_eq!(parse_fragment("", None).roots.len(), 0);
        assert_eq!(parse_fragment("  \n ", None).roots.len(), 0);
        assert_eq!(parse_fragment("<p>a</p>", None).roots.len(), 1);
        assert_eq!(parse_fragment("foo<h1>bar</h1>", None).roots.len(), 2);
        assert_eq!(parse_fragment("<p>a</p> <p>b</p>", None).roots.len(), 2);
    }

    #[test]
    fn test_malformed_fragment_falls_back() {
        let fragment = parse_fragment("<p>a &nbsp; <br> b", None);
        assert_eq!(fragment.roots.len(), 1);
        let p = fragment.roots[0];
        assert_eq!(fragment.tree.node_name(p), Some("p"));
    }

    #[test]
    fn test_malformed_table_fragment_keeps_rows() {
        for context in [None, Some("table"), Some("TBODY")] {
            let fragment = parse_fragment("<tr><td>c<br></td></tr>", context);
            assert_eq!(fragment.roots.len(), 1, "{:?}", context);
            assert_eq!(
                outer_html(&fragment.tree, fragment.roots[0]),
                "<tr><td>c<br></td></tr>"
            );
        }

        let cells = parse_fragment("<td>a</td><td>b&nbsp;</td>", Some("tr"));
        assert_eq!(cells.roots.len(), 2);

        let in_div = parse_fragment("<tr><td>c<br></td></tr>", Some("div"));
        assert_eq!(outer_html(&in_div.tree, DOCUMENT_NODE), "c<br>");
    }

    #[test]
    fn test_from_string_keeps_members_alive() {
        let nodes = NodeCollection::from_string("<b>one</b><i>two</i>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.text(), "onetwo");
        assert_eq!(nodes.inner_markup(), "<b>one</b><i>two</i>");
        assert_eq!(nodes.to_string(), nodes.outer_markup());
        assert!(nodes.iter().all(|n| !n.is_detached()));
    }

    #[test]
    fn test_from_string_table_rows() {
        let rows = NodeCollection::from_string("<tr><td>c<br></td></tr>");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.outer_markup(), "<tr><td>c<br></td></tr>");
    }

    #[test]
    fn test_indexing() {
        let nodes = NodeCollection::from_string("<a></a><b></b><c></c>");
        assert_eq!(nodes.get(0).and_then(|n| n.tag()).as_deref(), Some("a"));
        assert_eq!(nodes.get(-1).and_then(|n| n.tag()).as_deref(), Some("c"));
        assert_eq!(nodes.get(-3).and_then(|n| n.tag()).as_deref(), Some("a"));
        assert!(nodes.get(3).is_none());
        assert!(nodes.get(-4).is_none());
        assert_eq!(nodes.first(), nodes.get(0));
        assert_eq!(nodes.last(), nodes.get(2));
    }

    #[cfg(feature = "css")]
    #[test]
    fn test_find_flattens_members() {
        let nodes = NodeCollection::from_string("<ul><li>1</li><li>2</li></ul><ul><li>3</li></ul>");
        let items = nodes.find("li").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items.text(), "123");
        assert_eq!(nodes.find_at("li", -1).unwrap().map(|n| n.text()).as_deref(), Some("3"));
        assert!(nodes.find_at("li", 5).unwrap().is_none());
        assert!(nodes.find("table").unwrap().is_empty());
    }

    #[test]
    fn test_push_and_collect() {
        let source = NodeCollection::from_string("<a></a><b></b>");
        let mut collected: NodeCollection = source.iter().rev().cloned().collect();
        assert_eq!(collected.text(), "");
        collected.push(source.get(0).cloned().unwrap());
        assert_eq!(collected.outer_markup(), "<b></b><a></a><a></a>");
    }
}
