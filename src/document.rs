//! Documents
//!
//! A `Document` owns one tree behind `Rc<RefCell<..>>`. Every load installs
//! a fresh tree cell, so handles taken from the previous content detach
//! instead of pointing into a different tree.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::collection::NodeCollection;
use crate::core::encoding::decode_to_string;
use crate::dom::builder::{self, collapse_inter_tag_whitespace};
use crate::dom::serializer::{inner_html, outer_html};
use crate::dom::{Tree, DOCUMENT_NODE};
use crate::element::NodeHandle;
use crate::error::{Error, Result};
use crate::options::LoadOptions;
use crate::query::{select, select_css};
use crate::selector::SelectorTranslator;

/// Hook run with the document right before it is serialized
pub type SerializeHook = Box<dyn Fn(&Document)>;

/// A parsed HTML document.
///
/// Node edits made through handles (`set_outer_markup`, `set_inner_markup`,
/// `set_text`) unlink the old nodes but never free them: the arena only
/// grows until the document is reloaded or dropped. Reload a long-lived
/// document from `serialize()` to compact it after heavy editing.
pub struct Document {
    tree: Rc<RefCell<Tree>>,
    options: LoadOptions,
    translator: Arc<SelectorTranslator>,
    callback: Option<SerializeHook>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document using the shared selector translator
    pub fn new() -> Self {
        Self::with_options(LoadOptions::default())
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Document {
            tree: Rc::new(RefCell::new(Tree::new())),
            options,
            translator: SelectorTranslator::shared(),
            callback: None,
        }
    }

    /// Use `translator` (and its caches) instead of the shared one
    pub fn with_translator(mut self, translator: Arc<SelectorTranslator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn from_html(html: &str) -> Self {
        let mut document = Self::new();
        document.load_text(html);
        document
    }

    /// Document holding a deep copy of `node` as its only top-level node
    pub fn from_node(node: &NodeHandle) -> Result<Self> {
        let source = node.upgrade().ok_or(Error::Detached)?;
        let source = source.borrow();

        let tree = if node.id() == DOCUMENT_NODE {
            source.clone()
        } else {
            let mut tree = Tree::new();
            let copy = tree
                .import_node(&source, node.id(), true)
                .ok_or_else(|| Error::UnsupportedOperation("node cannot be copied".to_string()))?;
            tree.append_child(DOCUMENT_NODE, copy);
            tree
        };

        let mut document = Self::new();
        document.tree = Rc::new(RefCell::new(tree));
        Ok(document)
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Replace the content with `html`.
    ///
    /// Never fails: markup the strict reader rejects goes through the
    /// HTML5 parser, which always produces a tree.
    pub fn load_text(&mut self, html: &str) -> &mut Self {
        let input = if self.options.collapse_whitespace {
            collapse_inter_tag_whitespace(html)
        } else {
            html.into()
        };
        let (tree, parser) = builder::parse(&input, self.options.strict_first);
        debug!(len = html.len(), ?parser, nodes = tree.node_count(), "loaded document");
        self.tree = Rc::new(RefCell::new(tree));
        self
    }

    /// Decode raw bytes (UTF-8 or UTF-16, BOM optional) and load them
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let text = decode_to_string(bytes).map_err(Error::InvalidArgument)?;
        Ok(self.load_text(&text))
    }

    /// Load a local file, or an `http(s)://` URI with the `remote` feature
    pub fn load_file(&mut self, path: &str) -> Result<&mut Self> {
        if path.is_empty() {
            return Err(Error::InvalidArgument("file path is empty".to_string()));
        }
        let bytes = if is_remote(path) {
            fetch_remote(path)?
        } else {
            read_local(path)?
        };
        self.load_bytes(&bytes)
    }

    /// Nodes matching a CSS selector, in document order
    pub fn find(&self, selector: &str) -> Result<NodeCollection> {
        select_css(&self.tree, &self.translator, DOCUMENT_NODE, selector)
    }

    /// One node of `find(selector)`; negative indexes count from the end
    pub fn find_at(&self, selector: &str, index: isize) -> Result<Option<NodeHandle>> {
        Ok(self.find(selector)?.get(index).cloned())
    }

    /// Nodes selected by an XPath query evaluated from the document node
    pub fn find_xpath(&self, query: &str) -> Result<NodeCollection> {
        select(&self.tree, &self.translator, DOCUMENT_NODE, query)
    }

    pub fn find_xpath_at(&self, query: &str, index: isize) -> Result<Option<NodeHandle>> {
        Ok(self.find_xpath(query)?.get(index).cloned())
    }

    /// The document element
    pub fn root(&self) -> Option<NodeHandle> {
        let root = self.tree.borrow().document_element()?;
        Some(NodeHandle::new(
            Rc::downgrade(&self.tree),
            root,
            Arc::clone(&self.translator),
        ))
    }

    /// Markup of the whole document, trimmed. Runs the hook first.
    pub fn serialize(&self) -> String {
        if let Some(callback) = &self.callback {
            callback(self);
        }
        let tree = self.tree.borrow();
        inner_html(&tree, DOCUMENT_NODE).trim().to_string()
    }

    pub fn outer_markup(&self) -> String {
        self.serialize()
    }

    /// Each child of the document element rendered and trimmed on its own
    pub fn inner_markup(&self) -> String {
        let tree = self.tree.borrow();
        let Some(root) = tree.document_element() else {
            return String::new();
        };
        tree.children(root)
            .map(|child| outer_html(&tree, child).trim().to_string())
            .collect()
    }

    /// Text content of the whole document
    pub fn text(&self) -> String {
        self.tree.borrow().text_content(DOCUMENT_NODE)
    }

    /// `inner_markup()`, also written to `path` when one is given
    pub fn save(&self, path: Option<&Path>) -> Result<String> {
        let markup = self.inner_markup();
        if let Some(path) = path {
            std::fs::write(path, &markup).map_err(|e| Error::io(path.display().to_string(), e))?;
        }
        Ok(markup)
    }

    pub fn set_callback(&mut self, callback: impl Fn(&Document) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.borrow().node_count())
            .field("options", &self.options)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

fn is_remote(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn read_local(path: &str) -> Result<Vec<u8>> {
    if !Path::new(path).exists() {
        return Err(Error::NotFound(path.to_string()));
    }
    std::fs::read(path).map_err(|e| {
        warn!(path, error = %e, "could not read file");
        Error::io(path, e)
    })
}

#[cfg(feature = "remote")]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let fail = |e: reqwest::Error| {
        warn!(url, error = %e, "remote load failed");
        Error::io(url, std::io::Error::other(e))
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(fail)?;
    let body = response.bytes().map_err(fail)?;
    debug!(url, len = body.len(), "fetched remote document");
    Ok(body.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    warn!(url, "remote loading is disabled");
    Err(Error::io(
        url,
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "loading http(s) URIs needs the `remote` feature",
        ),
    ))
}
