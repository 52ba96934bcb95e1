//! simplehtmldom - jQuery-style HTML querying
//!
//! Load markup, select nodes with CSS selectors (or raw XPath), read them
//! and rewrite them in place.
//!
//! ```no_run
//! use simplehtmldom::str_get_html;
//!
//! let doc = str_get_html("<ul><li>a</li><li class=\"on\">b</li></ul>");
//! let mut active = doc.find_at("li.on", 0)?.expect("one active item");
//! active.set_inner_markup("<b>B</b>")?;
//! assert_eq!(doc.serialize(), "<ul><li>a</li><li class=\"on\"><b>B</b></li></ul>");
//! # Ok::<(), simplehtmldom::Error>(())
//! ```
//!
//! Layers, bottom up:
//! - `dom`: arena tree, strict and lenient builders, serializer
//! - `xpath`: XPath 1.0 engine over the arena, with a compiled-expression cache
//! - `css`: CSS selector to XPath conversion (`css` feature)
//! - `SelectorTranslator`: cached selector translation shared by documents
//! - `Document`, `NodeHandle`, `NodeCollection`: the query facade

mod core;
mod reader;

pub mod collection;
#[cfg(feature = "css")]
pub mod css;
pub mod document;
pub mod dom;
pub mod element;
pub mod error;
pub mod options;
mod query;
pub mod selector;
pub mod xpath;

pub use collection::NodeCollection;
pub use document::{Document, SerializeHook};
pub use dom::NodeKind;
pub use element::NodeHandle;
pub use error::{Error, Result};
pub use options::LoadOptions;
pub use selector::{SelectorConverter, SelectorTranslator};

// ============================================================================
// Loader shortcuts
// ============================================================================

/// Document loaded from a string
pub fn str_get_html(html: &str) -> Document {
    Document::from_html(html)
}

/// Document loaded from a file path (or an `http(s)://` URI with the
/// `remote` feature)
pub fn file_get_html(path: &str) -> Result<Document> {
    let mut document = Document::new();
    document.load_file(path)?;
    Ok(document)
}
