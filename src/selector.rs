//! Selector translation
//!
//! `SelectorTranslator` turns a CSS selector into an XPath query string:
//! cache lookup, conversion through a pluggable `SelectorConverter`, then a
//! rewrite of bare `text` / `comment` node tests into `text()` /
//! `comment()` so those selectors reach text and comment nodes.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, OnceLock};

use lru::LruCache;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::xpath::cache::{ExprCache, DEFAULT_CAPACITY};
use crate::xpath::CompiledExpr;

/// Converts a CSS selector into an XPath query
pub trait SelectorConverter: Send + Sync {
    /// `html` lower-cases element and attribute names and enables the
    /// HTML-only pseudo-classes
    fn convert(&self, selector: &str, html: bool) -> std::result::Result<String, String>;
}

/// Caching selector-to-query translator, shareable across documents
pub struct SelectorTranslator {
    converter: Option<Box<dyn SelectorConverter>>,
    html: bool,
    cache: Mutex<LruCache<String, Arc<str>>>,
    compiled: ExprCache,
}

static SHARED: OnceLock<Arc<SelectorTranslator>> = OnceLock::new();

impl SelectorTranslator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Translator with the default converter and room for
    /// `compiled_capacity` compiled queries
    pub fn with_capacity(compiled_capacity: usize) -> Self {
        SelectorTranslator {
            converter: default_converter(),
            html: true,
            cache: Mutex::new(LruCache::unbounded()),
            compiled: ExprCache::new(compiled_capacity),
        }
    }

    pub fn with_converter(converter: Box<dyn SelectorConverter>) -> Self {
        SelectorTranslator {
            converter: Some(converter),
            ..Self::new()
        }
    }

    /// The process-wide translator used by documents that were not given one
    pub fn shared() -> Arc<SelectorTranslator> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(SelectorTranslator::new())))
    }

    /// Translate a selector into a query string.
    ///
    /// Repeated selectors are served from the cache without consulting
    /// the converter. Conversion failures are not cached.
    pub fn translate(&self, selector: &str) -> Result<Arc<str>> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(selector) {
            trace!(selector, "selector cache hit");
            return Ok(Arc::clone(hit));
        }

        let converter = self.converter.as_deref().ok_or_else(|| {
            Error::Configuration(
                "CSS selectors need the `css` feature; use Document::find_xpath for raw queries"
                    .to_string(),
            )
        })?;
        let raw = converter
            .convert(selector, self.html)
            .map_err(|reason| Error::InvalidSelector {
                selector: selector.to_string(),
                reason,
            })?;
        let query: Arc<str> = Arc::from(rewrite_node_tests(&raw));
        debug!(selector, query = %query, "translated selector");

        cache.put(selector.to_string(), Arc::clone(&query));
        Ok(query)
    }

    /// Compiled program for a query, from the bounded compiled cache
    pub fn compile(&self, query: &str) -> Result<Arc<CompiledExpr>> {
        self.compiled
            .get_or_compile(query)
            .map_err(|reason| Error::Query {
                query: query.to_string(),
                reason,
            })
    }

    /// Number of cached selector translations
    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for SelectorTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "css")]
fn default_converter() -> Option<Box<dyn SelectorConverter>> {
    Some(Box::new(crate::css::CssConverter))
}

#[cfg(not(feature = "css"))]
fn default_converter() -> Option<Box<dyn SelectorConverter>> {
    None
}

/// Rewrite bare `text` / `comment` node tests to `text()` / `comment()`.
///
/// Only whole names in node-test position are touched: right after `/`,
/// an axis `::`, or a namespace `:`. Predicates, quoted literals,
/// attribute steps and names already followed by `(` are left alone.
pub fn rewrite_node_tests(query: &str) -> Cow<'_, str> {
    let bytes = query.as_bytes();
    let mut result: Option<String> = None;
    let mut copied = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' => quote = Some(b),
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            _ if is_name_byte(b) => {
                let start = i;
                while i < bytes.len() && is_name_byte(bytes[i]) {
                    i += 1;
                }
                let word = &query[start..i];
                if depth == 0
                    && (word == "text" || word == "comment")
                    && bytes.get(i) != Some(&b'(')
                    && at_node_test(bytes, start)
                {
                    let out = result.get_or_insert_with(|| String::with_capacity(query.len() + 4));
                    out.push_str(&query[copied..i]);
                    out.push_str("()");
                    copied = i;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    match result {
        Some(mut out) => {
            out.push_str(&query[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(query),
    }
}

/// Name characters of a query; `:` is a separator here
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') || b >= 0x80
}

/// Whether the name starting at `start` sits in node-test position
fn at_node_test(bytes: &[u8], start: usize) -> bool {
    let Some(prev) = start.checked_sub(1) else {
        return false;
    };
    match bytes[prev] {
        b'/' => true,
        b':' if prev > 0 && bytes[prev - 1] == b':' => {
            let axis_end = prev - 1;
            let axis_start = name_start(bytes, axis_end);
            &bytes[axis_start..axis_end] != b"attribute"
        }
        b':' => {
            let prefix_start = name_start(bytes, prev);
            prefix_start == 0 || bytes[prefix_start - 1] != b'@'
        }
        _ => false,
    }
}

/// Start of the name that ends right before `end`
fn name_start(bytes: &[u8], end: usize) -> usize {
    let mut p = end;
    while p > 0 && is_name_byte(bytes[p - 1]) {
        p -= 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConverter(Arc<AtomicUsize>);

    impl SelectorConverter for CountingConverter {
        fn convert(&self, selector: &str, _html: bool) -> std::result::Result<String, String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            if selector.is_empty() {
                return Err("empty selector".to_string());
            }
            Ok(format!("descendant-or-self::{}", selector))
        }
    }

    #[test]
    fn test_rewrite_positions() {
        assert_eq!(rewrite_node_tests("descendant-or-self::text"), "descendant-or-self::text()");
        assert_eq!(
            rewrite_node_tests("descendant-or-self::div/descendant-or-self::*/comment"),
            "descendant-or-self::div/descendant-or-self::*/comment()"
        );
        assert_eq!(rewrite_node_tests("descendant-or-self::div:text"), "descendant-or-self::div:text()");
        assert_eq!(
            rewrite_node_tests("descendant-or-self::div | descendant-or-self::text"),
            "descendant-or-self::div | descendant-or-self::text()"
        );
    }

    #[test]
    fn test_rewrite_leaves_others_alone() {
        for query in [
            "descendant-or-self::text()",
            "descendant-or-self::textarea",
            "descendant-or-self::text-block",
            "descendant-or-self::foo[@text]",
            "descendant-or-self::div[@foo:text]",
            "descendant-or-self::*[@class and contains(@class, 'text')]",
            "descendant-or-self::*[name() = \"comment\"]",
            "descendant-or-self::div/@text",
            "descendant-or-self::div/@foo:text",
            "descendant-or-self::div/attribute::text",
            "'/text'",
        ] {
            assert!(matches!(rewrite_node_tests(query), Cow::Borrowed(_)), "{}", query);
        }
    }

    #[test]
    fn test_translation_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let translator = SelectorTranslator::with_converter(Box::new(CountingConverter(Arc::clone(&calls))));
        let first = translator.translate("div").unwrap();
        let second = translator.translate("div").unwrap();
        assert_eq!(&*first, "descendant-or-self::div");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.cached_len(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let translator = Arc::new(SelectorTranslator::with_converter(Box::new(CountingConverter(
            Arc::clone(&calls),
        ))));

        let queries: Vec<Arc<str>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let translator = Arc::clone(&translator);
                    scope.spawn(move || translator.translate("li").unwrap())
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(queries.iter().all(|q| &**q == "descendant-or-self::li"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(translator.cached_len(), 1);
        assert!(translator.compile(&queries[0]).is_ok());
    }

    #[test]
    fn test_converter_errors_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let translator = SelectorTranslator::with_converter(Box::new(CountingConverter(Arc::clone(&calls))));
        assert!(matches!(translator.translate(""), Err(Error::InvalidSelector { .. })));
        assert!(translator.translate("").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(translator.cached_len(), 0);
    }

    #[test]
    fn test_compile_errors_are_query_errors() {
        let translator = SelectorTranslator::new();
        assert!(translator.compile("descendant-or-self::div").is_ok());
        assert!(matches!(
            translator.compile("descendant-or-self::div:text()"),
            Err(Error::Query { .. })
        ));
    }

    #[cfg(feature = "css")]
    #[test]
    fn test_pseudo_node_selectors() {
        let translator = SelectorTranslator::new();
        for selector in [
            "text", "div text", "div span, text", "div|text", "div>text", "div > text", "div,text",
            "div, text",
        ] {
            assert!(translator.translate(selector).unwrap().contains("text()"), "{}", selector);
            let comment = selector.replace("text", "comment");
            assert!(translator.translate(&comment).unwrap().contains("comment()"), "{}", comment);
        }
        for selector in [
            ".text", "#text", "foo[text]", "div[foo|text]", "div[text|foo]", "div[class*=text]",
            "div[class*=\"text\"]",
        ] {
            assert!(!translator.translate(selector).unwrap().contains("text()"), "{}", selector);
            let comment = selector.replace("text", "comment");
            assert!(!translator.translate(&comment).unwrap().contains("comment()"), "{}", comment);
        }
    }

    #[cfg(not(feature = "css"))]
    #[test]
    fn test_missing_converter() {
        let translator = SelectorTranslator::new();
        assert!(matches!(translator.translate("div"), Err(Error::Configuration(_))));
    }
}
