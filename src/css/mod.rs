//! CSS selector to XPath conversion
//!
//! Supports type, universal, class, id and attribute selectors (all
//! operators including `!=`), namespace prefixes (`ns|el`), the four
//! combinators, selector groups, structural pseudo-classes (`:first-child`,
//! `:nth-child(an+b)`, `:not()`, `:empty`, `:root`, `:contains()`,
//! `:lang()` ...) and, in HTML mode, `:checked`, `:link`, `:disabled`,
//! `:enabled`, `:selected`. Pseudo-elements are rejected.

pub mod lexer;
pub mod parser;
pub mod xpath;

use crate::selector::SelectorConverter;

/// Prefix of every translated path: match anywhere below the context node,
/// the context included
pub const DESCENDANT_OR_SELF: &str = "descendant-or-self::";

/// The default `SelectorConverter`
#[derive(Debug, Default, Clone, Copy)]
pub struct CssConverter;

impl SelectorConverter for CssConverter {
    fn convert(&self, selector: &str, html: bool) -> Result<String, String> {
        let group = parser::parse(selector)?;
        xpath::Translator { html }.translate_group(&group, DESCENDANT_OR_SELF)
    }
}

/// Convert a selector in HTML mode
pub fn to_xpath(selector: &str) -> Result<String, String> {
    CssConverter.convert(selector, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_mode_lowercases() {
        assert_eq!(to_xpath("A[HREF]").unwrap(), "descendant-or-self::a[@href]");
        assert_eq!(
            CssConverter.convert("A[HREF]", false).unwrap(),
            "descendant-or-self::A[@HREF]"
        );
    }

    #[test]
    fn test_html_pseudo_classes_need_html_mode() {
        assert!(CssConverter.convert("input:checked", true).is_ok());
        assert!(CssConverter.convert("input:checked", false).is_err());
    }

    #[test]
    fn test_translations_compile() {
        for selector in [
            "div#main > ul.nav li:nth-child(odd) a[href^='http']",
            "input:enabled, option:selected, a:link, :disabled",
            "p:contains(\"it's\"), p:lang(en), :root, td:empty",
            "li:nth-last-child(-n+2) ~ li:only-child",
            "h2 + p:not([hidden])",
        ] {
            let query = to_xpath(selector).unwrap();
            assert!(crate::xpath::compile(&query).is_ok(), "{} -> {}", selector, query);
        }
    }
}
