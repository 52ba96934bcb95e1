//! Selector tree to XPath translation
//!
//! Each selector becomes a `descendant-or-self::` path. Simple selectors
//! add conditions to the current step; combinators join steps. Positional
//! pseudo-classes rewrite the step to `*/name` so `position()` counts
//! siblings rather than matches.

use std::fmt;

use super::lexer::Token;
use super::parser::{AttributeOp, Combinator, ParsedSelector, Selector};

/// One location step under construction
#[derive(Debug, Clone)]
struct XPathExpr {
    path: String,
    element: String,
    condition: String,
}

impl XPathExpr {
    fn new(element: String) -> Self {
        XPathExpr {
            path: String::new(),
            element,
            condition: String::new(),
        }
    }

    fn add_condition(&mut self, condition: &str) -> &mut Self {
        self.condition = if self.condition.is_empty() {
            condition.to_string()
        } else {
            format!("({}) and ({})", self.condition, condition)
        };
        self
    }

    /// Move the element name into the condition, leaving `*`
    fn add_name_test(&mut self) -> &mut Self {
        if self.element != "*" {
            let test = format!("name() = {}", literal(&self.element));
            self.add_condition(&test);
            self.element = "*".to_string();
        }
        self
    }

    fn add_star_prefix(&mut self) -> &mut Self {
        self.path.push_str("*/");
        self
    }

    fn join(&mut self, combiner: &str, other: XPathExpr) -> &mut Self {
        let mut path = self.to_string();
        path.push_str(combiner);
        if other.path != "*/" {
            path.push_str(&other.path);
        }
        self.path = path;
        self.element = other.element;
        self.condition = other.condition;
        self
    }
}

impl fmt::Display for XPathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.element)?;
        if !self.condition.is_empty() {
            write!(f, "[{}]", self.condition)?;
        }
        Ok(())
    }
}

/// Quote a string as an XPath literal
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Names usable as a bare XPath name test
fn is_safe_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Translator configuration
pub struct Translator {
    /// Lower-case element and attribute names, enable HTML pseudo-classes
    pub html: bool,
}

impl Translator {
    /// Translate a parsed group, joining the alternatives with ` | `
    pub fn translate_group(&self, group: &[ParsedSelector], prefix: &str) -> Result<String, String> {
        let paths = group
            .iter()
            .map(|selector| {
                if let Some(pseudo) = &selector.pseudo_element {
                    return Err(format!("Pseudo-elements are not supported: ::{}", pseudo));
                }
                Ok(format!("{}{}", prefix, self.node_to_xpath(&selector.tree)?))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(paths.join(" | "))
    }

    fn node_to_xpath(&self, node: &Selector) -> Result<XPathExpr, String> {
        match node {
            Selector::Element { namespace, element } => {
                Ok(self.translate_element(namespace.as_deref(), element.as_deref()))
            }
            Selector::Class(inner, class) => {
                let mut xpath = self.node_to_xpath(inner)?;
                add_includes(&mut xpath, "@class", class);
                Ok(xpath)
            }
            Selector::Hash(inner, id) => {
                let mut xpath = self.node_to_xpath(inner)?;
                xpath.add_condition(&format!("@id = {}", literal(id)));
                Ok(xpath)
            }
            Selector::Attribute {
                selector,
                namespace,
                name,
                operator,
                value,
            } => {
                let mut xpath = self.node_to_xpath(selector)?;
                self.translate_attribute(&mut xpath, namespace.as_deref(), name, *operator, value)?;
                Ok(xpath)
            }
            Selector::Pseudo(inner, name) => {
                let mut xpath = self.node_to_xpath(inner)?;
                self.translate_pseudo(&mut xpath, name)?;
                Ok(xpath)
            }
            Selector::Function(inner, name, arguments) => {
                let mut xpath = self.node_to_xpath(inner)?;
                translate_function(&mut xpath, name, arguments)?;
                Ok(xpath)
            }
            Selector::Negation(inner, argument) => {
                let mut xpath = self.node_to_xpath(inner)?;
                let mut sub = self.node_to_xpath(argument)?;
                sub.add_name_test();
                if sub.condition.is_empty() {
                    xpath.add_condition("0");
                } else {
                    xpath.add_condition(&format!("not({})", sub.condition));
                }
                Ok(xpath)
            }
            Selector::Combined(left, combinator, right) => {
                let mut xpath = self.node_to_xpath(left)?;
                let right = self.node_to_xpath(right)?;
                match combinator {
                    Combinator::Descendant => xpath.join("/descendant-or-self::*/", right),
                    Combinator::Child => xpath.join("/", right),
                    Combinator::Adjacent => xpath
                        .join("/following-sibling::", right)
                        .add_name_test()
                        .add_condition("position() = 1"),
                    Combinator::Sibling => xpath.join("/following-sibling::", right),
                };
                Ok(xpath)
            }
        }
    }

    fn translate_element(&self, namespace: Option<&str>, element: Option<&str>) -> XPathExpr {
        let (mut element, mut safe) = match element {
            Some(name) => {
                let name = if self.html {
                    name.to_ascii_lowercase()
                } else {
                    name.to_string()
                };
                let safe = is_safe_name(&name);
                (name, safe)
            }
            None => ("*".to_string(), true),
        };
        if let Some(ns) = namespace {
            element = format!("{}:{}", ns, element);
            safe = safe && is_safe_name(ns);
        }
        let mut xpath = XPathExpr::new(element);
        if !safe {
            xpath.add_name_test();
        }
        xpath
    }

    fn translate_attribute(
        &self,
        xpath: &mut XPathExpr,
        namespace: Option<&str>,
        name: &str,
        operator: AttributeOp,
        value: &str,
    ) -> Result<(), String> {
        let mut safe = is_safe_name(name);
        let mut name = if self.html {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        if let Some(ns) = namespace {
            name = format!("{}:{}", ns, name);
            safe = safe && is_safe_name(ns);
        }
        if !safe {
            return Err(format!("Attribute name {:?} cannot be expressed as a query", name));
        }
        let attr = format!("@{}", name);
        let lit = literal(value);

        let condition = match operator {
            AttributeOp::Exists => attr,
            AttributeOp::Equals => format!("{} = {}", attr, lit),
            AttributeOp::Includes => {
                add_includes(xpath, &attr, value);
                return Ok(());
            }
            AttributeOp::DashMatch => format!(
                "{} = {} or starts-with({}, {})",
                attr,
                lit,
                attr,
                literal(&format!("{}-", value))
            ),
            AttributeOp::Prefix if value.is_empty() => "0".to_string(),
            AttributeOp::Prefix => format!("{} and starts-with({}, {})", attr, attr, lit),
            AttributeOp::Suffix if value.is_empty() => "0".to_string(),
            AttributeOp::Suffix => format!(
                "{} and substring({}, string-length({})-{}) = {}",
                attr,
                attr,
                attr,
                value.chars().count() - 1,
                lit
            ),
            AttributeOp::Substring if value.is_empty() => "0".to_string(),
            AttributeOp::Substring => format!("{} and contains({}, {})", attr, attr, lit),
            AttributeOp::NotEquals if value.is_empty() => format!("{} != {}", attr, lit),
            AttributeOp::NotEquals => format!("not({}) or {} != {}", attr, attr, lit),
        };
        xpath.add_condition(&condition);
        Ok(())
    }

    fn translate_pseudo(&self, xpath: &mut XPathExpr, name: &str) -> Result<(), String> {
        match name.to_ascii_lowercase().as_str() {
            "first-child" => {
                xpath.add_star_prefix().add_name_test().add_condition("position() = 1");
            }
            "last-child" => {
                xpath.add_star_prefix().add_name_test().add_condition("position() = last()");
            }
            "only-child" => {
                xpath.add_star_prefix().add_name_test().add_condition("last() = 1");
            }
            "first-of-type" => {
                require_element(xpath, "first-of-type")?;
                xpath.add_star_prefix().add_condition("position() = 1");
            }
            "last-of-type" => {
                require_element(xpath, "last-of-type")?;
                xpath.add_star_prefix().add_condition("position() = last()");
            }
            "only-of-type" => {
                require_element(xpath, "only-of-type")?;
                xpath.add_condition("last() = 1");
            }
            "empty" => {
                xpath.add_condition("not(*) and not(string-length())");
            }
            "root" => {
                xpath.add_condition("not(parent::*)");
            }
            other if self.html => {
                let condition = html_pseudo(other).ok_or_else(|| unsupported_pseudo(name))?;
                xpath.add_condition(condition);
            }
            _ => return Err(unsupported_pseudo(name)),
        }
        Ok(())
    }
}

fn unsupported_pseudo(name: &str) -> String {
    format!("The pseudo-class :{} is not supported", name)
}

fn require_element(xpath: &XPathExpr, pseudo: &str) -> Result<(), String> {
    if xpath.element == "*" {
        Err(format!("*:{} is not implemented", pseudo))
    } else {
        Ok(())
    }
}

/// Whitespace-separated word match, used by `.class` and `~=`
fn add_includes(xpath: &mut XPathExpr, attr: &str, value: &str) {
    if value.is_empty() || value.contains(char::is_whitespace) {
        xpath.add_condition("0");
        return;
    }
    xpath.add_condition(&format!(
        "{} and contains(concat(' ', normalize-space({}), ' '), {})",
        attr,
        attr,
        literal(&format!(" {} ", value))
    ));
}

/// Conditions for the HTML-only pseudo-classes
fn html_pseudo(name: &str) -> Option<&'static str> {
    let condition = match name {
        "checked" => {
            "(@selected and name(.) = 'option') or (@checked and (name(.) = 'input' or name(.) = 'command') and (@type = 'checkbox' or @type = 'radio'))"
        }
        "link" => "@href and (name(.) = 'a' or name(.) = 'link' or name(.) = 'area')",
        "disabled" => {
            "(@disabled and ((name(.) = 'input' and @type != 'hidden') or name(.) = 'button' or name(.) = 'select' or name(.) = 'textarea' or name(.) = 'command' or name(.) = 'fieldset' or name(.) = 'optgroup' or name(.) = 'option')) or (((name(.) = 'input' and @type != 'hidden') or name(.) = 'button' or name(.) = 'select' or name(.) = 'textarea') and ancestor::fieldset[@disabled])"
        }
        "enabled" => {
            "(@href and (name(.) = 'a' or name(.) = 'link' or name(.) = 'area')) or ((name(.) = 'command' or name(.) = 'fieldset' or name(.) = 'optgroup') and not(@disabled)) or (((name(.) = 'input' and @type != 'hidden') or name(.) = 'button' or name(.) = 'select' or name(.) = 'textarea' or name(.) = 'keygen') and not(@disabled or ancestor::fieldset[@disabled])) or (name(.) = 'option' and not(@disabled or ancestor::optgroup[@disabled]))"
        }
        "selected" => "(@selected and name(.) = 'option')",
        "invalid" | "hover" | "visited" => "0",
        _ => return None,
    };
    Some(condition)
}

fn translate_function(xpath: &mut XPathExpr, name: &str, arguments: &[Token]) -> Result<(), String> {
    match name.to_ascii_lowercase().as_str() {
        "nth-child" => nth_child(xpath, arguments, false, true),
        "nth-last-child" => nth_child(xpath, arguments, true, true),
        "nth-of-type" => {
            require_element(xpath, "nth-of-type")?;
            nth_child(xpath, arguments, false, false)
        }
        "nth-last-of-type" => {
            require_element(xpath, "nth-last-of-type")?;
            nth_child(xpath, arguments, true, false)
        }
        "contains" => {
            let value = single_text_argument(name, arguments)?;
            xpath.add_condition(&format!("contains(string(.), {})", literal(value)));
            Ok(())
        }
        "lang" => {
            let value = single_text_argument(name, arguments)?;
            xpath.add_condition(&format!("lang({})", literal(value)));
            Ok(())
        }
        _ => Err(format!("The pseudo-class :{}() is not supported", name)),
    }
}

fn single_text_argument<'t>(name: &str, arguments: &'t [Token]) -> Result<&'t str, String> {
    match arguments {
        [Token::Ident(value) | Token::Str(value)] => Ok(value),
        _ => Err(format!(":{}() expects a single string or identifier argument", name)),
    }
}

/// `an+b` position condition; `last` counts from the end
fn nth_child(xpath: &mut XPathExpr, arguments: &[Token], last: bool, name_test: bool) -> Result<(), String> {
    let (a, mut b) = parse_series(arguments)?;

    xpath.add_star_prefix();
    if name_test {
        xpath.add_name_test();
    }

    if a == 0 {
        let condition = if last {
            format!("position() = last() - {}", b - 1)
        } else {
            format!("position() = {}", b)
        };
        xpath.add_condition(&condition);
        return Ok(());
    }

    let sign = if a < 0 {
        if b < 1 {
            xpath.add_condition("false()");
            return Ok(());
        }
        "<="
    } else {
        ">="
    };

    let mut expr = "position()".to_string();
    if last {
        expr = format!("last() - {}", expr);
        b -= 1;
    }
    if b != 0 {
        expr = format!("{} - {}", expr, b);
    }

    let mut conditions = vec![format!("{} {} 0", expr, sign)];
    if a != 1 && a != -1 {
        conditions.push(format!("({}) mod {} = 0", expr, a));
    }
    xpath.add_condition(&conditions.join(" and "));
    Ok(())
}

/// Parse `odd`, `even`, `n`, `3`, `2n+1`, `-n+3` into `(a, b)`
pub fn parse_series(arguments: &[Token]) -> Result<(i64, i64), String> {
    let mut joined = String::new();
    for token in arguments {
        match token {
            Token::Ident(v) | Token::Number(v) => joined.push_str(v),
            Token::Delim(c) => joined.push(*c),
            Token::Str(_) => return Err("String tokens not allowed in series".to_string()),
            _ => {}
        }
    }
    let joined = joined.trim().to_ascii_lowercase();
    let int = |s: &str| {
        s.parse::<i64>()
            .map_err(|_| format!("Expected a number in series, got {:?}", s))
    };

    match joined.as_str() {
        "odd" => return Ok((2, 1)),
        "even" => return Ok((2, 0)),
        "n" => return Ok((1, 0)),
        _ => {}
    }

    let Some((first, rest)) = joined.split_once('n') else {
        return Ok((0, int(&joined)?));
    };
    let a = match first {
        "" | "+" => 1,
        "-" => -1,
        other => int(other)?,
    };
    let b = if rest.is_empty() { 0 } else { int(rest.trim_start_matches('+'))? };
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn html(selector: &str) -> String {
        let group = parse(selector).unwrap();
        Translator { html: true }
            .translate_group(&group, "descendant-or-self::")
            .unwrap()
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal("a"), "'a'");
        assert_eq!(literal("it's"), "\"it's\"");
        assert_eq!(literal("a'b\"c"), "concat('a', \"'\", 'b\"c')");
    }

    #[test]
    fn test_basic_selectors() {
        assert_eq!(html("div"), "descendant-or-self::div");
        assert_eq!(html("DIV"), "descendant-or-self::div");
        assert_eq!(html("*"), "descendant-or-self::*");
        assert_eq!(html("#main"), "descendant-or-self::*[@id = 'main']");
        assert_eq!(
            html(".text"),
            "descendant-or-self::*[@class and contains(concat(' ', normalize-space(@class), ' '), ' text ')]"
        );
        assert_eq!(html("foo[text]"), "descendant-or-self::foo[@text]");
        assert_eq!(html("div|text"), "descendant-or-self::div:text");
        assert_eq!(html("div[foo|text]"), "descendant-or-self::div[@foo:text]");
    }

    #[test]
    fn test_combinators() {
        assert_eq!(html("div text"), "descendant-or-self::div/descendant-or-self::*/text");
        assert_eq!(html("div > text"), "descendant-or-self::div/text");
        assert_eq!(
            html("h1 + p"),
            "descendant-or-self::h1/following-sibling::*[(name() = 'p') and (position() = 1)]"
        );
        assert_eq!(html("h1 ~ p"), "descendant-or-self::h1/following-sibling::p");
        assert_eq!(html("div, text"), "descendant-or-self::div | descendant-or-self::text");
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(
            html("a[href$='.pdf']"),
            "descendant-or-self::a[@href and substring(@href, string-length(@href)-3) = '.pdf']"
        );
        assert_eq!(
            html("a[lang|=en]"),
            "descendant-or-self::a[@lang = 'en' or starts-with(@lang, 'en-')]"
        );
        assert_eq!(html("a[href^='']"), "descendant-or-self::a[0]");
        assert_eq!(
            html("a[rel!=x]"),
            "descendant-or-self::a[not(@rel) or @rel != 'x']"
        );
        assert_eq!(
            html("div[class*=text]"),
            "descendant-or-self::div[@class and contains(@class, 'text')]"
        );
    }

    #[test]
    fn test_positional_pseudo_classes() {
        assert_eq!(
            html("li:first-child"),
            "descendant-or-self::*/*[(name() = 'li') and (position() = 1)]"
        );
        assert_eq!(
            html("li:nth-child(2n+1)"),
            "descendant-or-self::*/*[(name() = 'li') and (position() - 1 >= 0 and (position() - 1) mod 2 = 0)]"
        );
        assert_eq!(
            html("li:nth-child(3)"),
            "descendant-or-self::*/*[(name() = 'li') and (position() = 3)]"
        );
        assert_eq!(
            html("li:nth-last-of-type(1)"),
            "descendant-or-self::*/li[position() = last() - 0]"
        );
        assert_eq!(
            html("p:not(.x)"),
            "descendant-or-self::p[not(@class and contains(concat(' ', normalize-space(@class), ' '), ' x '))]"
        );
        assert_eq!(html("p:not(*)"), "descendant-or-self::p[0]");
    }

    #[test]
    fn test_series() {
        let series = |s: &str| parse_series(&super::super::lexer::Lexer::new(s).tokenize().unwrap());
        assert_eq!(series("odd"), Ok((2, 1)));
        assert_eq!(series("even"), Ok((2, 0)));
        assert_eq!(series("-n+3"), Ok((-1, 3)));
        assert_eq!(series("2n + 1"), Ok((2, 1)));
        assert_eq!(series("5"), Ok((0, 5)));
        assert!(series("'x'").is_err());
    }

    #[test]
    fn test_errors() {
        let translate = |s: &str| {
            let group = parse(s).unwrap();
            Translator { html: true }.translate_group(&group, "descendant-or-self::")
        };
        assert!(translate("p::before").is_err());
        assert!(translate("*:first-of-type").is_err());
        assert!(translate("p:unknown").is_err());
        assert!(translate("p:nth-child(x)").is_err());
    }
}
