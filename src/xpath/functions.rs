//! XPath 1.0 Functions
//!
//! Node Set Functions:
//! - position(), last(), count(), local-name(), namespace-uri(), name(), id()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()

use std::collections::HashSet;

use super::value::{parse_number, XPathValue};
use crate::dom::{self, DocumentAccess, NodeId, NodeKind};

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
    position: usize,
    size: usize,
) -> Result<XPathValue, String> {
    match name {
        // Node Set Functions
        "position" => no_args(name, &args).map(|_| XPathValue::Number(position as f64)),
        "last" => no_args(name, &args).map(|_| XPathValue::Number(size as f64)),
        "count" => fn_count(args),
        "local-name" => fn_node_name(name, args, context, |n| doc.node_local_name(n)),
        "namespace-uri" => fn_node_name(name, args, context, |_| None),
        "name" => fn_node_name(name, args, context, |n| doc.node_name(n)),
        "id" => fn_id(args, doc),

        // String Functions
        "string" => fn_string(args, doc, context),
        "concat" => fn_concat(args, doc),
        "starts-with" => string_pair(name, &args, doc).map(|(s, p)| s.starts_with(&p).into()),
        "contains" => string_pair(name, &args, doc).map(|(s, p)| s.contains(&p).into()),
        "substring" => fn_substring(args, doc),
        "substring-before" => string_pair(name, &args, doc).map(|(s, p)| {
            s.find(&p).map(|pos| s[..pos].to_string()).unwrap_or_default().into()
        }),
        "substring-after" => string_pair(name, &args, doc).map(|(s, p)| {
            s.find(&p)
                .map(|pos| s[pos + p.len()..].to_string())
                .unwrap_or_default()
                .into()
        }),
        "string-length" => {
            let s = optional_string(name, &args, doc, context)?;
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            let s = optional_string(name, &args, doc, context)?;
            Ok(XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => fn_translate(args, doc),

        // Boolean Functions
        "boolean" => single_arg(name, &args).map(|v| v.to_boolean().into()),
        "not" => single_arg(name, &args).map(|v| (!v.to_boolean()).into()),
        "true" => no_args(name, &args).map(|_| XPathValue::Boolean(true)),
        "false" => no_args(name, &args).map(|_| XPathValue::Boolean(false)),
        "lang" => fn_lang(args, doc, context),

        // Number Functions
        "number" => {
            let n = match args.as_slice() {
                [] => parse_number(&dom::node_string_value(doc, context)),
                [arg] => resolve_number(arg, doc),
                _ => return Err("number() requires 0 or 1 arguments".to_string()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => fn_sum(args, doc),
        "floor" => single_arg(name, &args).map(|v| resolve_number(v, doc).floor().into()),
        "ceiling" => single_arg(name, &args).map(|v| resolve_number(v, doc).ceil().into()),
        "round" => single_arg(name, &args).map(|v| xpath_round(resolve_number(v, doc)).into()),

        _ => Err(format!("Unknown function: {}", name)),
    }
}

fn no_args(name: &str, args: &[XPathValue]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{}() takes no arguments", name))
    }
}

fn single_arg<'v>(name: &str, args: &'v [XPathValue]) -> Result<&'v XPathValue, String> {
    match args {
        [arg] => Ok(arg),
        _ => Err(format!("{}() requires exactly 1 argument", name)),
    }
}

fn string_pair<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    doc: &D,
) -> Result<(String, String), String> {
    match args {
        [a, b] => Ok((resolve_string(a, doc), resolve_string(b, doc))),
        _ => Err(format!("{}() requires exactly 2 arguments", name)),
    }
}

/// The string argument, or the context node's string-value when omitted
fn optional_string<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    doc: &D,
    context: NodeId,
) -> Result<String, String> {
    match args {
        [] => Ok(dom::node_string_value(doc, context)),
        [arg] => Ok(resolve_string(arg, doc)),
        _ => Err(format!("{}() requires 0 or 1 arguments", name)),
    }
}

// Node Set Functions

fn fn_count(args: Vec<XPathValue>) -> Result<XPathValue, String> {
    match args.as_slice() {
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::Number(nodes.len() as f64)),
        [XPathValue::StringList(values)] => Ok(XPathValue::Number(values.len() as f64)),
        [_] => Err("count() argument must be a node-set".to_string()),
        _ => Err("count() requires exactly 1 argument".to_string()),
    }
}

/// Shared body of name(), local-name() and namespace-uri()
fn fn_node_name<'d, F>(
    name: &str,
    args: Vec<XPathValue>,
    context: NodeId,
    lookup: F,
) -> Result<XPathValue, String>
where
    F: Fn(NodeId) -> Option<&'d str>,
{
    let node = match args.as_slice() {
        [] => Some(context),
        [XPathValue::NodeSet(nodes)] => nodes.first().copied(),
        [XPathValue::StringList(_)] => None,
        [_] => return Err(format!("{}() argument must be a node-set", name)),
        _ => return Err(format!("{}() requires 0 or 1 arguments", name)),
    };
    let value = node.and_then(lookup).unwrap_or("");
    Ok(XPathValue::String(value.to_string()))
}

/// id(): elements whose `id` attribute is one of the whitespace-separated
/// tokens, in document order
fn fn_id<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    let arg = single_arg("id", &args)?;
    let tokens: Vec<String> = match arg {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|&n| dom::node_string_value(doc, n)).collect(),
        XPathValue::StringList(values) => values.clone(),
        other => vec![other.to_string_value()],
    };
    let wanted: HashSet<&str> = tokens.iter().flat_map(|t| t.split_whitespace()).collect();
    if wanted.is_empty() {
        return Ok(XPathValue::empty_nodeset());
    }

    let matches = doc
        .descendants_vec(doc.document_node_id())
        .into_iter()
        .filter(|&n| doc.node_kind_of(n) == Some(NodeKind::Element))
        .filter(|&n| doc.get_attribute(n, "id").is_some_and(|v| wanted.contains(v)))
        .collect();
    Ok(XPathValue::NodeSet(matches))
}

// String Functions

fn fn_string<D: DocumentAccess>(
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
) -> Result<XPathValue, String> {
    optional_string("string", &args, doc, context).map(XPathValue::String)
}

fn fn_concat<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() < 2 {
        return Err("concat() requires at least 2 arguments".to_string());
    }
    let result: String = args.iter().map(|a| resolve_string(a, doc)).collect();
    Ok(XPathValue::String(result))
}

/// substring(): characters at positions p with
/// round(start) <= p < round(start) + round(length), 1-based
fn fn_substring<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() < 2 || args.len() > 3 {
        return Err("substring() requires 2 or 3 arguments".to_string());
    }

    let s = resolve_string(&args[0], doc);
    let start = xpath_round(resolve_number(&args[1], doc));
    let end = match args.get(2) {
        Some(len) => start + xpath_round(resolve_number(len, doc)),
        None => f64::INFINITY,
    };

    let result: String = s
        .chars()
        .enumerate()
        .filter(|&(i, _)| {
            let pos = (i + 1) as f64;
            pos >= start && pos < end
        })
        .map(|(_, c)| c)
        .collect();

    Ok(XPathValue::String(result))
}

fn fn_translate<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    if args.len() != 3 {
        return Err("translate() requires exactly 3 arguments".to_string());
    }

    let s = resolve_string(&args[0], doc);
    let from: Vec<char> = resolve_string(&args[1], doc).chars().collect();
    let to: Vec<char> = resolve_string(&args[2], doc).chars().collect();

    let result: String = s
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();

    Ok(XPathValue::String(result))
}

// Boolean Functions

/// lang(): nearest `lang` or `xml:lang` on the context or an ancestor,
/// matched case-insensitively with subtag prefixes (`en` matches `en-US`)
fn fn_lang<D: DocumentAccess>(
    args: Vec<XPathValue>,
    doc: &D,
    context: NodeId,
) -> Result<XPathValue, String> {
    let target = resolve_string(single_arg("lang", &args)?, doc).to_lowercase();

    let mut node = Some(context);
    while let Some(current) = node {
        let declared = doc
            .get_attribute(current, "lang")
            .or_else(|| doc.get_attribute(current, "xml:lang"));
        if let Some(lang) = declared {
            let lang = lang.to_lowercase();
            let matched = lang == target
                || (lang.starts_with(&target) && lang.as_bytes().get(target.len()) == Some(&b'-'));
            return Ok(XPathValue::Boolean(matched));
        }
        node = doc.parent_of(current);
    }
    Ok(XPathValue::Boolean(false))
}

// Number Functions

fn fn_sum<D: DocumentAccess>(args: Vec<XPathValue>, doc: &D) -> Result<XPathValue, String> {
    match args.as_slice() {
        [XPathValue::NodeSet(nodes)] => Ok(XPathValue::Number(
            nodes
                .iter()
                .map(|&node| parse_number(&dom::node_string_value(doc, node)))
                .sum(),
        )),
        [XPathValue::StringList(values)] => {
            Ok(XPathValue::Number(values.iter().map(|v| parse_number(v)).sum()))
        }
        [_] => Err("sum() argument must be a node-set".to_string()),
        _ => Err("sum() requires exactly 1 argument".to_string()),
    }
}

/// XPath round: halves go towards positive infinity
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// Convert an XPath value to a string, using document access for node
/// sets (string-value of the first node in document order)
pub(crate) fn resolve_string<D: DocumentAccess>(val: &XPathValue, doc: &D) -> String {
    match val {
        XPathValue::NodeSet(nodes) => nodes
            .first()
            .map(|&first| dom::node_string_value(doc, first))
            .unwrap_or_default(),
        _ => val.to_string_value(),
    }
}

/// Convert an XPath value to a number, using document access for node sets
pub(crate) fn resolve_number<D: DocumentAccess>(val: &XPathValue, doc: &D) -> f64 {
    match val {
        XPathValue::NodeSet(_) => parse_number(&resolve_string(val, doc)),
        _ => val.to_number(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::builder::build_strict;
    use crate::dom::Tree;
    use crate::xpath::evaluate;

    fn string(s: &str) -> XPathValue {
        XPathValue::String(s.to_string())
    }

    fn tree() -> Tree {
        build_strict("<r/>").unwrap()
    }

    #[test]
    fn test_concat() {
        let args = vec![string("hello"), string(" "), string("world")];
        let result = fn_concat(args, &tree()).unwrap();
        assert_eq!(result.to_string_value(), "hello world");
    }

    #[test]
    fn test_substring() {
        let doc = tree();
        let sub = |args: Vec<XPathValue>| fn_substring(args, &doc).unwrap().to_string_value();
        assert_eq!(sub(vec![string("hello"), 2.0.into(), 3.0.into()]), "ell");
        assert_eq!(sub(vec![string("12345"), 1.5.into(), 2.6.into()]), "234");
        assert_eq!(sub(vec![string("12345"), 0.0.into(), 3.0.into()]), "12");
        assert_eq!(sub(vec![string("x.pdf"), 2.0.into()]), ".pdf");
        assert_eq!(sub(vec![string("ab"), (-3.0).into()]), "ab");
    }

    #[test]
    fn test_string_functions() {
        let doc = tree();
        let eval = |q: &str| evaluate(&doc, q).unwrap();
        assert_eq!(eval("normalize-space('  hello   world  ')").to_string_value(), "hello world");
        assert_eq!(eval("substring-before('a-b-c', '-')").to_string_value(), "a");
        assert_eq!(eval("substring-after('a-b-c', '-')").to_string_value(), "b-c");
        assert_eq!(eval("translate('bar', 'abc', 'AB')").to_string_value(), "BAr");
        assert!(eval("starts-with('hello', 'he')").to_boolean());
        assert_eq!(eval("round(2.5)").to_number(), 3.0);
        assert_eq!(eval("round(-2.5)").to_number(), -2.0);
    }

    #[test]
    fn test_count_attribute_values() {
        let doc = build_strict("<r><a x=\"1\"/><a x=\"2\"/><a/></r>").unwrap();
        assert_eq!(evaluate(&doc, "count(//a/@x)").unwrap().to_number(), 2.0);
        assert_eq!(evaluate(&doc, "sum(//a/@x)").unwrap().to_number(), 3.0);
        assert_eq!(evaluate(&doc, "count(//a)").unwrap().to_number(), 3.0);
    }

    #[test]
    fn test_id() {
        let doc = build_strict("<r><a id=\"one\"/><b id=\"two\"/><c id=\"three\"/></r>").unwrap();
        let result = evaluate(&doc, "id('three one')").unwrap();
        let names: Vec<_> = result
            .as_nodeset()
            .unwrap()
            .iter()
            .filter_map(|&n| doc.node_name(n))
            .collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_lang_attributes() {
        let doc = build_strict("<r lang=\"en-US\"><p/><q xml:lang=\"fr\"/></r>").unwrap();
        assert!(evaluate(&doc, "count(//p[lang('en')])").unwrap().to_number() == 1.0);
        assert!(evaluate(&doc, "count(//q[lang('en')])").unwrap().to_number() == 0.0);
        assert!(evaluate(&doc, "count(//q[lang('FR')])").unwrap().to_number() == 1.0);
    }

    #[test]
    fn test_names() {
        let doc = build_strict("<svg:g/>").unwrap();
        assert_eq!(evaluate(&doc, "name(/*)").unwrap().to_string_value(), "svg:g");
        assert_eq!(evaluate(&doc, "local-name(/*)").unwrap().to_string_value(), "g");
        assert_eq!(evaluate(&doc, "namespace-uri(/*)").unwrap().to_string_value(), "");
    }

    #[test]
    fn test_arity_errors() {
        let doc = tree();
        assert!(evaluate(&doc, "not()").is_err());
        assert!(evaluate(&doc, "count('a')").is_err());
        assert!(evaluate(&doc, "position(1)").is_err());
    }
}
