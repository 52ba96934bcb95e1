//! Attribute Parsing
//!
//! Parses the attribute list of a start tag in strict mode: every
//! attribute needs a quoted value, names are unique within a tag, and
//! attributes are separated by whitespace.

use super::entities::decode_text_strict;
use super::scanner::{is_whitespace, Scanner};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a str, value: Cow<'a, str>) -> Self {
        Attribute { name, value }
    }
}

/// Parse attributes from raw tag content (between the element name and
/// `>` or `/>`)
pub fn parse_attributes_strict(input: &str) -> Result<Vec<Attribute<'_>>, String> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut scanner = Scanner::new(input);

    loop {
        let skipped = scanner.skip_whitespace();
        if scanner.is_eof() {
            break;
        }
        if !attrs.is_empty() && skipped == 0 {
            return Err("Missing whitespace between attributes".to_string());
        }

        let name = scanner
            .read_name()
            .ok_or_else(|| format!("Invalid attribute name at offset {}", scanner.position()))?;

        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err(format!("Attribute {} has no value", name));
        }
        scanner.advance(1);
        scanner.skip_whitespace();

        let quote = match scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(format!("Unquoted value for attribute {}", name)),
        };
        scanner.advance(1);
        let start = scanner.position();
        let end = scanner
            .find_byte(quote)
            .ok_or_else(|| format!("Unterminated value for attribute {}", name))?;
        let raw = scanner.slice(start, end);
        scanner.advance(end - start + 1);

        if memchr(b'<', raw.as_bytes()).is_some() {
            return Err(format!("'<' in value of attribute {}", name));
        }
        if attrs.iter().any(|a| a.name == name) {
            return Err(format!("Duplicate attribute: {}", name));
        }

        attrs.push(Attribute::new(name, decode_text_strict(raw)?));
    }

    Ok(attrs)
}

/// Whether the raw tag content holds nothing but whitespace
pub fn is_blank(input: &str) -> bool {
    input.bytes().all(is_whitespace)
}
