//! Entity Decoding and Escaping
//!
//! Strict decoding of the XML built-in entities and numeric character
//! references, plus the escaping used by the HTML serializer.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

/// Decode text content strictly.
///
/// Returns Borrowed if no entities present (zero-copy). Any reference
/// other than `&lt; &gt; &amp; &quot; &apos;` or a valid numeric reference
/// is an error, as is a bare `&`.
pub fn decode_text_strict(input: &str) -> Result<Cow<'_, str>, String> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = memchr(b';', after.as_bytes())
            .ok_or_else(|| "Unterminated entity reference".to_string())?;
        let entity = &after[..semi];
        let decoded = decode_entity(entity)
            .ok_or_else(|| format!("Undefined entity: &{};", entity))?;
        result.push(decoded);
        rest = &after[semi + 1..];
    }
    result.push_str(rest);

    Ok(Cow::Owned(result))
}

/// Decode a single entity body (without `&` and `;`)
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => decode_numeric_entity(entity.strip_prefix('#')?),
    }
}

/// Decode numeric character reference body (after `#`)
fn decode_numeric_entity(body: &str) -> Option<char> {
    let code = match body.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse::<u32>().ok()?,
    };
    if code == 0 {
        return None;
    }
    char::from_u32(code)
}

/// Append `input` to `buf` escaped for a text node: `& < >`
pub fn escape_text_to_buf(input: &str, buf: &mut String) {
    if memchr3(b'&', b'<', b'>', input.as_bytes()).is_none() {
        buf.push_str(input);
        return;
    }
    for c in input.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            _ => buf.push(c),
        }
    }
}

/// Append `input` to `buf` escaped for a double-quoted attribute value
pub fn escape_attribute_to_buf(input: &str, buf: &mut String) {
    let bytes = input.as_bytes();
    if memchr3(b'&', b'<', b'>', bytes).is_none() && memchr(b'"', bytes).is_none() {
        buf.push_str(input);
        return;
    }
    for c in input.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            _ => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text_strict("hello world").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_builtin_entities() {
        assert_eq!(decode_text_strict("&lt;&gt;&amp;&quot;&apos;").unwrap(), "<>&\"'");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_text_strict("&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(decode_text_strict("caf&#233;").unwrap(), "café");
    }

    #[test]
    fn test_undefined_entity_rejected() {
        assert!(decode_text_strict("a&nbsp;b").is_err());
        assert!(decode_text_strict("a & b").is_err());
        assert!(decode_text_strict("&#0;").is_err());
        assert!(decode_text_strict("&#xD800;").is_err());
    }

    #[test]
    fn test_escape_text() {
        let mut buf = String::new();
        escape_text_to_buf("<h1>\"a&b\"</h1>", &mut buf);
        assert_eq!(buf, "&lt;h1&gt;\"a&amp;b\"&lt;/h1&gt;");
    }

    #[test]
    fn test_escape_attribute() {
        let mut buf = String::new();
        escape_attribute_to_buf("say \"hi\" & go", &mut buf);
        assert_eq!(buf, "say &quot;hi&quot; &amp; go");
    }
}
