//! Encoding Detection and Conversion
//!
//! Detects UTF-16 and UTF-8 byte order marks (or the UTF-16 null-byte
//! pattern around a leading `<`) and converts the input to a UTF-8 `String`.

/// Text encoding of raw markup bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return TextEncoding::Utf8;
        }

        match (input[0], input[1]) {
            // UTF-16 LE BOM: 0xFF 0xFE
            (0xFF, 0xFE) => TextEncoding::Utf16Le,
            // UTF-16 BE BOM: 0xFE 0xFF
            (0xFE, 0xFF) => TextEncoding::Utf16Be,
            // No BOM - `<` next to a null byte
            (0x00, b'<') => TextEncoding::Utf16Be,
            (b'<', 0x00) => TextEncoding::Utf16Le,
            _ => TextEncoding::Utf8,
        }
    }
}

/// Decode raw bytes into a UTF-8 string.
///
/// Strips a UTF-8 BOM. Fails when the bytes are not valid text in the
/// detected encoding.
pub fn decode_to_string(input: &[u8]) -> Result<String, String> {
    match TextEncoding::detect(input) {
        TextEncoding::Utf8 => {
            let bytes = input.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(input);
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| format!("Invalid UTF-8: {}", e))
        }
        TextEncoding::Utf16Le => decode_utf16(input, &[0xFF, 0xFE], u16::from_le_bytes, "LE"),
        TextEncoding::Utf16Be => decode_utf16(input, &[0xFE, 0xFF], u16::from_be_bytes, "BE"),
    }
}

fn decode_utf16(
    input: &[u8],
    bom: &[u8],
    unit: fn([u8; 2]) -> u16,
    label: &str,
) -> Result<String, String> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);

    if bytes.len() % 2 != 0 {
        return Err(format!("Invalid UTF-16 {}: odd number of bytes", label));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| format!("Invalid UTF-16 {}: {}", label, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8() {
        assert_eq!(TextEncoding::detect(b"<p/>"), TextEncoding::Utf8);
        assert_eq!(TextEncoding::detect(b"\xEF\xBB\xBF<p/>"), TextEncoding::Utf8);
    }

    #[test]
    fn test_detect_utf16() {
        assert_eq!(TextEncoding::detect(&[0xFF, 0xFE, b'<', 0]), TextEncoding::Utf16Le);
        assert_eq!(TextEncoding::detect(&[0xFE, 0xFF, 0, b'<']), TextEncoding::Utf16Be);
        assert_eq!(TextEncoding::detect(&[b'<', 0, b'p', 0]), TextEncoding::Utf16Le);
    }

    #[test]
    fn test_strip_utf8_bom() {
        assert_eq!(decode_to_string(b"\xEF\xBB\xBF<p>x</p>").unwrap(), "<p>x</p>");
    }

    #[test]
    fn test_utf16_le_roundtrip() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<p>é</p>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_string(&bytes).unwrap(), "<p>é</p>");
    }

    #[test]
    fn test_utf16_be_roundtrip() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "<b/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_to_string(&bytes).unwrap(), "<b/>");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(decode_to_string(&[b'<', b'p', 0xC3, 0x28]).is_err());
    }

    #[test]
    fn test_odd_utf16() {
        assert!(decode_to_string(&[0xFF, 0xFE, b'<']).is_err());
    }
}
