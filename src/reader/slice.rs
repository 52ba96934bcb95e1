//! Zero-Copy Slice Reader
//!
//! Pull parser over a `&str` that only accepts well-formed markup. Names,
//! comments, CDATA and undecoded text borrow straight from the input.

use super::events::{StartElement, XmlEvent};
use crate::core::attributes::parse_attributes_strict;
use crate::core::entities::decode_text_strict;
use crate::core::scanner::Scanner;
use thiserror::Error;

/// Well-formedness error with the byte offset it was detected at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// Strict reader from a string slice
pub struct SliceReader<'a> {
    scanner: Scanner<'a>,
    failed: bool,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a str) -> Self {
        SliceReader {
            scanner: Scanner::new(input),
            failed: false,
        }
    }

    /// Get the next event, `Ok(None)` at end of input
    pub fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ParseError> {
        if self.scanner.is_eof() {
            return Ok(None);
        }

        if self.scanner.peek() != Some(b'<') {
            return self.read_text().map(Some);
        }

        let event = if self.scanner.starts_with("<!--") {
            self.read_comment()?
        } else if self.scanner.starts_with("<![CDATA[") {
            self.read_cdata()?
        } else if self.scanner.starts_with_ignore_case("<!DOCTYPE") {
            self.read_doctype()?
        } else if self.scanner.starts_with("<?") {
            self.read_processing_instruction()?
        } else if self.scanner.starts_with("</") {
            self.read_end_tag()?
        } else {
            self.read_start_tag()?
        };
        Ok(Some(event))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.scanner.position())
    }

    fn read_text(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());
        let raw = self.scanner.slice(start, end);
        let text = decode_text_strict(raw).map_err(|msg| ParseError::new(msg, start))?;
        self.scanner.advance(end - start);
        Ok(XmlEvent::Text(text))
    }

    fn read_comment(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(4);
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_str("-->")
            .ok_or_else(|| self.error("Unterminated comment"))?;
        let content = self.scanner.slice(start, end);
        self.scanner.advance(end - start + 3);
        Ok(XmlEvent::Comment(content))
    }

    fn read_cdata(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(9);
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_str("]]>")
            .ok_or_else(|| self.error("Unterminated CDATA section"))?;
        let content = self.scanner.slice(start, end);
        self.scanner.advance(end - start + 3);
        Ok(XmlEvent::CData(content))
    }

    fn read_doctype(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(9);
        if self.scanner.skip_whitespace() == 0 {
            return Err(self.error("Missing whitespace after DOCTYPE"));
        }
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("DOCTYPE without a name"))?;

        // Skip external id and internal subset up to the closing '>'
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        loop {
            let b = self
                .scanner
                .peek()
                .ok_or_else(|| self.error("Unterminated DOCTYPE"))?;
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => break,
                _ => {}
            }
        }
        Ok(XmlEvent::DocType(name))
    }

    fn read_processing_instruction(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(2);
        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Processing instruction without a target"))?;
        let end = self
            .scanner
            .find_str("?>")
            .ok_or_else(|| self.error("Unterminated processing instruction"))?;
        let start = self.scanner.position();
        let raw = self.scanner.slice(start, end);
        self.scanner.advance(end - start + 2);

        if target.eq_ignore_ascii_case("xml") {
            return Ok(XmlEvent::XmlDeclaration);
        }

        let data = if raw.is_empty() {
            None
        } else if raw.starts_with([' ', '\t', '\n', '\r']) {
            Some(raw.trim_start())
        } else {
            return Err(ParseError::new("Invalid processing instruction target", start));
        };
        Ok(XmlEvent::ProcessingInstruction { target, data })
    }

    fn read_end_tag(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(2);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid end tag name"))?;
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(self.error(format!("Malformed end tag </{}>", name)));
        }
        self.scanner.advance(1);
        Ok(XmlEvent::EndElement(name))
    }

    fn read_start_tag(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        self.scanner.advance(1);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid tag name"))?;

        let start = self.scanner.position();
        let end = self
            .find_tag_end_quoted()
            .ok_or_else(|| self.error(format!("Unterminated start tag <{}>", name)))?;
        let content = self.scanner.slice(start, end);
        self.scanner.advance(end - start + 1);

        let (content, empty) = match content.strip_suffix('/') {
            Some(inner) => (inner, true),
            None => (content, false),
        };
        let attributes =
            parse_attributes_strict(content).map_err(|msg| ParseError::new(msg, start))?;

        let elem = StartElement::new(name, attributes);
        Ok(if empty {
            XmlEvent::EmptyElement(elem)
        } else {
            XmlEvent::StartElement(elem)
        })
    }

    /// Position of the '>' closing the current tag, skipping quoted values
    fn find_tag_end_quoted(&self) -> Option<usize> {
        let base = self.scanner.position();
        let mut quote: Option<u8> = None;
        for (i, b) in self.scanner.remaining().bytes().enumerate() {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'>') => return Some(base + i),
                _ => {}
            }
        }
        None
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_event() {
            Ok(event) => event.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
